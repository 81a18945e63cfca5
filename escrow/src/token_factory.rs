//! # Token Factory
//!
//! Creates receipt coins. Every call produces fresh, independent coins —
//! the factory is a constructor with an event history, not a registry.
//! Ownership (the minter capability) starts with the caller and is
//! transferred to the owning vault during product wiring.

use crate::address::{Address, AddressKind};
use crate::coin::ReceiptCoin;
use crate::config::RECEIPT_COIN_DECIMALS;
use crate::events::{CreationEvent, EventLog};

/// Constructor for receipt coins.
#[derive(Clone, Debug, Default)]
pub struct TokenFactory {
    events: EventLog,
}

impl TokenFactory {
    /// Creates a new token factory with an empty event history.
    pub fn new() -> Self {
        Self {
            events: EventLog::new(),
        }
    }

    /// Creates an investor-side receipt coin named `name`.
    ///
    /// The caller starts as minter. Records `InvestorCoinCreated`.
    pub fn create_investor_coin(&mut self, caller: Address, name: &str) -> ReceiptCoin {
        let coin = ReceiptCoin::new(AddressKind::InvestorCoin, name, RECEIPT_COIN_DECIMALS, caller);
        self.events.record(CreationEvent::InvestorCoinCreated {
            sender: caller,
            address: coin.address(),
        });
        tracing::debug!(sender = %caller, coin = %coin.address(), name, "investor coin created");
        coin
    }

    /// Creates an insuree-side receipt coin named `name`.
    ///
    /// The caller starts as minter. Records `InsureeCoinCreated`.
    pub fn create_insuree_coin(&mut self, caller: Address, name: &str) -> ReceiptCoin {
        let coin = ReceiptCoin::new(AddressKind::InsureeCoin, name, RECEIPT_COIN_DECIMALS, caller);
        self.events.record(CreationEvent::InsureeCoinCreated {
            sender: caller,
            address: coin.address(),
        });
        tracing::debug!(sender = %caller, coin = %coin.address(), name, "insuree coin created");
        coin
    }

    /// Creates the matched coin pair for one product: investor coin
    /// first, insuree coin second.
    pub fn create_coins(
        &mut self,
        caller: Address,
        name_investor: &str,
        name_insuree: &str,
    ) -> (ReceiptCoin, ReceiptCoin) {
        let investor = self.create_investor_coin(caller, name_investor);
        let insuree = self.create_insuree_coin(caller, name_insuree);
        (investor, insuree)
    }

    /// This factory's creation history.
    pub fn events(&self) -> &EventLog {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    #[test]
    fn create_investor_coin_records_event_with_sender() {
        let mut factory = TokenFactory::new();
        let coin = factory.create_investor_coin(addr(7), "Cov Investor 05/2020 10%");

        assert_eq!(coin.name(), "Cov Investor 05/2020 10%");
        assert_eq!(coin.minter(), addr(7));
        assert_eq!(coin.total_supply(), 0);

        let recorded = factory.events().latest().unwrap();
        assert_eq!(
            recorded.event,
            CreationEvent::InvestorCoinCreated {
                sender: addr(7),
                address: coin.address(),
            }
        );
    }

    #[test]
    fn create_insuree_coin_records_event_with_sender() {
        let mut factory = TokenFactory::new();
        let coin = factory.create_insuree_coin(addr(7), "Cov Insuree 05/2020 10%");

        let recorded = factory.events().latest().unwrap();
        assert_eq!(
            recorded.event,
            CreationEvent::InsureeCoinCreated {
                sender: addr(7),
                address: coin.address(),
            }
        );
    }

    #[test]
    fn create_coins_produces_independent_pair() {
        let mut factory = TokenFactory::new();
        let (investor, insuree) = factory.create_coins(addr(1), "Investor", "Insuree");

        assert_ne!(investor.address(), insuree.address());
        assert_eq!(factory.events().len(), 2);
    }

    #[test]
    fn successive_calls_share_no_state() {
        let mut factory = TokenFactory::new();
        let (a1, b1) = factory.create_coins(addr(1), "Investor", "Insuree");
        let (a2, b2) = factory.create_coins(addr(1), "Investor", "Insuree");

        // Same names, same caller — still four distinct coins.
        let addrs = [a1.address(), b1.address(), a2.address(), b2.address()];
        for i in 0..addrs.len() {
            for j in (i + 1)..addrs.len() {
                assert_ne!(addrs[i], addrs[j]);
            }
        }
    }
}
