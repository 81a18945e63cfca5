//! # Receipt Coins
//!
//! A receipt coin is the accounting shadow of a vault: every deposit
//! mints receipt units to the depositor, proportional to the deposit, so
//! positions can be displayed and transferred off-ledger without touching
//! the escrowed funds. Each insurance product owns two — one for the
//! investor side, one for the insuree side.
//!
//! ## Security Model
//!
//! - **Single minter.** Exactly one address may mint at any time. The
//!   coin starts with its creating factory as minter and the capability
//!   is transferred once, to the owning vault, during product wiring.
//!   There is no second transfer — the grant is one-shot.
//! - **Supply tracking.** Total supply and per-address balances are
//!   updated together, with checked arithmetic on every operation.
//! - No burn. Receipts are a historical record of deposits.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::address::{Address, AddressKind};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during receipt-coin operations.
#[derive(Debug, Error)]
pub enum CoinError {
    /// The caller does not hold the minter capability.
    #[error("unauthorized: {caller} is not the minter of coin {coin}")]
    Unauthorized {
        /// The coin being operated on.
        coin: Address,
        /// The address that attempted the privileged call.
        caller: Address,
    },

    /// The one-shot minter grant has already been used.
    #[error("minter of coin {coin} was already transferred to {minter}")]
    MinterAlreadyTransferred {
        /// The coin being operated on.
        coin: Address,
        /// The current (final) minter.
        minter: Address,
    },

    /// A supply overflow would occur.
    #[error("supply overflow: minting {amount} on coin {coin} would exceed u64::MAX")]
    SupplyOverflow {
        /// The coin being operated on.
        coin: Address,
        /// The amount that was attempted.
        amount: u64,
    },
}

// ---------------------------------------------------------------------------
// ReceiptCoin
// ---------------------------------------------------------------------------

/// A mintable fungible balance ledger with a single privileged minter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReceiptCoin {
    /// Content-derived address of this coin.
    address: Address,
    /// Human-readable display name (e.g., "Cov Investor 05/2020 10%").
    name: String,
    /// Display decimals. The ledger itself never divides.
    decimals: u8,
    /// The address currently allowed to mint.
    minter: Address,
    /// Whether the one-shot minter grant has been consumed.
    minter_transferred: bool,
    /// Current total supply in receipt units.
    total_supply: u64,
    /// Per-address balances.
    balances: HashMap<Address, u64>,
    /// When the coin was created.
    created_at: DateTime<Utc>,
}

impl ReceiptCoin {
    /// Creates a new coin with zero supply; `creator` starts as minter.
    ///
    /// Prefer going through [`crate::token_factory::TokenFactory`], which
    /// also records the creation event.
    pub fn new(kind: AddressKind, name: &str, decimals: u8, creator: Address) -> Self {
        let nonce = Uuid::new_v4();
        Self {
            address: Address::derive(kind, name, &creator, &nonce),
            name: name.to_string(),
            decimals,
            minter: creator,
            minter_transferred: false,
            total_supply: 0,
            balances: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// The coin's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The coin's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display decimals.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// The address currently holding the minter capability.
    pub fn minter(&self) -> Address {
        self.minter
    }

    /// Current total supply.
    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    /// Balance of `holder`, or 0 for addresses never minted to.
    pub fn balance_of(&self, holder: &Address) -> u64 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// Number of distinct addresses holding a balance entry.
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Whether minting `amount` would stay within the u64 supply range.
    ///
    /// Used by callers that must know a mint cannot fail before they
    /// commit bookkeeping of their own.
    pub fn can_mint(&self, amount: u64) -> bool {
        self.total_supply.checked_add(amount).is_some()
    }

    /// Mints `amount` receipt units to `to`.
    ///
    /// Returns the new total supply.
    ///
    /// # Errors
    ///
    /// Returns [`CoinError::Unauthorized`] if `caller` is not the current
    /// minter, and [`CoinError::SupplyOverflow`] if the mint would exceed
    /// the u64 supply range. Both are checked before any mutation.
    pub fn mint(&mut self, caller: Address, to: Address, amount: u64) -> Result<u64, CoinError> {
        if caller != self.minter {
            return Err(CoinError::Unauthorized {
                coin: self.address,
                caller,
            });
        }

        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(CoinError::SupplyOverflow {
                coin: self.address,
                amount,
            })?;

        self.total_supply = new_supply;
        // Any single balance is bounded by the checked total supply.
        *self.balances.entry(to).or_insert(0) += amount;

        Ok(new_supply)
    }

    /// Transfers the minter capability to `new_minter`. One-shot: once
    /// the grant has moved off the creator it cannot move again.
    ///
    /// # Errors
    ///
    /// Returns [`CoinError::Unauthorized`] if `caller` is not the current
    /// minter, [`CoinError::MinterAlreadyTransferred`] if the grant was
    /// already consumed.
    pub fn transfer_minter(
        &mut self,
        caller: Address,
        new_minter: Address,
    ) -> Result<(), CoinError> {
        if caller != self.minter {
            return Err(CoinError::Unauthorized {
                coin: self.address,
                caller,
            });
        }
        if self.minter_transferred {
            return Err(CoinError::MinterAlreadyTransferred {
                coin: self.address,
                minter: self.minter,
            });
        }

        self.minter = new_minter;
        self.minter_transferred = true;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
