//! # Insurance Factory & Product
//!
//! The single public entry point that produces a complete insurance
//! product: two receipt coins and one money vault, wired together with
//! the mint capability granted to the vault. The orchestration is one
//! atomic unit — every validation runs before the first coin exists, so
//! a failure leaves no coins, no grants, and no published records.
//!
//! The returned [`InsuranceProduct`] owns the three pieces. Its deposit
//! wrappers run the vault operation first (all guards, all bookkeeping)
//! and mint receipts only afterwards, using the vault's address as the
//! authorized caller — a re-entrant observer can only ever see the vault
//! fully before or fully after a deposit, never in between.

use thiserror::Error;

use crate::address::Address;
use crate::clock::Clock;
use crate::coin::{CoinError, ReceiptCoin};
use crate::coverage::CapacityFactor;
use crate::events::{CreationEvent, EventLog, RecordedEvent};
use crate::token_factory::TokenFactory;
use crate::vault::{MoneyVault, Payout, Period, VaultError, VaultParams};
use crate::vault_factory::{validate_period, FactoryError, VaultFactory};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by product-level operations.
#[derive(Debug, Error)]
pub enum ProductError {
    /// The vault rejected the operation.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// Receipt minting was rejected.
    #[error(transparent)]
    Coin(#[from] CoinError),
}

// ---------------------------------------------------------------------------
// InsuranceProduct
// ---------------------------------------------------------------------------

/// One fully wired insurance product: the escrow vault plus its two
/// receipt coins, with the vault holding the mint capability on both.
#[derive(Clone, Debug)]
pub struct InsuranceProduct {
    vault: MoneyVault,
    investor_coin: ReceiptCoin,
    insuree_coin: ReceiptCoin,
}

impl InsuranceProduct {
    /// The escrow vault.
    pub fn vault(&self) -> &MoneyVault {
        &self.vault
    }

    /// The investor-side receipt coin.
    pub fn investor_coin(&self) -> &ReceiptCoin {
        &self.investor_coin
    }

    /// The insuree-side receipt coin.
    pub fn insuree_coin(&self) -> &ReceiptCoin {
        &self.insuree_coin
    }

    /// Deposits backing capital and mints investor receipts.
    ///
    /// The vault's bookkeeping is finalized before the mint; the receipt
    /// amount is pre-checked so the mint itself cannot fail after the
    /// deposit has been applied.
    ///
    /// # Errors
    ///
    /// Any [`VaultError`] from
    /// [`MoneyVault::investor_deposit`], or
    /// [`VaultError::AmountOverflow`] / [`CoinError::SupplyOverflow`] if
    /// the scaled receipt amount cannot be represented or minted.
    pub fn invest(
        &mut self,
        clock: &dyn Clock,
        payer: Address,
        amount: u64,
    ) -> Result<(), ProductError> {
        let receipt = self.receipt_amount(&self.investor_coin, amount)?;
        self.vault.investor_deposit(clock, payer, amount)?;
        self.investor_coin.mint(self.vault.address(), payer, receipt)?;
        Ok(())
    }

    /// Pays a premium at the vault's configured capacity factor and
    /// mints insuree receipts. Same ordering guarantees as
    /// [`invest`](Self::invest).
    ///
    /// # Errors
    ///
    /// Any [`VaultError`] from [`MoneyVault::insuree_deposit`], plus the
    /// receipt-overflow cases described on [`invest`](Self::invest).
    pub fn insure(
        &mut self,
        clock: &dyn Clock,
        payer: Address,
        amount: u64,
    ) -> Result<(), ProductError> {
        let factor = self.vault.capacity_factor();
        self.insure_with_factor(clock, payer, amount, factor)
    }

    /// Pays a premium at an explicit capacity factor.
    pub fn insure_with_factor(
        &mut self,
        clock: &dyn Clock,
        payer: Address,
        amount: u64,
        factor: CapacityFactor,
    ) -> Result<(), ProductError> {
        let receipt = self.receipt_amount(&self.insuree_coin, amount)?;
        self.vault.insuree_deposit(clock, payer, amount, factor)?;
        self.insuree_coin.mint(self.vault.address(), payer, receipt)?;
        Ok(())
    }

    /// Starts coverage. See [`MoneyVault::set_active`].
    pub fn activate(&mut self, clock: &dyn Clock) -> Result<(), ProductError> {
        Ok(self.vault.set_active(clock)?)
    }

    /// Winds down a premium-less product. See
    /// [`MoneyVault::set_no_insuree_found`].
    pub fn set_no_insuree_found(&mut self, clock: &dyn Clock) -> Result<(), ProductError> {
        Ok(self.vault.set_no_insuree_found(clock)?)
    }

    /// Fixes the outcome. See [`MoneyVault::close_case`].
    pub fn close_case(&mut self, outcome_happened: bool) -> Result<(), ProductError> {
        Ok(self.vault.close_case(outcome_happened)?)
    }

    /// Settles an investor claim. See [`MoneyVault::claim_as_investor`].
    pub fn claim_as_investor(&mut self, payee: Address) -> Result<Payout, ProductError> {
        Ok(self.vault.claim_as_investor(payee)?)
    }

    /// Settles an insuree claim. See [`MoneyVault::claim_as_insuree`].
    pub fn claim_as_insuree(&mut self, payee: Address) -> Result<Payout, ProductError> {
        Ok(self.vault.claim_as_insuree(payee)?)
    }

    /// Pre-computes the receipt amount for a deposit and proves the mint
    /// can succeed, so it can run after the vault has committed.
    fn receipt_amount(&self, coin: &ReceiptCoin, amount: u64) -> Result<u64, ProductError> {
        let receipt = amount
            .checked_mul(self.vault.receipt_multiplier())
            .ok_or(VaultError::AmountOverflow)?;
        if !coin.can_mint(receipt) {
            return Err(CoinError::SupplyOverflow {
                coin: coin.address(),
                amount: receipt,
            }
            .into());
        }
        Ok(receipt)
    }
}

// ---------------------------------------------------------------------------
// InsuranceFactory
// ---------------------------------------------------------------------------

/// Orchestrates the token and vault factories into complete products and
/// publishes the full creation-record stream (coins, vault, and the two
/// insurance records per product, in creation order).
#[derive(Clone, Debug, Default)]
pub struct InsuranceFactory {
    token_factory: TokenFactory,
    vault_factory: VaultFactory,
    events: EventLog,
}

impl InsuranceFactory {
    /// Creates a new insurance factory.
    pub fn new() -> Self {
        Self {
            token_factory: TokenFactory::new(),
            vault_factory: VaultFactory::new(),
            events: EventLog::new(),
        }
    }

    /// Creates one complete insurance product.
    ///
    /// Coins are named `name_investor` / `name_insuree`; the vault gets
    /// the two windows, the capacity factor (`rate_percent`, percentage
    /// points, e.g. 100 = one-to-one backing), and the mint capability
    /// on both coins. Records `InsuranceCreated` and
    /// `InsuranceCreatedDetails` (plus the three underlying creation
    /// records) only after the whole orchestration has succeeded.
    ///
    /// # Errors
    ///
    /// [`FactoryError::InvalidPeriod`] /
    /// [`FactoryError::InvalidCapacityFactor`] — both checked before any
    /// coin is created, so a failed call publishes nothing and grants
    /// nothing.
    pub fn create_insurance_for(
        &mut self,
        caller: Address,
        name_investor: &str,
        name_insuree: &str,
        insurance_period: Period,
        signature_period: Period,
        rate_percent: u64,
    ) -> Result<InsuranceProduct, FactoryError> {
        // Validate everything up front: after this point no step can fail.
        let factor = CapacityFactor::from_percent(rate_percent)?;
        validate_period("insurance", insurance_period)?;
        validate_period("signature", signature_period)?;

        let (mut investor_coin, mut insuree_coin) =
            self.token_factory
                .create_coins(caller, name_investor, name_insuree);

        let params = VaultParams::new(insurance_period, signature_period)
            .with_coins(investor_coin.address(), insuree_coin.address())
            .with_capacity_factor(factor);
        let vault = self.vault_factory.create_vault(caller, params)?;

        // One-shot grant: the vault becomes the only minter of both coins.
        investor_coin.transfer_minter(caller, vault.address())?;
        insuree_coin.transfer_minter(caller, vault.address())?;

        // Publish the product's full record set in creation order.
        self.events.record(CreationEvent::InvestorCoinCreated {
            sender: caller,
            address: investor_coin.address(),
        });
        self.events.record(CreationEvent::InsureeCoinCreated {
            sender: caller,
            address: insuree_coin.address(),
        });
        self.events.record(CreationEvent::MoneyVaultCreated {
            sender: caller,
            address: vault.address(),
        });
        self.events.record(CreationEvent::InsuranceCreated {
            sender: caller,
            investor_coin: investor_coin.address(),
            insuree_coin: insuree_coin.address(),
            money_vault: vault.address(),
        });
        self.events.record(CreationEvent::InsuranceCreatedDetails {
            sender: caller,
            token_name_investor: name_investor.to_string(),
            token_name_insuree: name_insuree.to_string(),
            insurance_period_start: insurance_period.start,
            insurance_period_end: insurance_period.end,
            signature_period_start: signature_period.start,
            signature_period_end: signature_period.end,
            money_vault: vault.address(),
            investor_coin: investor_coin.address(),
            insuree_coin: insuree_coin.address(),
        });

        tracing::info!(
            sender = %caller,
            vault = %vault.address(),
            investor_coin = %investor_coin.address(),
            insuree_coin = %insuree_coin.address(),
            rate_percent,
            "insurance product created"
        );

        Ok(InsuranceProduct {
            vault,
            investor_coin,
            insuree_coin,
        })
    }

    /// The published creation-record stream, oldest first.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Records from sequence number `seq` onwards — the poll entry point
    /// for indexers that remember where they stopped.
    pub fn events_since(&self, seq: u64) -> &[RecordedEvent] {
        self.events.since(seq)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
