//! # Vault Factory
//!
//! Constructs money vaults. Validates the time windows, builds the vault
//! in `Initial`, and records the creation. Like the token factory it is
//! a pure constructor — each call yields an independent vault and the
//! only retained state is the event history.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::address::Address;
use crate::coin::CoinError;
use crate::coverage::CoverageError;
use crate::events::{CreationEvent, EventLog};
use crate::vault::{MoneyVault, Period, VaultParams};

/// Errors that can occur while constructing vaults and products.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// A window was given back-to-front.
    #[error("invalid {which} period: start {start} is after end {end}")]
    InvalidPeriod {
        /// Which window ("insurance" or "signature").
        which: &'static str,
        /// The offending start.
        start: DateTime<Utc>,
        /// The offending end.
        end: DateTime<Utc>,
    },

    /// The capacity factor was unusable (zero).
    #[error("invalid capacity factor: {0}")]
    InvalidCapacityFactor(#[from] CoverageError),

    /// Coin wiring failed during product orchestration.
    #[error(transparent)]
    Coin(#[from] CoinError),
}

/// Window validation shared by the vault factory and the insurance
/// factory (which must validate *before* it creates any coin).
pub(crate) fn validate_period(which: &'static str, period: Period) -> Result<(), FactoryError> {
    if !period.is_well_formed() {
        return Err(FactoryError::InvalidPeriod {
            which,
            start: period.start,
            end: period.end,
        });
    }
    Ok(())
}

/// Constructor for money vaults.
#[derive(Clone, Debug, Default)]
pub struct VaultFactory {
    events: EventLog,
}

impl VaultFactory {
    /// Creates a new vault factory with an empty event history.
    pub fn new() -> Self {
        Self {
            events: EventLog::new(),
        }
    }

    /// Validates `params` and constructs a vault in `Initial`.
    ///
    /// Records `MoneyVaultCreated{sender, address}`.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError::InvalidPeriod`] if either window has
    /// `start > end`. Nothing is constructed or recorded on failure.
    pub fn create_vault(
        &mut self,
        caller: Address,
        params: VaultParams,
    ) -> Result<MoneyVault, FactoryError> {
        validate_period("insurance", params.insurance_period)?;
        validate_period("signature", params.signature_period)?;

        let vault = MoneyVault::new(caller, params);
        self.events.record(CreationEvent::MoneyVaultCreated {
            sender: caller,
            address: vault.address(),
        });
        tracing::info!(sender = %caller, vault = %vault.address(), "money vault created");
        Ok(vault)
    }

    /// This factory's creation history.
    pub fn events(&self) -> &EventLog {
        &self.events
    }
}
