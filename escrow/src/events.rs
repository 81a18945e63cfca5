//! # Creation Records
//!
//! Factories publish a record for everything they create. Off-ledger
//! consumers (dashboards, indexers) poll the log from the last sequence
//! number they have seen — the same filter-from-a-known-starting-point
//! pattern chain frontends use for past events.
//!
//! Only creation is recorded here. Deposits and settlements are ledger
//! state, queryable directly from the vault; duplicating them as events
//! would invite divergence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::Address;

/// A creation record published by one of the factories.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CreationEvent {
    /// An investor-side receipt coin was created.
    #[serde(rename = "investor_coin_created")]
    InvestorCoinCreated {
        /// Who asked the factory for the coin.
        sender: Address,
        /// The new coin.
        address: Address,
    },

    /// An insuree-side receipt coin was created.
    #[serde(rename = "insuree_coin_created")]
    InsureeCoinCreated {
        /// Who asked the factory for the coin.
        sender: Address,
        /// The new coin.
        address: Address,
    },

    /// A money vault was created.
    #[serde(rename = "money_vault_created")]
    MoneyVaultCreated {
        /// Who asked the factory for the vault.
        sender: Address,
        /// The new vault.
        address: Address,
    },

    /// A fully wired insurance product was created. Terse form — just
    /// the addresses, for consumers that resolve details on demand.
    #[serde(rename = "insurance_created")]
    InsuranceCreated {
        /// Who created the product.
        sender: Address,
        /// The investor-side receipt coin.
        investor_coin: Address,
        /// The insuree-side receipt coin.
        insuree_coin: Address,
        /// The escrow vault.
        money_vault: Address,
    },

    /// The detailed companion to [`CreationEvent::InsuranceCreated`]:
    /// every construction parameter, for indexers that never touch the
    /// ledger.
    #[serde(rename = "insurance_created_details")]
    InsuranceCreatedDetails {
        /// Who created the product.
        sender: Address,
        /// Display name of the investor coin.
        token_name_investor: String,
        /// Display name of the insuree coin.
        token_name_insuree: String,
        /// Coverage window start.
        insurance_period_start: DateTime<Utc>,
        /// Coverage window end.
        insurance_period_end: DateTime<Utc>,
        /// Deposit window start.
        signature_period_start: DateTime<Utc>,
        /// Deposit window end.
        signature_period_end: DateTime<Utc>,
        /// The escrow vault.
        money_vault: Address,
        /// The investor-side receipt coin.
        investor_coin: Address,
        /// The insuree-side receipt coin.
        insuree_coin: Address,
    },
}

/// A [`CreationEvent`] with its position in the log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Zero-based position in the log. Dense and strictly increasing.
    pub seq: u64,
    /// When the record was appended.
    pub recorded_at: DateTime<Utc>,
    /// The record itself.
    pub event: CreationEvent,
}

/// Append-only log of creation records.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<RecordedEvent>,
}

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Appends a record and returns its sequence number.
    pub(crate) fn record(&mut self, event: CreationEvent) -> u64 {
        let seq = self.events.len() as u64;
        self.events.push(RecordedEvent {
            seq,
            recorded_at: Utc::now(),
            event,
        });
        seq
    }

    /// Number of records in the log.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All records, oldest first.
    pub fn all(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Records from sequence number `seq` onwards. A `seq` past the end
    /// yields an empty slice, so pollers can always ask for "what's new".
    pub fn since(&self, seq: u64) -> &[RecordedEvent] {
        let start = usize::try_from(seq).unwrap_or(usize::MAX).min(self.events.len());
        &self.events[start..]
    }

    /// The most recent record, if any.
    pub fn latest(&self) -> Option<&RecordedEvent> {
        self.events.last()
    }
}
