//! # ParaPool Escrow — Core Library
//!
//! The escrow engine behind ParaPool's parametric insurance products.
//! Investors park backing capital in a [`MoneyVault`], insurees pay
//! premiums to be covered by it, and when the insured event is resolved
//! the pooled funds flow to exactly one side. One insurance product is a
//! vault plus two [`ReceiptCoin`]s (one per side) that receive minted
//! accounting receipts for every deposit.
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the product's moving parts:
//!
//! - **clock** — Injected time source. Deposits and activation are gated
//!   by fixed windows; the clock is sampled once per call.
//! - **address** — Content-derived 20-byte identifiers for vaults and coins.
//! - **coin** — The receipt coin: a mintable balance ledger with a single,
//!   transferable minter capability.
//! - **coverage** — Capacity-factor arithmetic. Integer percentage points,
//!   no floating point anywhere near money.
//! - **vault** — The escrow state machine. Deposit windows, capacity
//!   checks, outcome resolution, settlement.
//! - **events** — Creation records published for off-chain indexing.
//! - **token_factory / vault_factory / insurance_factory** — Constructors
//!   for coins, vaults, and fully wired products.
//!
//! ## Design Principles
//!
//! 1. All monetary operations check for overflow — `checked_add` and
//!    `checked_mul` everywhere, because wrapping arithmetic and money do
//!    not mix.
//! 2. State transitions are explicit enum variants, never boolean flags,
//!    and only ever move forward.
//! 3. Every guard runs before any mutation. A failed call leaves the
//!    vault exactly as it found it.
//! 4. Every public type is serializable (serde) for wire transport and
//!    snapshotting.

pub mod address;
pub mod clock;
pub mod coin;
pub mod config;
pub mod coverage;
pub mod events;
pub mod insurance_factory;
pub mod token_factory;
pub mod vault;
pub mod vault_factory;

pub use address::Address;
pub use clock::{Clock, ManualClock, SystemClock};
pub use coin::{CoinError, ReceiptCoin};
pub use coverage::{CapacityFactor, CoverageError};
pub use events::{CreationEvent, EventLog, RecordedEvent};
pub use insurance_factory::{InsuranceFactory, InsuranceProduct, ProductError};
pub use token_factory::TokenFactory;
pub use vault::{MoneyVault, Payout, Period, VaultError, VaultParams, VaultState};
pub use vault_factory::{FactoryError, VaultFactory};
