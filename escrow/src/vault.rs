//! # Money Vault — the Escrow State Machine
//!
//! A [`MoneyVault`] holds one insurance product's pooled funds and
//! decides, exactly once, which side gets them. Investors deposit backing
//! capital during the signature window; insurees pay premiums against
//! that capital, bounded by the capacity factor; after the coverage
//! period begins the vault is activated, and closing the case with the
//! external outcome flag routes every later withdrawal to exactly one
//! side.
//!
//! ## State Machine
//!
//! ```text
//!                 investor_deposit            insuree_deposit
//!   ┌─────────┐  ──────────────────► ┌───────────────┐ ─────────► ┌──────────────┐
//!   │ Initial │                      │ InvestorFound │            │ InsureeFound │
//!   └────┬────┘                      └───────┬───────┘            └──────┬───────┘
//!        │                                   │                          │ set_active
//!        │ set_no_insuree_found              │ set_no_insuree_found     ▼
//!        │ (signature window over,           ▼                     ┌────────┐
//!        │  zero premiums)           ┌────────────────┐            │ Active │
//!        └──────────────────────────►│ NoInsureeFound │            └───┬────┘
//!                                    └────────────────┘                │ close_case(bool)
//!                                                     ┌────────────────┴───────────────┐
//!                                                     ▼                                ▼
//!                                          ┌───────────────────┐          ┌──────────────────────┐
//!                                          │ ClosedCaseHappened │          │ ClosedNoCaseHappened │
//!                                          └───────────────────┘          └──────────────────────┘
//! ```
//!
//! `NoInsureeFound`, `ClosedCaseHappened`, and `ClosedNoCaseHappened` are
//! terminal: the vault stays queryable but admits no further transition.
//! Settlement is possible only in a terminal state, and only for the
//! winning side.
//!
//! Every guard is checked before any field is written, so a failed call
//! leaves the vault byte-for-byte unchanged. Time is sampled once per
//! call from an injected [`Clock`].

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::address::{Address, AddressKind};
use crate::clock::Clock;
use crate::config::DEFAULT_RECEIPT_MULTIPLIER;
use crate::coverage::{CapacityFactor, CoverageError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The sampled timestamp is before the operation's window.
    #[error("too early: now {now}, allowed from {earliest}")]
    TooEarly {
        /// The timestamp sampled for this call.
        now: DateTime<Utc>,
        /// Earliest instant at which the call would be accepted.
        earliest: DateTime<Utc>,
    },

    /// The sampled timestamp is after the operation's window.
    #[error("too late: now {now}, allowed until {latest}")]
    TooLate {
        /// The timestamp sampled for this call.
        now: DateTime<Utc>,
        /// Latest instant at which the call would have been accepted.
        latest: DateTime<Utc>,
    },

    /// The operation was invoked outside its valid state set.
    #[error("wrong state: vault is {current}, expected {expected}")]
    WrongState {
        /// The vault's current state.
        current: VaultState,
        /// The states required for this operation.
        expected: &'static str,
    },

    /// An insuree deposit would breach the backing-ratio invariant.
    #[error("capacity exceeded: backing capital available {available}, required {required}")]
    CapacityExceeded {
        /// Investor capital not yet reserved by existing coverage.
        available: u64,
        /// Backing the rejected deposit would have reserved.
        required: u64,
    },

    /// Investor claim attempted outside {ClosedNoCaseHappened, NoInsureeFound}.
    #[error("investor benefits are not active (state: {current})")]
    NotActiveInvestorBenefits {
        /// The vault's current state.
        current: VaultState,
    },

    /// Insuree claim attempted outside ClosedCaseHappened.
    #[error("insuree benefits are not active (state: {current})")]
    NotActiveInsureeBenefits {
        /// The vault's current state.
        current: VaultState,
    },

    /// The payee already settled their claim on this vault.
    #[error("payout already claimed by {payee}")]
    AlreadyClaimed {
        /// The repeat claimant.
        payee: Address,
    },

    /// The payee has no deposits recorded on the claimed side.
    #[error("no deposits recorded for {payee}")]
    NothingToClaim {
        /// The empty-handed claimant.
        payee: Address,
    },

    /// Zero-amount deposits are rejected — they would move the state
    /// machine without moving any money.
    #[error("deposit amount must be positive")]
    ZeroDeposit,

    /// Deposit totals would leave the u64 range.
    #[error("amount overflow: deposit totals would exceed u64 range")]
    AmountOverflow,

    /// Capacity-factor arithmetic failed.
    #[error(transparent)]
    Coverage(#[from] CoverageError),
}

// ---------------------------------------------------------------------------
// VaultState
// ---------------------------------------------------------------------------

/// Lifecycle state of a money vault. Exactly one holds at a time, and
/// transitions only move forward through the module-level graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VaultState {
    /// Freshly created; no deposits yet.
    Initial,
    /// At least one investor deposit is recorded.
    InvestorFound,
    /// At least one insuree premium is recorded.
    InsureeFound,
    /// Coverage is running; awaiting the outcome.
    Active,
    /// Terminal: the insured event happened. Insurees collect.
    ClosedCaseHappened,
    /// Terminal: the insured event did not happen. Investors collect.
    ClosedNoCaseHappened,
    /// Terminal: the signature window closed with zero premiums.
    /// Investors are refunded.
    NoInsureeFound,
}

impl VaultState {
    /// Stable integer encoding exposed at the query boundary. Part of
    /// the external interface — existing dashboards index on these.
    pub fn code(&self) -> u8 {
        match self {
            VaultState::Initial => 0,
            VaultState::InvestorFound => 1,
            VaultState::InsureeFound => 2,
            VaultState::Active => 3,
            VaultState::ClosedCaseHappened => 4,
            VaultState::ClosedNoCaseHappened => 5,
            VaultState::NoInsureeFound => 6,
        }
    }

    /// Whether investor deposits are admissible in this state.
    pub fn accepts_investor_deposits(&self) -> bool {
        matches!(self, VaultState::Initial | VaultState::InvestorFound)
    }

    /// Whether insuree premiums are admissible in this state.
    pub fn accepts_insuree_deposits(&self) -> bool {
        matches!(self, VaultState::InvestorFound | VaultState::InsureeFound)
    }

    /// Whether this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            VaultState::ClosedCaseHappened
                | VaultState::ClosedNoCaseHappened
                | VaultState::NoInsureeFound
        )
    }
}

impl std::fmt::Display for VaultState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VaultState::Initial => "Initial",
            VaultState::InvestorFound => "InvestorFound",
            VaultState::InsureeFound => "InsureeFound",
            VaultState::Active => "Active",
            VaultState::ClosedCaseHappened => "ClosedCaseHappened",
            VaultState::ClosedNoCaseHappened => "ClosedNoCaseHappened",
            VaultState::NoInsureeFound => "NoInsureeFound",
        };
        write!(f, "{}", name)
    }
}

// ---------------------------------------------------------------------------
// Period & Params
// ---------------------------------------------------------------------------

/// A closed time window `[start, end]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Inclusive window start.
    pub start: DateTime<Utc>,
    /// Inclusive window end.
    pub end: DateTime<Utc>,
}

impl Period {
    /// Creates a window without validating it; factories validate.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whether `t` lies inside the window (boundaries included).
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t <= self.end
    }

    /// Whether the window is well-formed (`start <= end`).
    pub fn is_well_formed(&self) -> bool {
        self.start <= self.end
    }
}

/// Construction parameters for a [`MoneyVault`].
///
/// The coin bindings and the two ratio knobs are optional at the call
/// site; the defaults come from [`crate::config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VaultParams {
    /// The insured coverage window.
    pub insurance_period: Period,
    /// The deposit window. Distinct from, and usually before, coverage.
    pub signature_period: Period,
    /// Receipt coin minted to investors, if the product has one.
    pub investor_coin: Option<Address>,
    /// Receipt coin minted to insurees, if the product has one.
    pub insuree_coin: Option<Address>,
    /// Backing ratio between investor capital and insuree coverage.
    pub capacity_factor: CapacityFactor,
    /// Receipt units minted per deposited base unit.
    pub receipt_multiplier: u64,
}

impl VaultParams {
    /// Creates params with no coin bindings and default ratios.
    pub fn new(insurance_period: Period, signature_period: Period) -> Self {
        Self {
            insurance_period,
            signature_period,
            investor_coin: None,
            insuree_coin: None,
            capacity_factor: CapacityFactor::default(),
            receipt_multiplier: DEFAULT_RECEIPT_MULTIPLIER,
        }
    }

    /// Binds the two receipt coins.
    pub fn with_coins(mut self, investor_coin: Address, insuree_coin: Address) -> Self {
        self.investor_coin = Some(investor_coin);
        self.insuree_coin = Some(insuree_coin);
        self
    }

    /// Overrides the capacity factor.
    pub fn with_capacity_factor(mut self, factor: CapacityFactor) -> Self {
        self.capacity_factor = factor;
        self
    }

    /// Overrides the receipt multiplier.
    pub fn with_receipt_multiplier(mut self, multiplier: u64) -> Self {
        self.receipt_multiplier = multiplier;
        self
    }
}

/// A settled withdrawal. Produced by the claim operations only after all
/// internal bookkeeping is final, so the actual funds transfer it
/// represents always observes post-settlement state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Who gets paid.
    pub payee: Address,
    /// How much, in base units.
    pub amount: u64,
}

// ---------------------------------------------------------------------------
// MoneyVault
// ---------------------------------------------------------------------------

/// The escrow for one insurance product.
///
/// Holds pooled investor and insuree funds, enforces the deposit windows
/// and the capacity invariant, resolves the outcome, and settles claims.
/// Single-writer: callers serialize access; each entry point runs to
/// completion and either commits fully or fails without side effects.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoneyVault {
    /// This vault's address.
    address: Address,
    /// Current lifecycle state.
    state: VaultState,
    /// The insured coverage window. Immutable.
    insurance_period: Period,
    /// The deposit window. Immutable.
    signature_period: Period,
    /// Backing ratio for insuree coverage.
    capacity_factor: CapacityFactor,
    /// Receipt units minted per deposited base unit.
    receipt_multiplier: u64,
    /// Investor-side receipt coin, if bound.
    investor_coin: Option<Address>,
    /// Insuree-side receipt coin, if bound.
    insuree_coin: Option<Address>,
    /// Per-investor cumulative deposits.
    investor_deposits: HashMap<Address, u64>,
    /// Per-insuree cumulative premiums.
    insuree_deposits: HashMap<Address, u64>,
    /// Running sum of `investor_deposits` (invariant: always equal).
    total_investor_deposits: u64,
    /// Running sum of `insuree_deposits` (invariant: always equal).
    total_insuree_deposits: u64,
    /// Backing capital reserved by premiums so far.
    ///
    /// Invariant: `total_coverage <= total_investor_deposits`.
    total_coverage: u64,
    /// Per-insuree reserved backing, used by the insuree payout.
    insuree_coverage: HashMap<Address, u64>,
    /// The outcome flag, fixed by `close_case`.
    outcome: Option<bool>,
    /// Investors that already settled.
    claimed_investors: HashSet<Address>,
    /// Insurees that already settled.
    claimed_insurees: HashSet<Address>,
    /// Sum of settled payouts.
    total_paid_out: u64,
    /// When the vault was created.
    created_at: DateTime<Utc>,
}

impl MoneyVault {
    /// Constructs a vault in `Initial`. Windows must already be
    /// validated — this is why construction goes through
    /// [`crate::vault_factory::VaultFactory`].
    pub(crate) fn new(creator: Address, params: VaultParams) -> Self {
        let nonce = Uuid::new_v4();
        Self {
            address: Address::derive(AddressKind::Vault, "", &creator, &nonce),
            state: VaultState::Initial,
            insurance_period: params.insurance_period,
            signature_period: params.signature_period,
            capacity_factor: params.capacity_factor,
            receipt_multiplier: params.receipt_multiplier,
            investor_coin: params.investor_coin,
            insuree_coin: params.insuree_coin,
            investor_deposits: HashMap::new(),
            insuree_deposits: HashMap::new(),
            total_investor_deposits: 0,
            total_insuree_deposits: 0,
            total_coverage: 0,
            insuree_coverage: HashMap::new(),
            outcome: None,
            claimed_investors: HashSet::new(),
            claimed_insurees: HashSet::new(),
            total_paid_out: 0,
            created_at: Utc::now(),
        }
    }

    // -- Queries ------------------------------------------------------------

    /// This vault's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The current lifecycle state.
    pub fn current_state(&self) -> VaultState {
        self.state
    }

    /// The current state's stable integer code.
    pub fn state_code(&self) -> u8 {
        self.state.code()
    }

    /// The insured coverage window.
    pub fn insurance_period(&self) -> Period {
        self.insurance_period
    }

    /// The deposit window.
    pub fn signature_period(&self) -> Period {
        self.signature_period
    }

    /// The configured backing ratio.
    pub fn capacity_factor(&self) -> CapacityFactor {
        self.capacity_factor
    }

    /// Receipt units minted per deposited base unit.
    pub fn receipt_multiplier(&self) -> u64 {
        self.receipt_multiplier
    }

    /// The investor-side receipt coin, if bound.
    pub fn investor_coin(&self) -> Option<Address> {
        self.investor_coin
    }

    /// The insuree-side receipt coin, if bound.
    pub fn insuree_coin(&self) -> Option<Address> {
        self.insuree_coin
    }

    /// Cumulative deposits of one investor.
    pub fn deposits_of_investor(&self, addr: &Address) -> u64 {
        self.investor_deposits.get(addr).copied().unwrap_or(0)
    }

    /// Cumulative premiums of one insuree.
    pub fn deposits_of_insuree(&self, addr: &Address) -> u64 {
        self.insuree_deposits.get(addr).copied().unwrap_or(0)
    }

    /// Backing capital reserved for one insuree.
    pub fn coverage_of_insuree(&self, addr: &Address) -> u64 {
        self.insuree_coverage.get(addr).copied().unwrap_or(0)
    }

    /// Sum of all investor deposits.
    pub fn total_investor_deposits(&self) -> u64 {
        self.total_investor_deposits
    }

    /// Sum of all insuree premiums.
    pub fn total_insuree_deposits(&self) -> u64 {
        self.total_insuree_deposits
    }

    /// Sum of both deposit totals. Cannot overflow: the deposit guards
    /// keep the combined total within u64.
    pub fn total_deposits(&self) -> u64 {
        self.total_investor_deposits + self.total_insuree_deposits
    }

    /// Funds still held: everything deposited minus everything settled.
    pub fn funds_held(&self) -> u64 {
        self.total_deposits() - self.total_paid_out
    }

    /// Investor capital not yet reserved by coverage.
    pub fn available_capacity(&self) -> u64 {
        self.total_investor_deposits - self.total_coverage
    }

    /// The outcome flag, if `close_case` has run.
    pub fn outcome(&self) -> Option<bool> {
        self.outcome
    }

    /// Number of distinct investors.
    pub fn investor_count(&self) -> usize {
        self.investor_deposits.len()
    }

    /// Number of distinct insurees.
    pub fn insuree_count(&self) -> usize {
        self.insuree_deposits.len()
    }

    // -- Deposits -----------------------------------------------------------

    /// Records an investor deposit and parks it in the pool.
    ///
    /// Valid in `Initial` and `InvestorFound`, inside the signature
    /// window. Transitions to `InvestorFound`. Returns the new investor
    /// total.
    ///
    /// # Errors
    ///
    /// [`VaultError::WrongState`] outside the two deposit states,
    /// [`VaultError::TooEarly`]/[`VaultError::TooLate`] outside the
    /// signature window, [`VaultError::ZeroDeposit`] for `amount == 0`,
    /// [`VaultError::AmountOverflow`] if totals would leave u64.
    pub fn investor_deposit(
        &mut self,
        clock: &dyn Clock,
        payer: Address,
        amount: u64,
    ) -> Result<u64, VaultError> {
        if !self.state.accepts_investor_deposits() {
            return Err(VaultError::WrongState {
                current: self.state,
                expected: "Initial or InvestorFound",
            });
        }
        self.check_signature_window(clock.now())?;
        if amount == 0 {
            return Err(VaultError::ZeroDeposit);
        }
        let new_total = self
            .total_investor_deposits
            .checked_add(amount)
            .ok_or(VaultError::AmountOverflow)?;
        // Keep the combined total representable so total_deposits() and
        // settlement arithmetic can never wrap.
        new_total
            .checked_add(self.total_insuree_deposits)
            .ok_or(VaultError::AmountOverflow)?;

        // All guards passed — commit.
        *self.investor_deposits.entry(payer).or_insert(0) += amount;
        self.total_investor_deposits = new_total;
        self.state = VaultState::InvestorFound;

        tracing::debug!(vault = %self.address, payer = %payer, amount, "investor deposit recorded");
        Ok(new_total)
    }

    /// Records an insuree premium, reserving backing capital at `factor`.
    ///
    /// Valid in `InvestorFound` and `InsureeFound`, inside the signature
    /// window, and only while the reserved backing stays within the
    /// investor pool. Transitions to `InsureeFound`. Returns the new
    /// insuree total.
    ///
    /// The factor is explicit per call; product-level wrappers pass the
    /// vault's configured factor.
    ///
    /// # Errors
    ///
    /// As [`investor_deposit`](Self::investor_deposit), plus
    /// [`VaultError::CapacityExceeded`] when the premium's backing would
    /// exceed unreserved investor capital.
    pub fn insuree_deposit(
        &mut self,
        clock: &dyn Clock,
        payer: Address,
        amount: u64,
        factor: CapacityFactor,
    ) -> Result<u64, VaultError> {
        if !self.state.accepts_insuree_deposits() {
            return Err(VaultError::WrongState {
                current: self.state,
                expected: "InvestorFound or InsureeFound",
            });
        }
        self.check_signature_window(clock.now())?;
        if amount == 0 {
            return Err(VaultError::ZeroDeposit);
        }
        let backing = factor.backing_required(amount)?;
        let new_coverage = self
            .total_coverage
            .checked_add(backing)
            .ok_or(VaultError::AmountOverflow)?;
        if new_coverage > self.total_investor_deposits {
            return Err(VaultError::CapacityExceeded {
                available: self.total_investor_deposits - self.total_coverage,
                required: backing,
            });
        }
        let new_total = self
            .total_insuree_deposits
            .checked_add(amount)
            .ok_or(VaultError::AmountOverflow)?;
        new_total
            .checked_add(self.total_investor_deposits)
            .ok_or(VaultError::AmountOverflow)?;

        // All guards passed — commit.
        *self.insuree_deposits.entry(payer).or_insert(0) += amount;
        *self.insuree_coverage.entry(payer).or_insert(0) += backing;
        self.total_insuree_deposits = new_total;
        self.total_coverage = new_coverage;
        self.state = VaultState::InsureeFound;

        tracing::debug!(vault = %self.address, payer = %payer, amount, backing, "insuree premium recorded");
        Ok(new_total)
    }

    // -- Transitions --------------------------------------------------------

    /// Starts coverage. Valid in `InsureeFound` once the insurance
    /// period has begun.
    ///
    /// # Errors
    ///
    /// [`VaultError::WrongState`] outside `InsureeFound`,
    /// [`VaultError::TooEarly`] before the insurance period starts.
    pub fn set_active(&mut self, clock: &dyn Clock) -> Result<(), VaultError> {
        if self.state != VaultState::InsureeFound {
            return Err(VaultError::WrongState {
                current: self.state,
                expected: "InsureeFound",
            });
        }
        let now = clock.now();
        if now < self.insurance_period.start {
            return Err(VaultError::TooEarly {
                now,
                earliest: self.insurance_period.start,
            });
        }

        self.state = VaultState::Active;
        tracing::info!(vault = %self.address, "vault active, coverage running");
        Ok(())
    }

    /// Winds the vault down when the signature window closed without a
    /// single premium. Valid in `Initial` and `InvestorFound` strictly
    /// after the signature period end. Terminal: investors can then
    /// reclaim their capital in full.
    ///
    /// # Errors
    ///
    /// [`VaultError::WrongState`] once any premium is recorded (or from
    /// any later state), [`VaultError::TooEarly`] while the signature
    /// window is still open.
    pub fn set_no_insuree_found(&mut self, clock: &dyn Clock) -> Result<(), VaultError> {
        if !matches!(
            self.state,
            VaultState::Initial | VaultState::InvestorFound
        ) {
            return Err(VaultError::WrongState {
                current: self.state,
                expected: "Initial or InvestorFound",
            });
        }
        let now = clock.now();
        if now <= self.signature_period.end {
            return Err(VaultError::TooEarly {
                now,
                earliest: self.signature_period.end,
            });
        }
        // InsureeFound is entered on the first premium, so these states
        // cannot hold premiums.
        debug_assert!(self.insuree_deposits.is_empty());

        self.state = VaultState::NoInsureeFound;
        tracing::info!(vault = %self.address, "no insuree found, vault wound down");
        Ok(())
    }

    /// Fixes the external outcome flag and moves to the matching
    /// terminal state. Valid only in `Active`.
    ///
    /// # Errors
    ///
    /// [`VaultError::WrongState`] outside `Active`.
    pub fn close_case(&mut self, outcome_happened: bool) -> Result<(), VaultError> {
        if self.state != VaultState::Active {
            return Err(VaultError::WrongState {
                current: self.state,
                expected: "Active",
            });
        }

        self.outcome = Some(outcome_happened);
        self.state = if outcome_happened {
            VaultState::ClosedCaseHappened
        } else {
            VaultState::ClosedNoCaseHappened
        };
        tracing::info!(vault = %self.address, outcome_happened, state = %self.state, "case closed");
        Ok(())
    }

    // -- Settlement ---------------------------------------------------------

    /// Settles an investor's claim: the full recorded deposit, refunded
    /// because no insured event consumed the capital.
    ///
    /// Valid only in `ClosedNoCaseHappened` and `NoInsureeFound`.
    /// All-or-nothing per payee, exactly once. Bookkeeping (claimed set,
    /// paid-out total) is final before the [`Payout`] is surfaced, so the
    /// transfer it represents observes post-settlement state.
    ///
    /// # Errors
    ///
    /// [`VaultError::NotActiveInvestorBenefits`] in any other state,
    /// [`VaultError::AlreadyClaimed`] on a repeat claim,
    /// [`VaultError::NothingToClaim`] for payees with no deposits.
    pub fn claim_as_investor(&mut self, payee: Address) -> Result<Payout, VaultError> {
        if !matches!(
            self.state,
            VaultState::ClosedNoCaseHappened | VaultState::NoInsureeFound
        ) {
            return Err(VaultError::NotActiveInvestorBenefits {
                current: self.state,
            });
        }
        if self.claimed_investors.contains(&payee) {
            return Err(VaultError::AlreadyClaimed { payee });
        }
        let amount = *self
            .investor_deposits
            .get(&payee)
            .ok_or(VaultError::NothingToClaim { payee })?;

        // All guards passed — settle.
        self.claimed_investors.insert(payee);
        // Bounded by total_deposits, which the deposit guards kept in range.
        self.total_paid_out += amount;

        tracing::info!(vault = %self.address, payee = %payee, amount, "investor claim settled");
        Ok(Payout { payee, amount })
    }

    /// Settles an insuree's claim: the premium returned plus the covered
    /// amount, sourced from the investor pool because the case happened.
    ///
    /// Valid only in `ClosedCaseHappened`. All-or-nothing per payee,
    /// exactly once, bookkeeping-before-transfer as above.
    ///
    /// # Errors
    ///
    /// [`VaultError::NotActiveInsureeBenefits`] in any other state,
    /// [`VaultError::AlreadyClaimed`] on a repeat claim,
    /// [`VaultError::NothingToClaim`] for payees with no premiums.
    pub fn claim_as_insuree(&mut self, payee: Address) -> Result<Payout, VaultError> {
        if self.state != VaultState::ClosedCaseHappened {
            return Err(VaultError::NotActiveInsureeBenefits {
                current: self.state,
            });
        }
        if self.claimed_insurees.contains(&payee) {
            return Err(VaultError::AlreadyClaimed { payee });
        }
        let deposit = *self
            .insuree_deposits
            .get(&payee)
            .ok_or(VaultError::NothingToClaim { payee })?;
        let coverage = self.coverage_of_insuree(&payee);
        // deposit <= total_insuree and coverage <= total_investor, and
        // their totals fit u64 together, so this cannot wrap in practice.
        let amount = deposit
            .checked_add(coverage)
            .ok_or(VaultError::AmountOverflow)?;

        // All guards passed — settle.
        self.claimed_insurees.insert(payee);
        self.total_paid_out += amount;

        tracing::info!(vault = %self.address, payee = %payee, amount, "insuree claim settled");
        Ok(Payout { payee, amount })
    }

    // -- Internal -----------------------------------------------------------

    /// Window guard shared by both deposit kinds. The signature period
    /// is the window during which deposits are accepted.
    fn check_signature_window(&self, now: DateTime<Utc>) -> Result<(), VaultError> {
        if now < self.signature_period.start {
            return Err(VaultError::TooEarly {
                now,
                earliest: self.signature_period.start,
            });
        }
        if now > self.signature_period.end {
            return Err(VaultError::TooLate {
                now,
                latest: self.signature_period.end,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).expect("valid timestamp")
    }

    /// Signature window [100, 200], insurance window [150, 400].
    fn vault() -> MoneyVault {
        let params = VaultParams::new(
            Period::new(ts(150), ts(400)),
            Period::new(ts(100), ts(200)),
        );
        MoneyVault::new(addr(0xFF), params)
    }

    fn clock_at(secs: i64) -> ManualClock {
        ManualClock::new(ts(secs))
    }

    fn factor(percent: u64) -> CapacityFactor {
        CapacityFactor::from_percent(percent).unwrap()
    }

    // -- construction & queries --

    #[test]
    fn new_vault_starts_initial_and_empty() {
        let v = vault();
        assert_eq!(v.current_state(), VaultState::Initial);
        assert_eq!(v.state_code(), 0);
        assert_eq!(v.total_deposits(), 0);
        assert_eq!(v.funds_held(), 0);
        assert_eq!(v.outcome(), None);
        assert_eq!(v.deposits_of_investor(&addr(1)), 0);
    }

    #[test]
    fn state_codes_are_stable() {
        assert_eq!(VaultState::Initial.code(), 0);
        assert_eq!(VaultState::InvestorFound.code(), 1);
        assert_eq!(VaultState::InsureeFound.code(), 2);
        assert_eq!(VaultState::Active.code(), 3);
        assert_eq!(VaultState::ClosedCaseHappened.code(), 4);
        assert_eq!(VaultState::ClosedNoCaseHappened.code(), 5);
        assert_eq!(VaultState::NoInsureeFound.code(), 6);
    }

    // -- investor deposits --

    #[test]
    fn investor_deposit_parks_funds_like_an_escrow() {
        let mut v = vault();
        let clock = clock_at(150);
        v.investor_deposit(&clock, addr(1), 1_000).unwrap();

        assert_eq!(v.current_state(), VaultState::InvestorFound);
        assert_eq!(v.deposits_of_investor(&addr(1)), 1_000);
        assert_eq!(v.total_investor_deposits(), 1_000);
        assert_eq!(v.funds_held(), 1_000);
    }

    #[test]
    fn repeated_investor_deposits_accumulate() {
        let mut v = vault();
        let clock = clock_at(150);
        v.investor_deposit(&clock, addr(1), 600).unwrap();
        v.investor_deposit(&clock, addr(1), 400).unwrap();
        v.investor_deposit(&clock, addr(2), 250).unwrap();

        assert_eq!(v.deposits_of_investor(&addr(1)), 1_000);
        assert_eq!(v.deposits_of_investor(&addr(2)), 250);
        assert_eq!(v.total_investor_deposits(), 1_250);
        assert_eq!(v.investor_count(), 2);
    }

    #[test]
    fn investor_deposit_before_window_rejected() {
        let mut v = vault();
        let clock = clock_at(99);
        let result = v.investor_deposit(&clock, addr(1), 100);
        assert!(matches!(result, Err(VaultError::TooEarly { .. })));
        assert_eq!(v.current_state(), VaultState::Initial);
        assert_eq!(v.total_investor_deposits(), 0);
    }

    #[test]
    fn investor_deposit_after_window_rejected() {
        let mut v = vault();
        let clock = clock_at(201);
        let result = v.investor_deposit(&clock, addr(1), 100);
        assert!(matches!(result, Err(VaultError::TooLate { .. })));
        assert_eq!(v.total_investor_deposits(), 0);
    }

    #[test]
    fn investor_deposit_on_window_boundaries_accepted() {
        let mut v = vault();
        v.investor_deposit(&clock_at(100), addr(1), 1).unwrap();
        v.investor_deposit(&clock_at(200), addr(1), 1).unwrap();
        assert_eq!(v.deposits_of_investor(&addr(1)), 2);
    }

    #[test]
    fn zero_deposit_rejected() {
        let mut v = vault();
        let result = v.investor_deposit(&clock_at(150), addr(1), 0);
        assert!(matches!(result, Err(VaultError::ZeroDeposit)));
        assert_eq!(v.current_state(), VaultState::Initial);
    }

    #[test]
    fn investor_total_overflow_rejected() {
        let mut v = vault();
        let clock = clock_at(150);
        v.investor_deposit(&clock, addr(1), u64::MAX).unwrap();
        let result = v.investor_deposit(&clock, addr(2), 1);
        assert!(matches!(result, Err(VaultError::AmountOverflow)));
        assert_eq!(v.total_investor_deposits(), u64::MAX);
    }

    // -- insuree deposits & capacity --

    #[test]
    fn insuree_deposit_requires_an_investor_first() {
        let mut v = vault();
        let result = v.insuree_deposit(&clock_at(150), addr(2), 10, factor(100));
        assert!(matches!(result, Err(VaultError::WrongState { .. })));
    }

    #[test]
    fn insuree_deposit_within_capacity_accepted() {
        let mut v = vault();
        let clock = clock_at(150);
        v.investor_deposit(&clock, addr(1), 20).unwrap();
        v.insuree_deposit(&clock, addr(2), 10, factor(100)).unwrap();

        assert_eq!(v.current_state(), VaultState::InsureeFound);
        assert_eq!(v.total_investor_deposits(), 20);
        assert_eq!(v.total_insuree_deposits(), 10);
        assert_eq!(v.total_deposits(), 30);
        assert_eq!(v.coverage_of_insuree(&addr(2)), 10);
        assert_eq!(v.available_capacity(), 10);
    }

    #[test]
    fn insuree_deposit_breaching_capacity_rejected() {
        let mut v = vault();
        let clock = clock_at(150);
        v.investor_deposit(&clock, addr(1), 10).unwrap();

        let result = v.insuree_deposit(&clock, addr(2), 11, factor(100));
        assert!(matches!(
            result,
            Err(VaultError::CapacityExceeded {
                available: 10,
                required: 11,
            })
        ));
        // Totals unchanged, state unchanged.
        assert_eq!(v.total_investor_deposits(), 10);
        assert_eq!(v.total_insuree_deposits(), 0);
        assert_eq!(v.current_state(), VaultState::InvestorFound);
    }

    #[test]
    fn insuree_deposit_exactly_at_capacity_accepted() {
        let mut v = vault();
        let clock = clock_at(150);
        v.investor_deposit(&clock, addr(1), 10).unwrap();
        v.insuree_deposit(&clock, addr(2), 10, factor(100)).unwrap();
        assert_eq!(v.available_capacity(), 0);

        // Pool is fully reserved — one more unit must fail.
        let result = v.insuree_deposit(&clock, addr(3), 1, factor(100));
        assert!(matches!(result, Err(VaultError::CapacityExceeded { .. })));
    }

    #[test]
    fn capacity_uses_the_given_factor() {
        let mut v = vault();
        let clock = clock_at(150);
        v.investor_deposit(&clock, addr(1), 30).unwrap();

        // Factor 2.0: a premium of 10 reserves 20 backing.
        v.insuree_deposit(&clock, addr(2), 10, factor(200)).unwrap();
        assert_eq!(v.coverage_of_insuree(&addr(2)), 20);
        assert_eq!(v.available_capacity(), 10);

        // Another 10 at factor 2.0 would need 20 — only 10 left.
        let result = v.insuree_deposit(&clock, addr(3), 10, factor(200));
        assert!(matches!(result, Err(VaultError::CapacityExceeded { .. })));
    }

    #[test]
    fn insuree_deposit_outside_window_rejected() {
        let mut v = vault();
        v.investor_deposit(&clock_at(150), addr(1), 100).unwrap();
        let result = v.insuree_deposit(&clock_at(201), addr(2), 10, factor(100));
        assert!(matches!(result, Err(VaultError::TooLate { .. })));
    }

    #[test]
    fn interleaved_deposits_keep_totals_consistent() {
        let mut v = vault();
        let clock = clock_at(150);
        v.investor_deposit(&clock, addr(1), 50).unwrap();
        v.insuree_deposit(&clock, addr(3), 20, factor(100)).unwrap();
        // More investors can join after the first premium.
        v.investor_deposit(&clock, addr(2), 30).unwrap();
        v.insuree_deposit(&clock, addr(4), 40, factor(100)).unwrap();

        assert_eq!(v.total_investor_deposits(), 80);
        assert_eq!(v.total_insuree_deposits(), 60);
        assert_eq!(v.total_deposits(), 140);
        let sum: u64 = [addr(1), addr(2)]
            .iter()
            .map(|a| v.deposits_of_investor(a))
            .sum();
        assert_eq!(sum, v.total_investor_deposits());
    }

    // -- activation --

    #[test]
    fn set_active_after_insurance_start() {
        let mut v = vault();
        let clock = clock_at(150);
        v.investor_deposit(&clock, addr(1), 10).unwrap();
        v.insuree_deposit(&clock, addr(2), 10, factor(100)).unwrap();
        v.set_active(&clock).unwrap();
        assert_eq!(v.current_state(), VaultState::Active);
    }

    #[test]
    fn set_active_too_early_rejected() {
        let mut v = vault();
        let clock = clock_at(120);
        v.investor_deposit(&clock, addr(1), 10).unwrap();
        v.insuree_deposit(&clock, addr(2), 10, factor(100)).unwrap();

        let result = v.set_active(&clock);
        assert!(matches!(result, Err(VaultError::TooEarly { .. })));
        assert_eq!(v.current_state(), VaultState::InsureeFound);
    }

    #[test]
    fn set_active_without_insuree_rejected() {
        let mut v = vault();
        v.investor_deposit(&clock_at(150), addr(1), 10).unwrap();
        let result = v.set_active(&clock_at(160));
        assert!(matches!(result, Err(VaultError::WrongState { .. })));
    }

    // -- no insuree found --

    #[test]
    fn no_insuree_found_after_window_close() {
        let mut v = vault();
        v.investor_deposit(&clock_at(150), addr(1), 10).unwrap();
        v.set_no_insuree_found(&clock_at(201)).unwrap();
        assert_eq!(v.current_state(), VaultState::NoInsureeFound);
        assert!(v.current_state().is_terminal());
    }

    #[test]
    fn no_insuree_found_while_window_open_rejected() {
        let mut v = vault();
        v.investor_deposit(&clock_at(150), addr(1), 10).unwrap();
        // Still inside the window, even at the boundary.
        let result = v.set_no_insuree_found(&clock_at(200));
        assert!(matches!(result, Err(VaultError::TooEarly { .. })));
    }

    #[test]
    fn no_insuree_found_blocked_once_premium_recorded() {
        let mut v = vault();
        let clock = clock_at(150);
        v.investor_deposit(&clock, addr(1), 10).unwrap();
        v.insuree_deposit(&clock, addr(2), 5, factor(100)).unwrap();

        let result = v.set_no_insuree_found(&clock_at(300));
        assert!(matches!(result, Err(VaultError::WrongState { .. })));
    }

    // -- close & claims --

    fn active_vault() -> MoneyVault {
        let mut v = vault();
        let clock = clock_at(150);
        v.investor_deposit(&clock, addr(1), 1).unwrap();
        v.insuree_deposit(&clock, addr(2), 1, factor(100)).unwrap();
        v.set_active(&clock).unwrap();
        v
    }

    #[test]
    fn close_case_happened_routes_to_insurees() {
        let mut v = active_vault();
        v.close_case(true).unwrap();

        assert_eq!(v.current_state(), VaultState::ClosedCaseHappened);
        assert_eq!(v.outcome(), Some(true));

        // Investor side is locked out...
        let result = v.claim_as_investor(addr(1));
        assert!(matches!(
            result,
            Err(VaultError::NotActiveInvestorBenefits { .. })
        ));

        // ...and the insuree collects premium + coverage.
        let payout = v.claim_as_insuree(addr(2)).unwrap();
        assert_eq!(payout, Payout { payee: addr(2), amount: 2 });
        assert_eq!(v.funds_held(), 0);
    }

    #[test]
    fn close_case_not_happened_routes_to_investors() {
        let mut v = active_vault();
        v.close_case(false).unwrap();

        assert_eq!(v.current_state(), VaultState::ClosedNoCaseHappened);
        assert_eq!(v.outcome(), Some(false));

        let result = v.claim_as_insuree(addr(2));
        assert!(matches!(
            result,
            Err(VaultError::NotActiveInsureeBenefits { .. })
        ));

        let payout = v.claim_as_investor(addr(1)).unwrap();
        assert_eq!(payout.amount, 1);
    }

    #[test]
    fn close_case_outside_active_rejected() {
        let mut v = vault();
        let result = v.close_case(true);
        assert!(matches!(result, Err(VaultError::WrongState { .. })));
    }

    #[test]
    fn investor_refund_after_no_insuree_found() {
        let mut v = vault();
        v.investor_deposit(&clock_at(150), addr(1), 700).unwrap();
        v.set_no_insuree_found(&clock_at(250)).unwrap();

        let payout = v.claim_as_investor(addr(1)).unwrap();
        assert_eq!(payout.amount, 700);
        assert_eq!(v.funds_held(), 0);
    }

    #[test]
    fn repeat_claim_rejected() {
        let mut v = vault();
        v.investor_deposit(&clock_at(150), addr(1), 700).unwrap();
        v.set_no_insuree_found(&clock_at(250)).unwrap();

        v.claim_as_investor(addr(1)).unwrap();
        let result = v.claim_as_investor(addr(1));
        assert!(matches!(result, Err(VaultError::AlreadyClaimed { .. })));
        // The query surface still shows the historical deposit.
        assert_eq!(v.deposits_of_investor(&addr(1)), 700);
    }

    #[test]
    fn claim_without_deposit_rejected() {
        let mut v = vault();
        v.investor_deposit(&clock_at(150), addr(1), 700).unwrap();
        v.set_no_insuree_found(&clock_at(250)).unwrap();

        let result = v.claim_as_investor(addr(9));
        assert!(matches!(result, Err(VaultError::NothingToClaim { .. })));
    }

    #[test]
    fn insuree_payout_scales_with_factor() {
        let mut v = vault();
        let clock = clock_at(150);
        v.investor_deposit(&clock, addr(1), 100).unwrap();
        v.insuree_deposit(&clock, addr(2), 10, factor(300)).unwrap();
        v.set_active(&clock).unwrap();
        v.close_case(true).unwrap();

        // Premium 10 back plus 30 coverage from the investor pool.
        let payout = v.claim_as_insuree(addr(2)).unwrap();
        assert_eq!(payout.amount, 40);
        assert_eq!(v.funds_held(), 70);
    }

    #[test]
    fn claims_before_resolution_rejected() {
        let mut v = active_vault();
        assert!(matches!(
            v.claim_as_investor(addr(1)),
            Err(VaultError::NotActiveInvestorBenefits { .. })
        ));
        assert!(matches!(
            v.claim_as_insuree(addr(2)),
            Err(VaultError::NotActiveInsureeBenefits { .. })
        ));
    }

    // -- terminal monotonicity --

    #[test]
    fn terminal_states_admit_no_mutation() {
        let mut v = active_vault();
        v.close_case(true).unwrap();
        let clock = clock_at(150);

        assert!(matches!(
            v.investor_deposit(&clock, addr(1), 1),
            Err(VaultError::WrongState { .. })
        ));
        assert!(matches!(
            v.insuree_deposit(&clock, addr(2), 1, factor(100)),
            Err(VaultError::WrongState { .. })
        ));
        assert!(matches!(
            v.set_active(&clock),
            Err(VaultError::WrongState { .. })
        ));
        assert!(matches!(
            v.set_no_insuree_found(&clock_at(300)),
            Err(VaultError::WrongState { .. })
        ));
        assert!(matches!(
            v.close_case(false),
            Err(VaultError::WrongState { .. })
        ));
        // Still queryable.
        assert_eq!(v.state_code(), 4);
        assert_eq!(v.total_deposits(), 2);
    }

    #[test]
    fn serialization_roundtrip() {
        let mut v = active_vault();
        v.close_case(true).unwrap();

        let json = serde_json::to_string(&v).expect("serialize");
        let back: MoneyVault = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(back.current_state(), VaultState::ClosedCaseHappened);
        assert_eq!(back.total_deposits(), v.total_deposits());
        assert_eq!(back.address(), v.address());
    }
}
