//! # Capacity-Factor Arithmetic
//!
//! The capacity factor bounds how much insuree coverage one unit of
//! investor capital may back. It is an integer number of percentage
//! points over a scale of 100 — 100 means one-to-one backing, 150 means
//! every premium unit reserves one and a half units of investor capital.
//! Basis-point-style integer rates keep floating point away from money
//! entirely.
//!
//! The rounding direction matters: [`CapacityFactor::backing_required`]
//! rounds **up**, so a fractional remainder always reserves one more
//! backing unit. The capacity invariant stays conservative under every
//! deposit sequence.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{CAPACITY_FACTOR_SCALE, DEFAULT_CAPACITY_FACTOR_PCT};

/// Errors from capacity-factor construction and arithmetic.
#[derive(Debug, Error)]
pub enum CoverageError {
    /// A factor of zero would let premiums reserve no backing at all.
    #[error("capacity factor must be positive")]
    ZeroFactor,

    /// The backing amount left the u64 range.
    #[error("coverage overflow: {amount} at {percent} percentage points exceeds u64 range")]
    Overflow {
        /// The deposit amount being covered.
        amount: u64,
        /// The factor in percentage points.
        percent: u64,
    },
}

/// How much investor capital one unit of insuree premium reserves,
/// in percentage points over [`CAPACITY_FACTOR_SCALE`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityFactor {
    percent: u64,
}

impl CapacityFactor {
    /// Creates a factor from percentage points.
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::ZeroFactor`] for `percent == 0`.
    pub fn from_percent(percent: u64) -> Result<Self, CoverageError> {
        if percent == 0 {
            return Err(CoverageError::ZeroFactor);
        }
        Ok(Self { percent })
    }

    /// Returns the factor in percentage points.
    pub fn percent(&self) -> u64 {
        self.percent
    }

    /// Returns the backing capital a deposit of `amount` reserves.
    ///
    /// Computed as `ceil(amount * percent / 100)` in 128-bit space;
    /// rounding up keeps the capacity invariant conservative.
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::Overflow`] if the result does not fit
    /// in a u64.
    pub fn backing_required(&self, amount: u64) -> Result<u64, CoverageError> {
        let scaled = u128::from(amount) * u128::from(self.percent);
        let scale = u128::from(CAPACITY_FACTOR_SCALE);
        let backing = (scaled + scale - 1) / scale;
        u64::try_from(backing).map_err(|_| CoverageError::Overflow {
            amount,
            percent: self.percent,
        })
    }
}

impl Default for CapacityFactor {
    fn default() -> Self {
        Self {
            percent: DEFAULT_CAPACITY_FACTOR_PCT,
        }
    }
}

impl std::fmt::Display for CapacityFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{:02}x",
            self.percent / CAPACITY_FACTOR_SCALE,
            self.percent % CAPACITY_FACTOR_SCALE
        )
    }
}
