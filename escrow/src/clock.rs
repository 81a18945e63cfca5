//! # Clock Abstraction
//!
//! Time in the escrow engine is an oracle value, not a scheduler concept:
//! every time-gated entry point samples the current timestamp exactly once
//! and compares it against the vault's immutable windows. Injecting the
//! clock instead of reading a global makes those comparisons
//! deterministic under test — a [`ManualClock`] can sit a vault precisely
//! on a window boundary, something wall-clock time never reliably does.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// A source of "now" for time-gated vault operations.
///
/// Implementations must be cheap to call; the engine samples the clock
/// once per entry point and never caches the value across calls.
pub trait Clock: Send + Sync {
    /// Returns the current timestamp.
    fn now(&self) -> DateTime<Utc>;
}

/// The production clock — wall-clock UTC time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A settable clock for tests and scripted demos.
///
/// Interior mutability lets a single clock be shared by reference with
/// the vault operations while the test advances it between calls.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a manual clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Jumps the clock to an absolute timestamp. Moving backwards is
    /// allowed — tests sometimes need to replay a window.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }

    /// Advances the clock by a relative duration.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).expect("valid timestamp")
    }

    #[test]
    fn manual_clock_returns_start_time() {
        let clock = ManualClock::new(ts(1_000));
        assert_eq!(clock.now(), ts(1_000));
        // Repeated reads do not drift.
        assert_eq!(clock.now(), ts(1_000));
    }

    #[test]
    fn manual_clock_advance() {
        let clock = ManualClock::new(ts(1_000));
        clock.advance(Duration::seconds(500));
        assert_eq!(clock.now(), ts(1_500));
    }

    #[test]
    fn manual_clock_set_absolute() {
        let clock = ManualClock::new(ts(1_000));
        clock.set(ts(42));
        assert_eq!(clock.now(), ts(42));
    }

    #[test]
    fn system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
