pub mod engine;
pub mod error;
pub mod events;
pub mod progress;
pub mod store;

pub use engine::{
    CalculationHandle, CalculatorConfig, PrimeCalculator, RunSummary, StopReason,
};
pub use error::{CalculatorError, Result};
pub use store::PrimeStore;

/// Hook invoked by the calculation loop. Implementations run on the loop
/// thread, so they must be cheap.
pub trait DiscoveryObserver: Send + Sync {
    /// Polled before every candidate. Returning true ends the run.
    fn is_stop_requested(&self) -> bool {
        false
    }

    /// Called after `prime` has been published to the prime set.
    fn on_prime(&self, prime: u64);
}

/// Number of divisors tested between polls of the stop signal.
pub const STOP_POLL_INTERVAL: u64 = 1 << 16;

/// Outcome of testing a single candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primality {
    Prime,
    /// `divisor` is the largest proper divisor (the first hit scanning downward).
    Composite { divisor: u64 },
    /// 0 and 1: neither prime nor composite.
    BelowTwo,
    /// The stop signal fired before the scan finished.
    Interrupted,
}

/// Trial division scanning `d` from `n - 1` down to 2.
///
/// This is deliberately the worst-case O(n) scan with no square-root bound.
/// `should_stop` is polled every [`STOP_POLL_INTERVAL`] divisors.
pub fn trial_division(n: u64, should_stop: impl Fn() -> bool) -> Primality {
    if n < 2 {
        return Primality::BelowTwo;
    }
    let mut budget = STOP_POLL_INTERVAL;
    let mut d = n - 1;
    while d > 1 {
        if n % d == 0 {
            return Primality::Composite { divisor: d };
        }
        budget -= 1;
        if budget == 0 {
            if should_stop() {
                return Primality::Interrupted;
            }
            budget = STOP_POLL_INTERVAL;
        }
        d -= 1;
    }
    Primality::Prime
}

/// Uninterruptible primality check using [`trial_division`].
pub fn is_prime(n: u64) -> bool {
    trial_division(n, || false) == Primality::Prime
}

/// Advance the candidate counter, refusing to wrap at `u64::MAX`.
pub fn next_candidate(current: u64) -> Result<u64> {
    current
        .checked_add(1)
        .ok_or(CalculatorError::CandidateOverflow { last: current })
}
