//! Error types for the prime calculator.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CalculatorError>;

/// Errors returned by calculator queries and lifecycle calls.
#[derive(Debug, Error)]
pub enum CalculatorError {
    /// The calculation loop has never been started.
    #[error("calculation has not been started")]
    NotStarted,

    /// No prime has been discovered yet.
    #[error("no primes discovered yet")]
    NoPrimesYet,

    /// The calculator already left the idle state (running or stopped).
    #[error("calculator already started or stopped; there is no restart")]
    AlreadyStarted,

    /// The candidate counter cannot advance past `last`.
    #[error("candidate counter overflow after {last}")]
    CandidateOverflow { last: u64 },

    #[error("calculation thread panicked")]
    ThreadPanicked,

    #[error("failed to spawn calculation thread: {0}")]
    Spawn(#[from] std::io::Error),
}
