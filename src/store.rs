//! # Store — Append-Only Ordered Prime Set
//!
//! The calculation loop is the single writer; any number of threads read.
//! Values are accepted only when strictly greater than the current last
//! element, so the set is always sorted, deduplicated, and never shrinks.
//! Readers copy out a snapshot under a short read lock.

use parking_lot::RwLock;
use std::fmt::Write as _;

pub const DEFAULT_SEPARATOR: &str = ", ";

#[derive(Debug, Default)]
pub struct PrimeStore {
    primes: RwLock<Vec<u64>>,
}

impl PrimeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `prime`. Returns false (and changes nothing) if it would break
    /// strict ordering.
    pub fn push(&self, prime: u64) -> bool {
        let mut primes = self.primes.write();
        if primes.last().is_some_and(|&last| prime <= last) {
            return false;
        }
        primes.push(prime);
        true
    }

    pub fn snapshot(&self) -> Vec<u64> {
        self.primes.read().clone()
    }

    pub fn len(&self) -> usize {
        self.primes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.primes.read().is_empty()
    }

    pub fn last(&self) -> Option<u64> {
        self.primes.read().last().copied()
    }

    pub fn contains(&self, value: u64) -> bool {
        self.primes.read().binary_search(&value).is_ok()
    }

    /// Render every prime in increasing order joined by `separator`.
    /// An empty store renders as an empty string.
    pub fn join(&self, separator: &str) -> String {
        let primes = self.primes.read();
        let mut out = String::with_capacity(primes.len() * (separator.len() + 4));
        for (i, p) in primes.iter().enumerate() {
            if i > 0 {
                out.push_str(separator);
            }
            let _ = write!(out, "{}", p);
        }
        out
    }
}
