//! # Events — Structured Calculation Event Log
//!
//! A bounded, thread-safe log of calculation activity. Every event is also
//! emitted through `tracing`, so the log doubles as the crate's structured
//! logging point for lifecycle transitions.
//!
//! | Variant | Emitted When |
//! |---------|-------------|
//! | `CalculationStarted` | The loop records its startup time |
//! | `PrimeFound` | A prime has been published to the prime set |
//! | `CalculationStopped` | The loop exits normally |
//! | `Error` | The loop exits with an error (candidate overflow) |
//!
//! The bus registers as a [`DiscoveryObserver`] so the engine can feed it
//! discoveries without knowing about it.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info};

use crate::engine::StopReason;
use crate::DiscoveryObserver;

#[derive(Clone, Debug)]
pub enum Event {
    CalculationStarted {
        timestamp: DateTime<Utc>,
    },
    PrimeFound {
        prime: u64,
        timestamp: DateTime<Utc>,
    },
    CalculationStopped {
        reason: StopReason,
        tested: u64,
        found: u64,
        elapsed_secs: f64,
        timestamp: DateTime<Utc>,
    },
    Error {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct EventRecord {
    pub id: u64,
    pub kind: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

const RECENT_EVENTS_CAP: usize = 200;

pub struct EventBus {
    recent: Mutex<VecDeque<EventRecord>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(RECENT_EVENTS_CAP)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        EventBus {
            recent: Mutex::new(VecDeque::with_capacity(capacity)),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        }
    }

    /// Log `event` and append it to the bounded record buffer.
    pub fn emit(&self, event: Event) {
        let (kind, message, timestamp) = match event {
            Event::CalculationStarted { timestamp } => {
                info!(startup = %timestamp, "calculation started");
                ("started", "calculation started".to_string(), timestamp)
            }
            Event::PrimeFound { prime, timestamp } => {
                debug!(prime, "prime found");
                ("prime", prime.to_string(), timestamp)
            }
            Event::CalculationStopped {
                reason,
                tested,
                found,
                elapsed_secs,
                timestamp,
            } => {
                info!(
                    ?reason,
                    tested,
                    found,
                    elapsed = format_args!("{:.1}s", elapsed_secs),
                    "calculation stopped"
                );
                (
                    "stopped",
                    format!(
                        "{:?}: tested {} candidates, found {} primes in {:.1}s",
                        reason, tested, found, elapsed_secs
                    ),
                    timestamp,
                )
            }
            Event::Error { message, timestamp } => {
                error!(%message, "calculation failed");
                ("error", message, timestamp)
            }
        };

        let record = EventRecord {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            kind: kind.to_string(),
            message,
            timestamp,
        };
        let mut recent = self.recent.lock();
        if recent.len() >= self.capacity {
            recent.pop_front();
        }
        recent.push_back(record);
    }

    /// Most recent `limit` records, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<EventRecord> {
        let recent = self.recent.lock();
        let skip = recent.len().saturating_sub(limit);
        recent.iter().skip(skip).cloned().collect()
    }
}

impl DiscoveryObserver for EventBus {
    fn on_prime(&self, prime: u64) {
        self.emit(Event::PrimeFound {
            prime,
            timestamp: Utc::now(),
        });
    }
}
