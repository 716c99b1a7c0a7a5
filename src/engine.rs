//! # Engine — Background Prime Discovery
//!
//! `PrimeCalculator` walks candidates upward from 2, tests each with the
//! downward trial-division scan, and publishes every prime to a
//! [`PrimeStore`] the moment it is confirmed. Callers on other threads query
//! the store and timestamps at any time.
//!
//! ## Lifecycle
//!
//! `Idle -> Running -> Stopped`, held in a single atomic. The run flag is
//! "state is `Running`". There is no restart path: once the calculator has
//! left `Idle`, `start`/`run` return [`CalculatorError::AlreadyStarted`].
//! `stop()` is a fire-and-forget store; the loop observes it before the next
//! candidate, or mid-candidate at the next poll of the trial-division scan.
//!
//! ## Threads
//!
//! `start()` spawns a named OS thread and returns a [`CalculationHandle`]
//! whose `join()` yields the [`RunSummary`]. `run()` executes the same loop on
//! the caller's thread.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::{CalculatorError, Result};
use crate::events::{Event, EventBus};
use crate::progress::Progress;
use crate::store::{PrimeStore, DEFAULT_SEPARATOR};
use crate::{next_candidate, trial_division, DiscoveryObserver, Primality};

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

const FIRST_CANDIDATE: u64 = 2;
const THREAD_NAME: &str = "prime-calculator";

/// Optional self-limits. The default is an unbounded run.
#[derive(Clone, Debug, Default)]
pub struct CalculatorConfig {
    /// Stop after this many primes have been found.
    pub max_primes: Option<u64>,
    /// Stop once the candidate would exceed this value.
    pub max_candidate: Option<u64>,
    /// Log progress at this interval while running. `None` or zero disables it.
    pub report_interval: Option<Duration>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// `stop()` was called.
    Requested,
    /// A registered observer asked for the run to end.
    Observer,
    PrimeLimit,
    CandidateLimit,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub reason: StopReason,
    pub tested: u64,
    pub found: u64,
    /// Highest candidate whose primality was fully decided, if any.
    pub last_candidate: Option<u64>,
    pub latest_prime: Option<u64>,
    pub startup: DateTime<Utc>,
    pub elapsed_secs: f64,
}

pub struct PrimeCalculator {
    primes: PrimeStore,
    state: AtomicU8,
    startup: OnceLock<DateTime<Utc>>,
    last_discovery: RwLock<Option<DateTime<Utc>>>,
    progress: Arc<Progress>,
    events: Arc<EventBus>,
    observers: RwLock<Vec<Arc<dyn DiscoveryObserver>>>,
    config: CalculatorConfig,
}

impl PrimeCalculator {
    pub fn new() -> Arc<Self> {
        Self::with_config(CalculatorConfig::default())
    }

    pub fn with_config(config: CalculatorConfig) -> Arc<Self> {
        let events = Arc::new(EventBus::new());
        Arc::new(PrimeCalculator {
            primes: PrimeStore::new(),
            state: AtomicU8::new(IDLE),
            startup: OnceLock::new(),
            last_discovery: RwLock::new(None),
            progress: Progress::new(),
            observers: RwLock::new(vec![events.clone() as Arc<dyn DiscoveryObserver>]),
            events,
            config,
        })
    }

    /// Register an observer. Only observers added before the loop begins are
    /// consulted by that run.
    pub fn add_observer(&self, observer: Arc<dyn DiscoveryObserver>) {
        self.observers.write().push(observer);
    }

    /// Spawn the calculation loop on its own thread.
    pub fn start(self: &Arc<Self>) -> Result<CalculationHandle> {
        self.begin()?;
        let calculator = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || calculator.execute());
        match spawned {
            Ok(inner) => Ok(CalculationHandle {
                inner,
                calculator: Arc::clone(self),
            }),
            Err(e) => {
                self.state.store(STOPPED, Ordering::Release);
                warn!(error = %e, "failed to spawn calculation thread");
                Err(CalculatorError::Spawn(e))
            }
        }
    }

    /// Run the calculation loop on the current thread until it stops.
    pub fn run(&self) -> Result<RunSummary> {
        self.begin()?;
        self.execute()
    }

    /// Request termination. Returns true if this call changed the state.
    pub fn stop(&self) -> bool {
        let previous = self.state.swap(STOPPED, Ordering::AcqRel);
        match previous {
            RUNNING => info!("stop requested"),
            IDLE => debug!("stop requested before start"),
            _ => {}
        }
        previous != STOPPED
    }

    pub fn is_calculating(&self) -> bool {
        self.state.load(Ordering::Acquire) == RUNNING
    }

    /// Snapshot of every prime found so far, in increasing order.
    pub fn primes(&self) -> Vec<u64> {
        self.primes.snapshot()
    }

    pub fn prime_count(&self) -> usize {
        self.primes.len()
    }

    /// Primes joined by `", "`.
    pub fn primes_string(&self) -> String {
        self.primes_string_with(DEFAULT_SEPARATOR)
    }

    /// Primes joined by `separator`; empty when nothing has been found.
    pub fn primes_string_with(&self, separator: &str) -> String {
        self.primes.join(separator)
    }

    pub fn latest_prime(&self) -> Result<u64> {
        self.primes.last().ok_or(CalculatorError::NoPrimesYet)
    }

    pub fn startup_time(&self) -> Result<DateTime<Utc>> {
        self.startup.get().copied().ok_or(CalculatorError::NotStarted)
    }

    pub fn last_discovery_time(&self) -> Result<DateTime<Utc>> {
        self.last_discovery.read().ok_or(CalculatorError::NoPrimesYet)
    }

    pub fn progress(&self) -> &Arc<Progress> {
        &self.progress
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Leave `Idle` and record the startup time.
    fn begin(&self) -> Result<()> {
        self.state
            .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CalculatorError::AlreadyStarted)?;
        let startup = Utc::now();
        let _ = self.startup.set(startup);
        self.progress.reset_clock();
        self.events.emit(Event::CalculationStarted { timestamp: startup });
        Ok(())
    }

    fn execute(&self) -> Result<RunSummary> {
        self.execute_with(FIRST_CANDIDATE, |n, should_stop| trial_division(n, should_stop))
    }

    /// Run the loop from `first` with `test` deciding primality.
    fn execute_with<T>(&self, first: u64, test: T) -> Result<RunSummary>
    where
        T: Fn(u64, &dyn Fn() -> bool) -> Primality,
    {
        let clock = Instant::now();
        let reporter = self
            .config
            .report_interval
            .filter(|interval| !interval.is_zero())
            .map(|interval| self.progress.start_reporter(interval));
        let observers = self.observers.read().clone();

        let outcome = self.calculate(&observers, first, test);

        self.state.store(STOPPED, Ordering::Release);
        self.progress.stop();
        if let Some(handle) = reporter {
            let _ = handle.join();
        }

        let tested = self.progress.tested.load(Ordering::Relaxed);
        let found = self.progress.found.load(Ordering::Relaxed);
        let elapsed_secs = clock.elapsed().as_secs_f64();
        match outcome {
            Ok((reason, last_candidate)) => {
                self.events.emit(Event::CalculationStopped {
                    reason,
                    tested,
                    found,
                    elapsed_secs,
                    timestamp: Utc::now(),
                });
                Ok(RunSummary {
                    reason,
                    tested,
                    found,
                    last_candidate,
                    latest_prime: self.primes.last(),
                    startup: self.startup_time()?,
                    elapsed_secs,
                })
            }
            Err(e) => {
                self.events.emit(Event::Error {
                    message: e.to_string(),
                    timestamp: Utc::now(),
                });
                Err(e)
            }
        }
    }

    fn calculate<T>(
        &self,
        observers: &[Arc<dyn DiscoveryObserver>],
        first: u64,
        test: T,
    ) -> Result<(StopReason, Option<u64>)>
    where
        T: Fn(u64, &dyn Fn() -> bool) -> Primality,
    {
        let observer_stop = || observers.iter().any(|o| o.is_stop_requested());
        let should_stop = || !self.is_calculating() || observer_stop();
        let mut last_decided = None;
        let mut current = first;

        loop {
            if !self.is_calculating() {
                return Ok((StopReason::Requested, last_decided));
            }
            if observer_stop() {
                return Ok((StopReason::Observer, last_decided));
            }
            if self.config.max_candidate.is_some_and(|max| current > max) {
                return Ok((StopReason::CandidateLimit, last_decided));
            }
            if self
                .config
                .max_primes
                .is_some_and(|max| self.primes.len() as u64 >= max)
            {
                return Ok((StopReason::PrimeLimit, last_decided));
            }

            self.progress.current.store(current, Ordering::Relaxed);
            match test(current, &should_stop) {
                Primality::Prime => self.record(current, observers),
                Primality::Composite { .. } | Primality::BelowTwo => {}
                Primality::Interrupted => {
                    let reason = if self.is_calculating() {
                        StopReason::Observer
                    } else {
                        StopReason::Requested
                    };
                    return Ok((reason, last_decided));
                }
            }
            self.progress.tested.fetch_add(1, Ordering::Relaxed);
            last_decided = Some(current);
            current = next_candidate(current)?;
        }
    }

    fn record(&self, prime: u64, observers: &[Arc<dyn DiscoveryObserver>]) {
        if !self.primes.push(prime) {
            warn!(prime, "out-of-order prime rejected");
            return;
        }
        {
            let now = Utc::now();
            let mut last = self.last_discovery.write();
            *last = Some(match *last {
                Some(prev) if prev > now => prev,
                _ => now,
            });
        }
        self.progress.found.fetch_add(1, Ordering::Relaxed);
        for observer in observers {
            observer.on_prime(prime);
        }
    }
}

/// Join point for a calculation started with [`PrimeCalculator::start`].
pub struct CalculationHandle {
    inner: thread::JoinHandle<Result<RunSummary>>,
    calculator: Arc<PrimeCalculator>,
}

impl CalculationHandle {
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Wait for the loop to exit.
    pub fn join(self) -> Result<RunSummary> {
        self.inner
            .join()
            .map_err(|_| CalculatorError::ThreadPanicked)?
    }

    /// Request termination and wait for the loop to exit.
    pub fn stop_and_join(self) -> Result<RunSummary> {
        self.calculator.stop();
        self.join()
    }
}
