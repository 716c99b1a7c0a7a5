//! # Progress — Atomic Calculation Counters
//!
//! Lock-free counters shared between the calculation loop and the background
//! status reporter. The loop is the only writer; the reporter and any query
//! caller read with relaxed loads since the values are purely observational.
//!
//! ## Background Reporter
//!
//! `start_reporter` spawns a thread that logs tested/found/rate/current every
//! `interval`. It sleeps in short slices so `stop()` is observed promptly
//! instead of after a full interval.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

const SLEEP_SLICE: Duration = Duration::from_millis(50);

pub struct Progress {
    pub tested: AtomicU64,
    pub found: AtomicU64,
    /// Candidate currently under test.
    pub current: AtomicU64,
    start: Mutex<Instant>,
    shutdown: AtomicBool,
}

impl Progress {
    pub fn new() -> Arc<Self> {
        Arc::new(Progress {
            tested: AtomicU64::new(0),
            found: AtomicU64::new(0),
            current: AtomicU64::new(0),
            start: Mutex::new(Instant::now()),
            shutdown: AtomicBool::new(false),
        })
    }

    pub fn start_reporter(self: &Arc<Self>, interval: Duration) -> thread::JoinHandle<()> {
        let progress = Arc::clone(self);
        thread::spawn(move || {
            let mut next = Instant::now() + interval;
            while !progress.is_stopped() {
                thread::sleep(SLEEP_SLICE.min(interval));
                if Instant::now() >= next {
                    progress.print_status();
                    next += interval;
                }
            }
        })
    }

    /// Restart the clock used for `elapsed` and `rate`. Called when a run begins.
    pub fn reset_clock(&self) {
        *self.start.lock() = Instant::now();
    }

    pub fn elapsed(&self) -> Duration {
        self.start.lock().elapsed()
    }

    /// Candidates tested per second since the clock started; 0.0 in the first second.
    pub fn rate(&self) -> f64 {
        let elapsed = self.elapsed();
        if elapsed.as_secs() > 0 {
            self.tested.load(Ordering::Relaxed) as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn print_status(&self) {
        let elapsed = self.elapsed();
        let h = elapsed.as_secs() / 3600;
        let m = (elapsed.as_secs() % 3600) / 60;
        let s = elapsed.as_secs() % 60;
        info!(
            current = self.current.load(Ordering::Relaxed),
            tested = self.tested.load(Ordering::Relaxed),
            rate = format_args!("{:.2}", self.rate()),
            found = self.found.load(Ordering::Relaxed),
            elapsed = format_args!("{:02}:{:02}:{:02}", h, m, s),
            "calculation progress"
        );
    }

    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    fn is_stopped(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    //! Tests for the atomic progress counters and background reporter.
    //!
    //! Counters are written by the calculation loop only, but the tests
    //! hammer them from several threads to confirm no increment is lost.
    //! Reporter tests use short intervals or an immediate stop so none of
    //! them waits out a real reporting period.

    use super::*;

    // ── Initialization ──────────────────────────────────────────────

    #[test]
    fn counters_start_at_zero() {
        let p = Progress::new();
        assert_eq!(p.tested.load(Ordering::Relaxed), 0);
        assert_eq!(p.found.load(Ordering::Relaxed), 0);
        assert_eq!(p.current.load(Ordering::Relaxed), 0);
    }

    // ── Concurrent Increment Correctness ────────────────────────────

    /// 8 threads x 1000 relaxed increments must total exactly 8000.
    #[test]
    fn concurrent_increments_are_accurate() {
        let p = Progress::new();
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let p = Arc::clone(&p);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        p.tested.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(p.tested.load(Ordering::Relaxed), 8000);
    }

    // ── Clock and Rate ──────────────────────────────────────────────

    /// Rate must not divide by zero right after creation.
    #[test]
    fn rate_is_zero_before_first_second() {
        let p = Progress::new();
        p.tested.fetch_add(100, Ordering::Relaxed);
        assert_eq!(p.rate(), 0.0);
        p.print_status();
    }

    /// Resetting the clock discards time spent before the run began.
    #[test]
    fn reset_clock_restarts_elapsed() {
        let p = Progress::new();
        thread::sleep(Duration::from_millis(200));
        assert!(p.elapsed() >= Duration::from_millis(200));
        p.reset_clock();
        assert!(p.elapsed() < Duration::from_millis(200));
    }

    // ── Shutdown ────────────────────────────────────────────────────

    #[test]
    fn multiple_stops_are_idempotent() {
        let p = Progress::new();
        p.stop();
        p.stop();
        assert!(p.is_stopped());
    }

    /// The reporter sleeps in slices, so it exits well before a long
    /// interval elapses.
    #[test]
    fn reporter_exits_promptly_on_stop() {
        let p = Progress::new();
        let handle = p.start_reporter(Duration::from_secs(3600));
        thread::sleep(Duration::from_millis(20));
        let stopped_at = Instant::now();
        p.stop();
        handle.join().unwrap();
        assert!(stopped_at.elapsed() < Duration::from_secs(5));
    }

    /// A short interval makes the reporter log several times before stop.
    #[test]
    fn reporter_logs_on_short_interval() {
        let p = Progress::new();
        let handle = p.start_reporter(Duration::from_millis(10));
        thread::sleep(Duration::from_millis(60));
        p.stop();
        handle.join().unwrap();
    }
}
