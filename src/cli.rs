//! # CLI Execution Functions
//!
//! Subcommand bodies, kept out of `main.rs` so the entry point stays slim.

use anyhow::{Context, Result};
use prime_calculator::{trial_division, CalculatorConfig, Primality, PrimeCalculator, RunSummary};
use serde::Serialize;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

use super::{Cli, Commands, OutputFormat};

const WATCH_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Serialize)]
struct RunOutput<'a> {
    summary: &'a RunSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    primes: Option<Vec<u64>>,
}

/// Run the calculator in the background and stop it from this thread once a
/// limit is reached or a shutdown signal arrives.
pub fn run_calculation(cli: &Cli) -> Result<()> {
    let Commands::Run {
        max_primes,
        max_candidate,
        duration_secs,
        report_interval_secs,
        separator,
        print_primes,
        format,
    } = &cli.command
    else {
        unreachable!()
    };

    let config = CalculatorConfig {
        max_primes: *max_primes,
        max_candidate: *max_candidate,
        report_interval: Some(Duration::from_secs(*report_interval_secs)),
    };
    info!(
        max_primes = ?config.max_primes,
        max_candidate = ?config.max_candidate,
        duration_secs = ?duration_secs,
        "prime-calculator starting"
    );

    let calculator = PrimeCalculator::with_config(config);
    install_shutdown_handler(Arc::clone(&calculator))?;
    let handle = calculator
        .start()
        .context("failed to start calculation")?;

    let deadline = duration_secs.map(|secs| Instant::now() + Duration::from_secs(secs));
    while !handle.is_finished() {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            info!("duration limit reached");
            break;
        }
        thread::sleep(WATCH_INTERVAL);
    }
    let summary = handle.stop_and_join().context("calculation failed")?;

    match format {
        OutputFormat::Json => {
            let output = RunOutput {
                summary: &summary,
                primes: print_primes.then(|| calculator.primes()),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            if *print_primes {
                println!("{}", calculator.primes_string_with(separator));
            }
            match summary.latest_prime {
                Some(latest) => println!(
                    "Found {} primes (latest {}) in {:.2}s",
                    summary.found, latest, summary.elapsed_secs
                ),
                None => println!("Found no primes in {:.2}s", summary.elapsed_secs),
            }
        }
    }
    Ok(())
}

/// SIGINT/SIGTERM handler: stops the calculator so the watch loop in
/// `run_calculation` sees the thread finish and prints the summary.
///
/// Signal streams are registered on this thread before returning, so a
/// signal delivered after the run starts is never lost to the default action.
fn install_shutdown_handler(calculator: Arc<PrimeCalculator>) -> Result<()> {
    let sig_rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("signal handler runtime")?;

    #[cfg(unix)]
    let (mut sigint, mut sigterm) = {
        use tokio::signal::unix::{signal, SignalKind};
        let _guard = sig_rt.enter();
        (
            signal(SignalKind::interrupt()).context("SIGINT handler")?,
            signal(SignalKind::terminate()).context("SIGTERM handler")?,
        )
    };

    thread::Builder::new()
        .name("shutdown-signal".to_string())
        .spawn(move || {
            sig_rt.block_on(async {
                #[cfg(unix)]
                {
                    tokio::select! {
                        _ = sigint.recv() => {},
                        _ = sigterm.recv() => {},
                    }
                }
                #[cfg(not(unix))]
                {
                    let _ = tokio::signal::ctrl_c().await;
                }
                info!("shutdown signal received");
                calculator.stop();
            });
        })
        .context("failed to spawn signal handler thread")?;
    Ok(())
}

pub fn run_check(n: u64) -> Result<()> {
    match trial_division(n, || false) {
        Primality::Prime => println!("{} is prime", n),
        Primality::Composite { divisor } => println!(
            "{} is composite (largest proper divisor {})",
            n, divisor
        ),
        Primality::BelowTwo | Primality::Interrupted => println!("{} is not prime", n),
    }
    Ok(())
}
