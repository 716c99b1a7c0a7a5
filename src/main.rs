//! # Main — CLI Entry Point
//!
//! Parses arguments, initialises logging, and hands off to `cli.rs`.
//!
//! ## Subcommands
//!
//! - `run`: start the background calculator and stop it on a prime-count,
//!   candidate, or wall-clock limit, or on SIGINT/SIGTERM. Every exit path
//!   joins the calculation thread and prints the summary.
//! - `check`: test a single number with the same trial-division scan.
//!
//! ## Environment
//!
//! - `LOG_FORMAT=json` switches to JSON log lines.
//! - `RUST_LOG` filters log output (default `info`).
//! - `.env` is loaded if present.

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "prime-calculator",
    about = "Continuously calculate prime numbers in the background"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate primes upward from 2 until a limit is reached
    Run {
        /// Stop after this many primes have been found
        #[arg(long, env = "PRIME_MAX_PRIMES")]
        max_primes: Option<u64>,
        /// Stop after testing this candidate
        #[arg(long, env = "PRIME_MAX_CANDIDATE")]
        max_candidate: Option<u64>,
        /// Stop after this many seconds of wall-clock time
        #[arg(long, env = "PRIME_DURATION_SECS")]
        duration_secs: Option<u64>,
        /// Seconds between progress log lines (0 disables)
        #[arg(long, default_value_t = 30)]
        report_interval_secs: u64,
        /// Separator used when printing the primes
        #[arg(long, default_value = ", ")]
        separator: String,
        /// Print every prime found, not just the summary
        #[arg(long)]
        print_primes: bool,
        /// Output format for the final result
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Test whether a single number is prime
    Check {
        /// The number to test
        n: u64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();

    match &cli.command {
        Commands::Run { .. } => cli::run_calculation(&cli),
        Commands::Check { n } => cli::run_check(*n),
    }
}
