//! qdict CLI - build trace graphs, run the partitioner, decode the results.
//!
//! Usage:
//!   qdict <config.json>               # Run both pipeline stages
//!
//! Logging verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::process;

use clap::Parser;
use qdict::config::Config;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qdict")]
#[command(version)]
#[command(about = "Trace Dictionary Creator")]
#[command(
    long_about = "Builds weighted co-access graphs from query-trace logs, feeds them to an \
                  external METIS partitioner, and decodes the partition assignment into a \
                  lookup table and a re-indexed dictionary"
)]
struct Cli {
    /// JSON run configuration
    #[arg(value_name = "CONFIG")]
    config: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config '{}': {e}", cli.config.display());
            process::exit(1);
        }
    };

    if let Err(e) = qdict::pipeline::run(&cfg) {
        eprintln!("Pipeline failed: {e}");
        process::exit(1);
    }
}
