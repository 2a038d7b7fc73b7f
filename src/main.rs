use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use flowq_sim::Algorithm;
use flowq_sim::sim::{Config, Simulator};

/// Simulate flow-isolating schedulers on one constant-rate bottleneck.
///
/// Reads a JSON config (from --config or stdin), prints the effective config,
/// runs the simulation and prints per-flow results, both as JSON on stdout.
#[derive(Parser, Debug)]
#[command(name = "flowq-sim", version, about)]
struct Cli {
    /// JSON config file. Read from stdin when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the scheduler (lfq or cnq).
    #[arg(short, long)]
    algorithm: Option<Algorithm>,

    /// Override the random seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Remove from the bulk queue by swapping in the tail (LFQ only).
    #[arg(long, default_value_t = false)]
    quick_pull: bool,

    /// Log level used when RUST_LOG is not set.
    #[arg(short = 'l', long, default_value = "warn")]
    log_level: String,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to encode JSON")?;
    println!("{json}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open config {}", path.display()))?;
            Config::from_reader(BufReader::new(file))
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => Config::from_reader(io::stdin().lock()).context("invalid config on stdin")?,
    };

    if let Some(algorithm) = cli.algorithm {
        config.algorithm = algorithm;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    config.quick_pull |= cli.quick_pull;

    print_json(&config)?;

    let results = Simulator::new(config)
        .run()
        .context("simulation rejected a generated packet")?;

    tracing::info!(
        bytes_sent = results.total_bytes_sent(),
        drops = results.total_drops(),
        "done"
    );
    print_json(&results)
}
