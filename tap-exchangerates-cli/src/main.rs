//! tap-exchangerates CLI — replicate daily exchange rates as a message stream.
//!
//! Usage:
//! - `tap-exchangerates --config config.json` — sync from the configured start date
//! - `tap-exchangerates --config config.json --state state.json` — resume from a checkpoint
//!
//! Messages go to stdout, logs to stderr (`RUST_LOG` controls the filter).
//! Exit status is 0 on success, -1 when a request fails for good (after the
//! checkpoint is flushed), and 1 for anything else.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tap_exchangerates_core::{
    resolve_start_date, sync, ApilayerProvider, Checkpoint, JsonLinesSink, SystemClock,
    TapConfig, TapError,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tap-exchangerates",
    version,
    about = "Replicate daily exchange rates from apilayer as SCHEMA/RECORD/STATE messages"
)]
struct Cli {
    /// Config file (JSON, or TOML with a .toml extension).
    #[arg(short, long)]
    config: PathBuf,

    /// State file from a previous run; its start_date overrides the config.
    #[arg(short, long)]
    state: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => Ok(()),
        Err(err) => {
            if let Some(tap_err) = err.downcast_ref::<TapError>() {
                if tap_err.is_fatal_http() {
                    // Already logged with url/status/body and the checkpoint is flushed.
                    std::process::exit(-1);
                }
            }
            error!(error = %format!("{err:#}"), "critical: tap failed");
            Err(err)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    info!("sync starting with exchange rates api");

    let config = TapConfig::from_file(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;

    let state = match &cli.state {
        Some(path) => Checkpoint::from_file(path)
            .with_context(|| format!("loading state {}", path.display()))?,
        None => None,
    };
    let start = resolve_start_date(&config, state.as_ref())?;

    let provider = ApilayerProvider::new(config.apikey.clone())?;
    let mut sink = JsonLinesSink::new(std::io::stdout().lock());

    let summary = sync(&config, start, &provider, &mut sink, &SystemClock)?;

    info!(
        dates = summary.dates_processed,
        records = summary.records_emitted,
        schemas = summary.schemas_emitted,
        skipped = summary.mismatched_payloads,
        "sync completed"
    );
    Ok(())
}
