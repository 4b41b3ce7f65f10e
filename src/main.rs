// Entrypoint for the CLI application.
// - Keeps `main` small: parse flags, set up logging and the interrupt
//   flag, load the config, and hand everything to the UI flow.
// - Returns `anyhow::Result` so a config failure exits non-zero with a
//   readable report.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use promptlab_cli::{cli::CliArgs, config::Config, ui};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&args.log).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // SIGINT flips a flag instead of killing the process; the
    // conversation loop checks it and still saves the transcript.
    let interrupted = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&interrupted))
        .context("could not install the SIGINT handler")?;

    let config = Config::load(&args.config)?;
    info!("configuration loaded from {}", args.config.display());

    ui::run(&config, &args.output, &interrupted)
}
