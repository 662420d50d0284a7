//! Entry point for padsmash.
//!
//! This file handles high-level application flow:
//! 1. Parse command-line arguments using `clap`.
//! 2. Initialize logging.
//! 3. Run the smasher over the target image and its map file.
//!
//! Error handling is done via `anyhow`.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use padsmash::app;
use padsmash::config::Config;

fn main() -> Result<()> {
    let config = Config::parse();

    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let outcome = app::run(&config).with_context(|| format!("failed to smash {}", config.file.display()))?;

    match outcome.output {
        Some(path) => println!("Smashed {} to {}", config.file.display(), path.display()),
        None => println!("Dry run: {}", outcome.report),
    }
    Ok(())
}
