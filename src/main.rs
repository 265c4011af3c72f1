//! DubForge CLI
//!
//! Fits videos under a dubbing service's upload ceiling with a two-pass
//! encode, submits them for dubbing and retrieves the results.
//!
//! # Usage
//!
//! ```bash
//! dubforge probe --input talk.mp4
//! dubforge dub --input talk.mp4 --target-lang es --wait --output talk.es.mp4
//! dubforge status --id 21m00Tcm4TlvDq8ikWAM
//! dubforge download --id 21m00Tcm4TlvDq8ikWAM --lang es --output out/talk.es.mp4
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dubforge_cli::adapters::{init_logging, TokioProcessAdapter};
use dubforge_cli::cli::commands::{self, CommandContext};
use dubforge_cli::cli::Cli;
use dubforge_cli::config_initialization::initialize_configuration_hierarchy;

/// Main entry point for the DubForge CLI application
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = initialize_configuration_hierarchy(cli.config.as_deref(), &cli.overrides())
        .context("Failed to load configuration")?;
    init_logging(&settings.logging).context("Failed to initialize logging")?;

    match &settings.source {
        Some(path) => info!("Loaded settings from {}", path.display()),
        None => debug!("No settings file found, using defaults"),
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            interrupt.cancel();
        }
    });

    let ctx = CommandContext::new(settings, Arc::new(TokioProcessAdapter::new()), cancel);
    commands::run(&ctx, cli.command).await
}
