//! Quill CLI application
//!
//! Applies unified diffs proposed by a language model to a LaTeX project and
//! keeps a checkpoint history so every change can be inspected or undone.
//!
//! ```bash
//! quill apply response.md          # extract, validate, checkpoint, apply
//! quill checkpoint list            # newest first
//! quill diff 3f2a9c1d              # what changed since that checkpoint
//! quill revert 3f2a9c1d --backup   # undo, keeping the current state too
//! ```

mod args;
mod commands;
mod console;
mod router;

use clap::Parser;
use quill_core::config::{DEFAULT_CONFIG_FILE, LogFormat, LoggingConfig, load_config};
use tracing_subscriber::EnvFilter;

use args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.project.join(DEFAULT_CONFIG_FILE));
    let config = load_config(&config_path)?;

    init_logging(&config.logging, cli.verbose);
    tracing::debug!(config = %config_path.display(), "Configuration loaded");

    router::route(cli, config).await
}

/// Install the global subscriber; `RUST_LOG` overrides the configured level
fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }
}
