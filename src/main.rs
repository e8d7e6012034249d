//! Config keeper
//!
//! A sidecar-style supervisor that renders a child's configuration from a
//! mounted source file and keeps exactly one child running on it.
//!
//! # Architecture Overview
//!
//! ```text
//!   mounted source ──▶ watch ──(reload, capacity 1)──▶ orchestrator
//!   (symlink swaps)    notify + poll + sha256              │
//!                                                          ▼
//!                                     render: YAML source + template
//!                                                          │
//!                                                          ▼
//!                                     process: start / restart ──▶ child
//!
//!   lifecycle: SIGTERM/SIGINT → shutdown broadcast → orchestrator
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use config_keeper::lifecycle::{signals, startup, Shutdown};
use config_keeper::Keeper;

#[derive(Debug, Parser)]
#[command(name = "config-keeper", version, about = "Render a child's config and keep it running")]
struct Cli {
    /// Optional TOML settings file.
    #[arg(long, env = "KEEPER_SETTINGS")]
    settings: Option<PathBuf>,

    /// Arguments passed through to the child process.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    child_args: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    startup::init_logging();
    tracing::info!("config-keeper v{} starting", env!("CARGO_PKG_VERSION"));

    let settings = match startup::bootstrap(cli.settings.as_deref(), cli.child_args) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load settings");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    if let Err(e) = signals::install(shutdown.clone()) {
        tracing::error!(error = %e, "Failed to install signal handlers");
        return ExitCode::FAILURE;
    }

    match Keeper::new(settings).run(shutdown_rx).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Keeper failed");
            ExitCode::FAILURE
        }
    }
}
