//! snapbooth - share-code service for photo booth media sessions.
//!
//! This is the main entry point for the snapbooth CLI. It provides commands for:
//!
//! - Running the HTTP API with its background sweeper (`snapbooth serve`)
//! - Evicting expired sessions once (`snapbooth sweep`)
//! - Inspecting store counters (`snapbooth stats`)
//!
//! See `snapbooth --help` for full usage information.

#![allow(clippy::redundant_pub_crate)]

// Use mimalloc for better multi-core performance (especially important for musl builds)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use snapbooth::daemon::config::Config;
use snapbooth::daemon::logging::init_logging;

mod commands;

const AFTER_HELP: &str = "\
EXAMPLES:
  snapbooth serve                         Serve on the configured port (default 8080)
  snapbooth serve --port 9000             Override the port
  snapbooth sweep                         Evict expired sessions now
  snapbooth stats --json                  Counters as JSON

CONFIGURATION:
  ~/.snapbooth/config.toml                Server, storage, sweeper and logging settings
  SNAPBOOTH_API_KEY                       Protects maintenance and coupon admin routes
  HOST                                    Overrides server.host";

#[derive(Parser)]
#[command(name = "snapbooth")]
#[command(version)]
#[command(about = "Share codes for photo booth media sessions")]
#[command(after_help = AFTER_HELP)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose/debug output for any command
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and the expiry sweeper
    ///
    /// Stops gracefully on Ctrl+C or SIGTERM.
    Serve {
        /// Port for the HTTP server (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Path to config.toml (default: ~/.snapbooth/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Delete every expired session once and exit
    Sweep {
        /// Path to config.toml (default: ~/.snapbooth/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show session counts by status and the number of coupons
    Stats {
        /// Path to config.toml (default: ~/.snapbooth/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output as JSON for scripting and automation
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    fn config_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Serve { config, .. } | Self::Sweep { config } | Self::Stats { config, .. } => {
                config.as_ref()
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.command.config_path().map(PathBuf::as_path))?;
    init_logging(&config.log_config(cli.verbose));

    tracing::debug!(
        port = config.server.port,
        sweeper = config.sweeper.enabled,
        "Loaded configuration"
    );

    match cli.command {
        Commands::Serve { port, .. } => {
            commands::serve::execute(config, port).await?;
        },
        Commands::Sweep { .. } => {
            commands::sweep::execute(&config).await?;
        },
        Commands::Stats { json, .. } => {
            commands::stats::execute(&config, json).await?;
        },
    }

    Ok(())
}
