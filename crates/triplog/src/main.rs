//! Triplog CLI - AI-assisted receipt and odometer extraction for trip tracking.
//!
//! Reads photos of expense receipts and vehicle odometers and emits the
//! extracted fields as JSON, ready to be stored alongside a trip.
//!
//! # Usage
//!
//! ```bash
//! # Extract a single receipt
//! triplog extract receipt ./receipts/hotel.jpg
//!
//! # Extract every odometer photo in a directory
//! triplog extract odometer ./odometer/ --format jsonl --output readings.jsonl
//!
//! # View configuration
//! triplog config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Triplog - AI-assisted receipt and odometer extraction.
#[derive(Parser, Debug)]
#[command(name = "triplog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract structured data from receipt or odometer photos
    Extract(cli::extract::ExtractArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match triplog_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `triplog config path`."
            );
            triplog_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Triplog v{}", triplog_core::VERSION);

    match cli.command {
        Commands::Extract(args) => cli::extract::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
