//! # smart-horses
//!
//! Play Smart Horses in the terminal against the remote engine.
//!
//! ## Commands
//!
//! - `play`: Interactive game (your knight is black by default)
//! - `health`: Check the game server
//!
//! ## Example
//!
//! ```bash
//! # Play against the public server
//! smart-horses play --difficulty amateur
//!
//! # Play against a local server
//! smart-horses --server-url http://localhost:8000 play
//!
//! # Check the server
//! smart-horses health
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use smart_horses_types::Difficulty;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod render;

use commands::{health, play};
use config::ClientConfig;

/// Play Smart Horses against the remote engine.
#[derive(Parser, Debug)]
#[command(name = "smart-horses")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (default: smart-horses.toml in the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Game server base URL (overrides the config file)
    #[arg(long, global = true, env = "SMART_HORSES_URL")]
    server_url: Option<String>,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play an interactive game
    Play {
        /// Opponent strength: beginner, amateur or expert
        #[arg(long, short)]
        difficulty: Option<Difficulty>,
    },

    /// Check the game server
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = ClientConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(url) = cli.server_url {
        config.server.url = url;
    }
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Play { difficulty } => {
            let difficulty = difficulty.unwrap_or(config.game.difficulty);
            play::run(&config, difficulty).await?;
        }
        Commands::Health => {
            health::run(&config).await?;
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins unless `--verbose` is given.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
