//! Shipyard CLI
//!
//! Command-line tools for watching Shipyard build runs.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "shipyard")]
#[command(about = "Shipyard build pipeline CLI", long_about = None)]
struct Cli {
    /// Pub/sub endpoint carrying build logs
    #[arg(long, env = "REDIS_URL", default_value = "redis://localhost:6379")]
    redis_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        redis_url: cli.redis_url,
    };

    handle_command(cli.command, &config).await
}
