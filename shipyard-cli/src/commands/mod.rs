//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod logs;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Stream the build logs of a project
    Logs {
        /// Project identifier
        project_id: String,

        /// Exit once the run reports success or failure
        #[arg(long)]
        until_done: bool,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Logs {
            project_id,
            until_done,
        } => logs::follow_logs(config, &project_id, until_done).await,
    }
}
