//! Shipyard Builder
//!
//! Clones a repository, builds it and uploads the static output to an
//! object store, streaming progress to the project's log channel.
//!
//! Architecture:
//! - Configuration: Loaded once from the environment (and `.env`)
//! - Repositories: Pub/sub channel (Redis) and object store (S3)
//! - Services: One per pipeline stage, plus the log publisher
//! - Executor: Sequences the stages of a single run
//!
//! One process performs exactly one run. The exit status is 0 whatever the
//! outcome unless SHIPYARD_STRICT_EXIT is set; subscribers learn the outcome
//! from the log channel.

mod config;
mod error;
mod executor;
mod process;
mod repository;
mod service;

#[cfg(test)]
mod testing;

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::executor::{PipelineExecutor, prepare};
use crate::process::SystemCommandRunner;
use crate::repository::{RedisEventChannel, S3ObjectStore};
use crate::service::LogPublisher;

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shipyard_builder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Shipyard builder");
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let Some((config, publisher)) = prepare(
        |key| std::env::var(key).ok(),
        |project_id, redis_url| async move { connect_publisher(&project_id, &redis_url).await },
    )
    .await
    else {
        exit(strict_exit_requested(), false);
    };

    info!(
        "Loaded configuration: project_id={}, repository_url={}, workspace={}",
        config.project_id,
        config.repository_url,
        config.workspace_dir.display()
    );

    if publisher.has_remote() {
        info!("Streaming logs to channel logs:{}", config.project_id);
    }
    let store = S3ObjectStore::new(&config.storage).await;
    let strict_exit = config.strict_exit;

    let executor = PipelineExecutor::new(
        config,
        publisher,
        Arc::new(SystemCommandRunner::new()),
        Arc::new(store),
    );

    let outcome = executor.run().await;
    info!("Run finished in state {}", outcome.state());

    exit(strict_exit, outcome.is_success());
}

/// Connects the log publisher, falling back to console-only delivery
async fn connect_publisher(project_id: &str, redis_url: &str) -> LogPublisher {
    match RedisEventChannel::connect(redis_url).await {
        Ok(channel) => LogPublisher::new(project_id, Box::new(channel)),
        Err(e) => {
            warn!(
                "Remote log delivery disabled, continuing with console only: {:#}",
                e
            );
            LogPublisher::console_only(project_id)
        }
    }
}

fn strict_exit_requested() -> bool {
    std::env::var("SHIPYARD_STRICT_EXIT")
        .map(|v| config::is_truthy(&v))
        .unwrap_or(false)
}

fn exit(strict: bool, success: bool) -> ! {
    let code = if strict && !success { 1 } else { 0 };
    std::process::exit(code)
}
