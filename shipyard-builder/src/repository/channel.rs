//! Event channel repository
//!
//! Delivers serialized log events to the pub/sub backend. This is a thin
//! transport; queuing and error absorption live in the publisher service.

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::debug;

use crate::error::PublishError;

/// How long to wait for the initial pub/sub connection
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Repository trait for publishing to a named pub/sub channel
#[async_trait]
pub trait EventChannel: Send + Sync {
    /// Publishes one payload on a channel
    ///
    /// # Arguments
    /// * `channel` - Channel name (e.g., "logs:site-42")
    /// * `payload` - Serialized event
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), PublishError>;
}

/// Redis implementation of EventChannel
///
/// The connection manager reconnects on its own after transient failures.
/// Dropping the channel releases the connection.
pub struct RedisEventChannel {
    connection: ConnectionManager,
}

impl RedisEventChannel {
    /// Connects to Redis and verifies the connection
    ///
    /// # Arguments
    /// * `url` - Connection URL (e.g., "redis://localhost:6379")
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).context("Invalid Redis URL")?;

        let mut connection = tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client))
            .await
            .context("Timed out connecting to Redis")?
            .context("Failed to connect to Redis")?;

        redis::cmd("PING")
            .query_async::<String>(&mut connection)
            .await
            .context("Failed to ping Redis")?;

        debug!("Connected to Redis at {}", url);

        Ok(Self { connection })
    }
}

#[async_trait]
impl EventChannel for RedisEventChannel {
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), PublishError> {
        let mut connection = self.connection.clone();

        let receivers: i64 = connection
            .publish(channel, payload)
            .await
            .map_err(|e| PublishError {
                channel: channel.to_string(),
                message: e.to_string(),
            })?;

        debug!("Published to {} ({} receiver(s))", channel, receivers);
        Ok(())
    }
}
