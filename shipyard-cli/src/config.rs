//! Configuration module
//!
//! Handles CLI configuration shared by all commands.

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the pub/sub endpoint (e.g., "redis://localhost:6379")
    pub redis_url: String,
}
