//! Log command handler
//!
//! Subscribes to a project's log channel and prints events as they arrive.
//! Both payload shapes (`{log}` and `{log, projectId, timestamp}`) are shown.

use anyhow::{Context, Result};
use colored::*;
use futures_util::StreamExt;
use shipyard_core::domain::log::{LogEvent, channel_for};

use crate::config::Config;

/// Follow the log channel of a project
///
/// # Arguments
/// * `config` - The CLI configuration
/// * `project_id` - Project whose channel to subscribe to
/// * `until_done` - Stop after the terminal event of a run
pub async fn follow_logs(config: &Config, project_id: &str, until_done: bool) -> Result<()> {
    let client = redis::Client::open(config.redis_url.as_str()).context("Invalid Redis URL")?;
    let mut pubsub = client
        .get_async_pubsub()
        .await
        .context("Failed to connect to Redis")?;

    let channel = channel_for(project_id);
    pubsub
        .subscribe(&channel)
        .await
        .with_context(|| format!("Failed to subscribe to {}", channel))?;

    println!("{}", format!("Listening on {}", channel).bold());
    println!("{}", "─".repeat(80).dimmed());

    let mut messages = pubsub.on_message();
    while let Some(msg) = messages.next().await {
        let payload: String = match msg.get_payload() {
            Ok(payload) => payload,
            Err(e) => {
                eprintln!("{}", format!("⚠ Unreadable message: {}", e).yellow());
                continue;
            }
        };

        match LogEvent::from_json(&payload) {
            Ok(event) => {
                println!("{}", format_event(&event));
                if until_done && event.is_terminal() {
                    break;
                }
            }
            Err(e) => {
                eprintln!("{}", format!("⚠ Skipping malformed event: {}", e).yellow());
            }
        }
    }

    Ok(())
}

/// Render a log event as one line
fn format_event(event: &LogEvent) -> String {
    let message = if event.message.starts_with("Error") {
        event.message.red()
    } else if event.message.starts_with("Uploaded") || event.is_terminal() {
        event.message.green()
    } else {
        event.message.normal()
    };

    match &event.timestamp {
        Some(ts) => format!(
            "{} {}",
            ts.format("%H:%M:%S").to_string().dimmed(),
            message
        ),
        None => message.to_string(),
    }
}
