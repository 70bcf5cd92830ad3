//! Log event types
//!
//! A [`LogEvent`] is published on the `logs:{projectId}` channel for every
//! observable pipeline step. Two payload shapes exist in the wild: the full
//! `{log, projectId, timestamp}` object and the bare `{log}` object. Both
//! decode into the same type.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Prefix of every pub/sub channel carrying build logs
pub const CHANNEL_PREFIX: &str = "logs:";

/// Message of the terminal event of a successful run
pub const RUN_SUCCEEDED_MESSAGE: &str = "Process completed successfully";

/// Prefix of the terminal event of a failed run
pub const RUN_FAILED_PREFIX: &str = "Error: ";

/// Returns the pub/sub channel name for a project
pub fn channel_for(project_id: &str) -> String {
    format!("{}{}", CHANNEL_PREFIX, project_id)
}

/// A single log line streamed to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    #[serde(rename = "log", alias = "message")]
    pub message: String,

    #[serde(
        rename = "projectId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub project_id: Option<String>,

    #[serde(default, with = "iso_millis", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl LogEvent {
    /// Creates a project-scoped event stamped with the current time
    pub fn new(project_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            project_id: Some(project_id.into()),
            timestamp: Some(Utc::now()),
        }
    }

    /// Encodes the event as the JSON payload sent over pub/sub
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decodes a pub/sub payload
    pub fn from_json(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }

    /// Whether this event marks the end of a run
    pub fn is_terminal(&self) -> bool {
        self.message == RUN_SUCCEEDED_MESSAGE || self.is_failure()
    }

    /// Whether this event reports a run failure
    pub fn is_failure(&self) -> bool {
        self.message.starts_with(RUN_FAILED_PREFIX)
    }
}

/// ISO-8601 timestamps with millisecond precision, `Z` suffix
mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&super::format_timestamp(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<DateTime<Utc>>::deserialize(deserializer)
    }
}

/// Formats a timestamp the way it appears on the wire
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
