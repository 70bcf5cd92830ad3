//! In-memory fakes for the external collaborators

use async_trait::async_trait;
use shipyard_core::domain::log::LogEvent;
use std::collections::HashSet;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{PublishError, UploadError};
use crate::process::{CommandOutput, CommandRunner, CommandSpec};
use crate::repository::{EventChannel, ObjectStore};

/// Records every published payload
#[derive(Clone, Default)]
pub struct RecordingChannel {
    published: Arc<Mutex<Vec<(String, String)>>>,
    attempts: Arc<AtomicUsize>,
    fail: bool,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel that rejects every publish
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.published()
            .iter()
            .map(|(_, payload)| LogEvent::from_json(payload).unwrap())
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.message).collect()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventChannel for RecordingChannel {
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), PublishError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PublishError {
                channel: channel.to_string(),
                message: "connection reset".to_string(),
            });
        }
        self.published
            .lock()
            .unwrap()
            .push((channel.to_string(), payload.to_string()));
        Ok(())
    }
}

/// A channel whose publishes never complete
#[derive(Clone, Default)]
pub struct StalledChannel {
    attempts: Arc<AtomicUsize>,
}

impl StalledChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventChannel for StalledChannel {
    async fn publish(&self, _channel: &str, _payload: &str) -> Result<(), PublishError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

type Handler = dyn Fn(&CommandSpec) -> io::Result<CommandOutput> + Send + Sync;

/// Runs commands through a closure and records every invocation
#[derive(Clone)]
pub struct FakeCommandRunner {
    handler: Arc<Handler>,
    calls: Arc<Mutex<Vec<CommandSpec>>>,
}

impl FakeCommandRunner {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&CommandSpec) -> io::Result<CommandOutput> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every command succeeds with no output
    pub fn succeeding() -> Self {
        Self::new(|_| Ok(ok_output("", "")))
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Invoked commands rendered as strings
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.to_string()).collect()
    }
}

#[async_trait]
impl CommandRunner for FakeCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        self.calls.lock().unwrap().push(spec.clone());
        (self.handler)(spec)
    }
}

pub fn ok_output(stdout: &str, stderr: &str) -> CommandOutput {
    CommandOutput {
        exit_code: Some(0),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

pub fn failed_output(code: i32, stderr: &str) -> CommandOutput {
    CommandOutput {
        exit_code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

/// A recorded object upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Stores objects in memory, failing for selected file names
#[derive(Clone, Default)]
pub struct RecordingStore {
    stored: Arc<Mutex<Vec<StoredObject>>>,
    attempts: Arc<Mutex<Vec<String>>>,
    failing: Arc<HashSet<String>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads of these file names fail with a network error
    pub fn failing_for(names: &[&str]) -> Self {
        Self {
            failing: Arc::new(names.iter().map(|n| n.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn stored(&self) -> Vec<StoredObject> {
        self.stored.lock().unwrap().clone()
    }

    /// Keys of every attempted upload, successful or not
    pub fn attempted_keys(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), UploadError> {
        self.attempts.lock().unwrap().push(key.to_string());

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.failing.contains(&file_name) {
            return Err(UploadError::Store {
                key: key.to_string(),
                message: "network error".to_string(),
            });
        }

        let body = tokio::fs::read(path)
            .await
            .map_err(|source| UploadError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        self.stored.lock().unwrap().push(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type: content_type.to_string(),
            body,
        });
        Ok(())
    }
}
