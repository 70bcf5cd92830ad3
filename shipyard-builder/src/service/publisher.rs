//! Log publisher service
//!
//! Every message is written to the console right away and queued for the
//! project's pub/sub channel. A single background task drains the queue, so
//! events reach the channel in publish order. Publishing never fails: remote
//! errors are logged locally and dropped.
//!
//! Closing waits a bounded time for queued events; whatever is still pending
//! after that is dropped so the process can exit.

use shipyard_core::domain::log::{LogEvent, channel_for};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::repository::EventChannel;

/// How long `close` waits for queued events to be delivered
const CLOSE_GRACE: Duration = Duration::from_secs(3);

/// Project-scoped log publisher
pub struct LogPublisher {
    project_id: String,
    remote: Option<RemoteDelivery>,
}

struct RemoteDelivery {
    sender: mpsc::UnboundedSender<LogEvent>,
    drainer: JoinHandle<()>,
    /// Events queued but not yet handed to the channel
    pending: Arc<AtomicUsize>,
    close_grace: Duration,
}

impl LogPublisher {
    /// Creates a publisher that also streams events to `channel`
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(project_id: impl Into<String>, channel: Box<dyn EventChannel>) -> Self {
        let project_id = project_id.into();
        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let drainer = tokio::spawn(drain(
            channel_for(&project_id),
            receiver,
            channel,
            Arc::clone(&pending),
        ));

        Self {
            project_id,
            remote: Some(RemoteDelivery {
                sender,
                drainer,
                pending,
                close_grace: CLOSE_GRACE,
            }),
        }
    }

    /// Overrides how long `close` waits for queued events
    pub fn with_close_grace(mut self, grace: Duration) -> Self {
        if let Some(remote) = &mut self.remote {
            remote.close_grace = grace;
        }
        self
    }

    /// Creates a publisher that only writes to the console
    ///
    /// Used when the pub/sub backend is unreachable at startup.
    pub fn console_only(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            remote: None,
        }
    }

    /// Whether events are delivered beyond the console
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Publishes a progress message
    pub fn publish(&self, message: impl Into<String>) {
        let message = message.into();
        info!(project_id = %self.project_id, "{}", message);
        self.enqueue(message);
    }

    /// Publishes a failure message
    ///
    /// Same event as [`publish`](Self::publish); only the console level differs.
    pub fn publish_error(&self, message: impl Into<String>) {
        let message = message.into();
        error!(project_id = %self.project_id, "{}", message);
        self.enqueue(message);
    }

    fn enqueue(&self, message: String) {
        let Some(remote) = &self.remote else {
            return;
        };

        remote.pending.fetch_add(1, Ordering::SeqCst);
        if remote
            .sender
            .send(LogEvent::new(self.project_id.clone(), message))
            .is_err()
        {
            remote.pending.fetch_sub(1, Ordering::SeqCst);
            debug!("Log drainer has stopped, dropping event");
        }
    }

    /// Stops accepting events and releases the connection
    ///
    /// Events queued before the call are delivered if the channel keeps up
    /// within the close grace period; the rest are dropped.
    pub async fn close(self) {
        let Some(RemoteDelivery {
            sender,
            mut drainer,
            pending,
            close_grace,
        }) = self.remote
        else {
            return;
        };

        drop(sender);

        match tokio::time::timeout(close_grace, &mut drainer).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Log drainer task failed: {}", e),
            Err(_) => {
                drainer.abort();
                warn!(
                    "Log channel did not drain within {:?}, dropped {} event(s)",
                    close_grace,
                    pending.load(Ordering::SeqCst)
                );
            }
        }

        debug!("Log publisher closed for project {}", self.project_id);
    }
}

/// Forwards queued events to the remote channel until the sender is dropped
async fn drain(
    channel_name: String,
    mut receiver: mpsc::UnboundedReceiver<LogEvent>,
    channel: Box<dyn EventChannel>,
    pending: Arc<AtomicUsize>,
) {
    while let Some(event) = receiver.recv().await {
        match event.to_json() {
            Ok(payload) => {
                if let Err(e) = channel.publish(&channel_name, &payload).await {
                    warn!("{}", e);
                }
            }
            Err(e) => warn!("Failed to serialize log event: {}", e),
        }
        pending.fetch_sub(1, Ordering::SeqCst);
    }
}
