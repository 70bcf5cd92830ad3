//! Pipeline executor
//!
//! Runs one pipeline end to end: clone, inspect, build, locate, upload.
//! Stages run strictly in sequence and the first failure ends the run;
//! inside the upload stage, failed files do not. Every run ends with exactly
//! one terminal event, after which the publisher is closed.

use shipyard_core::domain::artifact::{UploadReport, key_prefix};
use shipyard_core::domain::log::{RUN_FAILED_PREFIX, RUN_SUCCEEDED_MESSAGE};
use shipyard_core::domain::pipeline::PipelineState;
use std::future::Future;
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use crate::config::{Config, ConfigError, DEFAULT_REDIS_URL};
use crate::error::PipelineError;
use crate::process::CommandRunner;
use crate::repository::ObjectStore;
use crate::service::{ArtifactUploader, BuildRunner, LogPublisher, RepositoryFetcher, locator};

/// How a run ended
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Built and uploaded; individual files may still have failed
    Deployed(UploadReport),
    /// The manifest declares no build command
    NothingToBuild,
    /// A stage failed and the run stopped there
    Failed {
        stage: PipelineState,
        error: PipelineError,
    },
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Terminal state of the run
    pub fn state(&self) -> PipelineState {
        match self {
            Self::Deployed(_) | Self::NothingToBuild => PipelineState::Done,
            Self::Failed { .. } => PipelineState::Failed,
        }
    }
}

/// Tracks the current stage of a run
struct StageTracker {
    state: PipelineState,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            state: PipelineState::Start,
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        debug!("Pipeline stage: {} -> {}", self.state, next);
        self.state = next;
    }
}

/// Runs a single pipeline
///
/// Owns the publisher for the duration of the run and closes it when the
/// run ends.
pub struct PipelineExecutor {
    config: Config,
    publisher: LogPublisher,
    fetcher: RepositoryFetcher,
    builder: BuildRunner,
    uploader: ArtifactUploader,
}

impl PipelineExecutor {
    /// Creates an executor
    ///
    /// # Arguments
    /// * `config` - Run configuration
    /// * `publisher` - Log publisher for the project
    /// * `runner` - Runs `git` and `npm`
    /// * `store` - Receives the built files
    pub fn new(
        config: Config,
        publisher: LogPublisher,
        runner: Arc<dyn CommandRunner>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            config,
            publisher,
            fetcher: RepositoryFetcher::new(Arc::clone(&runner)),
            builder: BuildRunner::new(runner),
            uploader: ArtifactUploader::new(store),
        }
    }

    /// Executes the run to completion and closes the publisher
    pub async fn run(self) -> PipelineOutcome {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", %run_id, project_id = %self.config.project_id);

        let outcome = self.execute().instrument(span).await;

        self.publisher.close().await;
        outcome
    }

    async fn execute(&self) -> PipelineOutcome {
        self.publisher.publish(format!(
            "Starting build pipeline for project {}",
            self.config.project_id
        ));

        let mut tracker = StageTracker::new();

        let outcome = match self.stages(&mut tracker).await {
            Ok(Some(report)) => PipelineOutcome::Deployed(report),
            Ok(None) => PipelineOutcome::NothingToBuild,
            Err(error) => PipelineOutcome::Failed {
                stage: tracker.state,
                error,
            },
        };

        tracker.advance(outcome.state());

        match &outcome {
            PipelineOutcome::Failed { stage, error } => {
                error!("Pipeline failed while {}: {}", stage, error);
                self.publisher
                    .publish_error(format!("{}{}", RUN_FAILED_PREFIX, error));
            }
            PipelineOutcome::Deployed(report) => {
                info!(
                    "Pipeline finished: {} uploaded, {} failed, {} skipped",
                    report.uploaded.len(),
                    report.failed.len(),
                    report.skipped.len()
                );
                self.publisher.publish(RUN_SUCCEEDED_MESSAGE);
            }
            PipelineOutcome::NothingToBuild => {
                info!("Pipeline finished: nothing to build");
                self.publisher.publish(RUN_SUCCEEDED_MESSAGE);
            }
        }

        outcome
    }

    /// Runs the stages in order; `Ok(None)` means there was nothing to build
    async fn stages(
        &self,
        tracker: &mut StageTracker,
    ) -> Result<Option<UploadReport>, PipelineError> {
        let workspace = &self.config.workspace_dir;

        tracker.advance(PipelineState::Cloning);
        self.fetcher
            .fetch(&self.config.repository_url, workspace, &self.publisher)
            .await?;

        tracker.advance(PipelineState::Inspecting);
        let Some(build_command) = self.builder.inspect(workspace, &self.publisher).await? else {
            return Ok(None);
        };

        tracker.advance(PipelineState::Building);
        self.builder
            .run(workspace, &build_command, &self.publisher)
            .await?;

        tracker.advance(PipelineState::Locating);
        let output_dir = locator::locate(workspace).await?;

        tracker.advance(PipelineState::Uploading);
        let report = self
            .uploader
            .upload(
                &output_dir,
                &self.config.storage.bucket,
                &key_prefix(&self.config.project_id),
                &self.publisher,
            )
            .await;

        Ok(Some(report))
    }
}

/// Reports a configuration failure, the only event of a run that never starts
pub fn report_config_error(publisher: &LogPublisher, err: &ConfigError) {
    publisher.publish_error(format!("{}{}", RUN_FAILED_PREFIX, err));
}

/// Loads configuration and connects the publisher for a run
///
/// `connect` receives the project id and pub/sub URL. On a configuration
/// error the failure is reported and `None` is returned; the error goes to the
/// project's channel when a project id is known, to the console otherwise.
pub async fn prepare<F, C, Fut>(lookup: F, connect: C) -> Option<(Config, LogPublisher)>
where
    F: Fn(&str) -> Option<String>,
    C: Fn(String, String) -> Fut,
    Fut: Future<Output = LogPublisher>,
{
    let loaded = Config::from_lookup(&lookup).and_then(|config| {
        config.validate()?;
        Ok(config)
    });

    match loaded {
        Ok(config) => {
            let publisher = connect(config.project_id.clone(), config.redis_url.clone()).await;
            Some((config, publisher))
        }
        Err(e) => {
            let project_id = lookup("PROJECT_ID").filter(|id| !id.trim().is_empty());
            let publisher = match project_id {
                Some(project_id) => {
                    let redis_url = lookup("REDIS_URL")
                        .filter(|url| !url.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());
                    connect(project_id, redis_url).await
                }
                None => LogPublisher::console_only("unknown"),
            };

            report_config_error(&publisher, &e);
            publisher.close().await;
            None
        }
    }
}
