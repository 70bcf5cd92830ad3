//! Repository fetcher service
//!
//! Clones the source repository into the run's workspace with `git clone`.
//! The destination is never prepared or cleaned: if it already exists, git
//! refuses to clone into it and the run fails.

use std::path::Path;
use std::sync::Arc;

use crate::error::PipelineError;
use crate::process::{CommandRunner, CommandSpec};
use crate::service::LogPublisher;

pub struct RepositoryFetcher {
    runner: Arc<dyn CommandRunner>,
}

impl RepositoryFetcher {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Clones `repo_url` into `dest`
    ///
    /// Output on stderr (git reports progress there) is logged but is not a
    /// failure; only a non-zero exit or a spawn error is.
    pub async fn fetch(
        &self,
        repo_url: &str,
        dest: &Path,
        publisher: &LogPublisher,
    ) -> Result<(), PipelineError> {
        publisher.publish(format!("Cloning repository: {}", repo_url));

        let spec = CommandSpec::new("git")
            .arg("clone")
            .arg("--")
            .arg(repo_url)
            .arg(dest.to_string_lossy());

        let result = match self.runner.run(&spec).await {
            Ok(output) if output.success() => Ok(output),
            Ok(output) => Err(PipelineError::Clone(output.failure_detail(&spec))),
            Err(e) => Err(PipelineError::Clone(format!("failed to run git: {}", e))),
        };

        match result {
            Ok(output) => {
                let stderr = output.stderr.trim();
                if !stderr.is_empty() {
                    publisher.publish(format!("Clone stderr: {}", stderr));
                }
                publisher.publish("Repository cloned successfully.");
                Ok(())
            }
            Err(e) => {
                publisher.publish_error(e.to_string());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeCommandRunner, RecordingChannel, failed_output, ok_output};

    #[tokio::test]
    async fn test_fetch_success_logs_stderr_without_failing() {
        let runner = FakeCommandRunner::new(|_| Ok(ok_output("", "Cloning into 'output'...\n")));
        let channel = RecordingChannel::new();
        let publisher = LogPublisher::new("site-42", Box::new(channel.clone()));

        let fetcher = RepositoryFetcher::new(Arc::new(runner.clone()));
        let result = fetcher
            .fetch("https://example.com/site.git", Path::new("output"), &publisher)
            .await;
        publisher.close().await;

        assert!(result.is_ok());
        assert_eq!(
            runner.command_lines(),
            vec!["git clone -- https://example.com/site.git output"]
        );
        assert_eq!(
            channel.messages(),
            vec![
                "Cloning repository: https://example.com/site.git",
                "Clone stderr: Cloning into 'output'...",
                "Repository cloned successfully.",
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_logs_detail() {
        let runner = FakeCommandRunner::new(|_| {
            Ok(failed_output(
                128,
                "fatal: destination path 'output' already exists and is not an empty directory.",
            ))
        });
        let channel = RecordingChannel::new();
        let publisher = LogPublisher::new("site-42", Box::new(channel.clone()));

        let fetcher = RepositoryFetcher::new(Arc::new(runner));
        let err = fetcher
            .fetch("https://example.com/site.git", Path::new("output"), &publisher)
            .await
            .unwrap_err();
        publisher.close().await;

        assert!(matches!(err, PipelineError::Clone(_)));
        let messages = channel.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].starts_with("Error cloning repository:"));
        assert!(messages[1].contains("already exists"));
    }

    #[tokio::test]
    async fn test_fetch_spawn_failure() {
        let runner = FakeCommandRunner::new(|_| {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "git not found"))
        });
        let publisher = LogPublisher::console_only("site-42");

        let fetcher = RepositoryFetcher::new(Arc::new(runner));
        let err = fetcher
            .fetch("https://example.com/site.git", Path::new("output"), &publisher)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("git not found"));
    }
}
