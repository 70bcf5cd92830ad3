//! Build inspector and runner
//!
//! Reads the workspace manifest to find a build command, then installs
//! dependencies and runs the build. Install and build form a single step:
//! whichever fails first becomes the build error.

use shipyard_core::domain::manifest::{BuildManifest, MANIFEST_FILE};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::error::PipelineError;
use crate::process::{CommandOutput, CommandRunner, CommandSpec};
use crate::service::LogPublisher;

pub struct BuildRunner {
    runner: Arc<dyn CommandRunner>,
}

impl BuildRunner {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Returns the declared build command, or `None` when there is nothing to build
    ///
    /// A missing or malformed manifest is an error; a manifest without a
    /// build script is not.
    pub async fn inspect(
        &self,
        workspace: &Path,
        publisher: &LogPublisher,
    ) -> Result<Option<String>, PipelineError> {
        let manifest_path = workspace.join(MANIFEST_FILE);

        let manifest = match read_manifest(&manifest_path).await {
            Ok(manifest) => manifest,
            Err(e) => {
                publisher.publish_error(e.to_string());
                return Err(e);
            }
        };

        match manifest.build_command() {
            Some(command) => {
                debug!("Found build command: {}", command);
                Ok(Some(command.to_string()))
            }
            None => {
                publisher.publish(format!("No build script found in {}", MANIFEST_FILE));
                Ok(None)
            }
        }
    }

    /// Installs dependencies and runs the build
    pub async fn run(
        &self,
        workspace: &Path,
        build_command: &str,
        publisher: &LogPublisher,
    ) -> Result<(), PipelineError> {
        publisher.publish(format!(
            "Starting build process with command: {}",
            build_command
        ));

        let steps = [
            CommandSpec::new("npm").arg("install").current_dir(workspace),
            CommandSpec::new("npm")
                .arg("run")
                .arg("build")
                .current_dir(workspace),
        ];

        for spec in &steps {
            if let Err(e) = self.run_step(spec, publisher).await {
                publisher.publish_error(e.to_string());
                return Err(e);
            }
        }

        publisher.publish("Build process completed.");
        Ok(())
    }

    async fn run_step(
        &self,
        spec: &CommandSpec,
        publisher: &LogPublisher,
    ) -> Result<(), PipelineError> {
        debug!("Running build step: {}", spec);

        let output = self
            .runner
            .run(spec)
            .await
            .map_err(|e| PipelineError::Build(format!("failed to run `{}`: {}", spec, e)))?;

        log_output(publisher, &output);

        if output.success() {
            Ok(())
        } else {
            Err(PipelineError::Build(output.failure_detail(spec)))
        }
    }
}

async fn read_manifest(path: &Path) -> Result<BuildManifest, PipelineError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PipelineError::ManifestRead(format!("{}: {}", path.display(), e)))?;

    BuildManifest::parse(&contents).map_err(|e| PipelineError::ManifestRead(e.to_string()))
}

/// Publishes captured process output; stderr alone is not a failure
fn log_output(publisher: &LogPublisher, output: &CommandOutput) {
    let stdout = output.stdout.trim();
    if !stdout.is_empty() {
        publisher.publish(format!("Build stdout: {}", stdout));
    }

    let stderr = output.stderr.trim();
    if !stderr.is_empty() {
        publisher.publish(format!("Build stderr: {}", stderr));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeCommandRunner, RecordingChannel, failed_output, ok_output};

    fn workspace_with_manifest(contents: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), contents).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_inspect_finds_build_command() {
        let workspace = workspace_with_manifest(r#"{"scripts":{"build":"vite build"}}"#);
        let publisher = LogPublisher::console_only("site-42");
        let builder = BuildRunner::new(Arc::new(FakeCommandRunner::succeeding()));

        let command = builder.inspect(workspace.path(), &publisher).await.unwrap();
        assert_eq!(command.as_deref(), Some("vite build"));
    }

    #[tokio::test]
    async fn test_inspect_without_build_script() {
        let workspace = workspace_with_manifest(r#"{"scripts":{"start":"node index.js"}}"#);
        let channel = RecordingChannel::new();
        let publisher = LogPublisher::new("site-42", Box::new(channel.clone()));
        let builder = BuildRunner::new(Arc::new(FakeCommandRunner::succeeding()));

        let command = builder.inspect(workspace.path(), &publisher).await.unwrap();
        publisher.close().await;

        assert!(command.is_none());
        assert_eq!(channel.messages(), vec!["No build script found in package.json"]);
    }

    #[tokio::test]
    async fn test_inspect_missing_manifest() {
        let workspace = tempfile::tempdir().unwrap();
        let publisher = LogPublisher::console_only("site-42");
        let builder = BuildRunner::new(Arc::new(FakeCommandRunner::succeeding()));

        let err = builder.inspect(workspace.path(), &publisher).await.unwrap_err();
        assert!(matches!(err, PipelineError::ManifestRead(_)));
    }

    #[tokio::test]
    async fn test_inspect_malformed_manifest() {
        let workspace = workspace_with_manifest("{ \"scripts\": ");
        let channel = RecordingChannel::new();
        let publisher = LogPublisher::new("site-42", Box::new(channel.clone()));
        let builder = BuildRunner::new(Arc::new(FakeCommandRunner::succeeding()));

        let err = builder.inspect(workspace.path(), &publisher).await.unwrap_err();
        publisher.close().await;

        assert!(matches!(err, PipelineError::ManifestRead(_)));
        assert!(channel.messages()[0].starts_with("Error reading package.json"));
    }

    #[tokio::test]
    async fn test_run_installs_then_builds() {
        let workspace = tempfile::tempdir().unwrap();
        let runner = FakeCommandRunner::new(|spec| {
            if spec.args == ["install"] {
                Ok(ok_output("added 12 packages", "npm WARN deprecated"))
            } else {
                Ok(ok_output("built in 1.2s", ""))
            }
        });
        let channel = RecordingChannel::new();
        let publisher = LogPublisher::new("site-42", Box::new(channel.clone()));
        let builder = BuildRunner::new(Arc::new(runner.clone()));

        builder
            .run(workspace.path(), "vite build", &publisher)
            .await
            .unwrap();
        publisher.close().await;

        assert_eq!(runner.command_lines(), vec!["npm install", "npm run build"]);
        assert!(
            runner
                .calls()
                .iter()
                .all(|c| c.cwd.as_deref() == Some(workspace.path()))
        );
        assert_eq!(
            channel.messages(),
            vec![
                "Starting build process with command: vite build",
                "Build stdout: added 12 packages",
                "Build stderr: npm WARN deprecated",
                "Build stdout: built in 1.2s",
                "Build process completed.",
            ]
        );
    }

    #[tokio::test]
    async fn test_install_failure_stops_before_build() {
        let workspace = tempfile::tempdir().unwrap();
        let runner = FakeCommandRunner::new(|_| Ok(failed_output(1, "npm ERR! network")));
        let publisher = LogPublisher::console_only("site-42");
        let builder = BuildRunner::new(Arc::new(runner.clone()));

        let err = builder
            .run(workspace.path(), "vite build", &publisher)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Build(_)));
        assert!(err.to_string().contains("npm ERR! network"));
        assert_eq!(runner.command_lines(), vec!["npm install"]);
    }

    #[tokio::test]
    async fn test_build_failure() {
        let workspace = tempfile::tempdir().unwrap();
        let runner = FakeCommandRunner::new(|spec| {
            if spec.args == ["install"] {
                Ok(ok_output("", ""))
            } else {
                Ok(failed_output(2, "SyntaxError: Unexpected token"))
            }
        });
        let publisher = LogPublisher::console_only("site-42");
        let builder = BuildRunner::new(Arc::new(runner));

        let err = builder
            .run(workspace.path(), "vite build", &publisher)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Build error: `npm run build` exited with status 2: SyntaxError: Unexpected token"
        );
    }
}
