//! External process execution
//!
//! Clone and build steps shell out to `git` and `npm`. The runner is a trait
//! so the pipeline can be exercised without either tool installed.

use async_trait::async_trait;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// A program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; the process cwd when `None`
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Human-readable failure detail: exit status plus trimmed stderr
    pub fn failure_detail(&self, spec: &CommandSpec) -> String {
        let status = match self.exit_code {
            Some(code) => format!("exited with status {}", code),
            None => "was terminated by a signal".to_string(),
        };
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            format!("`{}` {}", spec, status)
        } else {
            format!("`{}` {}: {}", spec, status, stderr)
        }
    }
}

/// Runs external programs to completion
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs a command and captures its output
    ///
    /// A non-zero exit is reported through [`CommandOutput::exit_code`];
    /// only a failure to spawn is an error.
    async fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput>;
}

/// Runs commands as child processes of the builder
#[derive(Debug, Default, Clone)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        debug!("Executing: {} (cwd: {:?})", spec, spec.cwd);

        let mut command = Command::new(&spec.program);
        command.args(&spec.args).kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }

        let output = command.output().await?;

        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        debug!(
            "Command finished: exit_code={:?}, stdout_len={}, stderr_len={}",
            result.exit_code,
            result.stdout.len(),
            result.stderr.len()
        );

        Ok(result)
    }
}
