// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External command execution.
//!
//! Every external program that docpub relies on, mainly Git, is invoked
//! through the [`CommandRunner`] trait. A non-zero exit status is reported
//! back as plain data in [`CommandOutput`] so that callers can decide whether
//! a failure is fatal, benign, or calls for a fallback.

use std::{
    ffi::OsString,
    fmt::{Display, Formatter, Result as FmtResult},
    future::Future,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};
use tokio::{process::Command, time::timeout};
use tracing::debug;

/// Description of a single external command call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl Invocation {
    /// Construct new invocation of `program` with `args`.
    pub fn new(
        program: impl Into<OsString>,
        args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
        }
    }

    /// Run invocation inside `dir` rather than the current directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }
}

impl Display for Invocation {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.program.to_string_lossy().as_ref())?;
        for arg in &self.args {
            write!(fmt, " {}", arg.to_string_lossy())?;
        }

        Ok(())
    }
}

/// Completion report of external command.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Construct successful output with given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Construct failed output with given exit code and stderr.
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout and stderr joined together, trailing newlines chomped.
    pub fn message(&self) -> String {
        let mut message = String::new();
        if !self.stdout.is_empty() {
            message.push_str(self.stdout.as_str());
        }

        if !self.stderr.is_empty() {
            if !message.is_empty() && !message.ends_with('\n') {
                message.push('\n');
            }
            message.push_str(self.stderr.as_str());
        }

        message.trim_end_matches(&['\r', '\n'][..]).to_string()
    }
}

/// Layer of indirection for running external commands.
pub trait CommandRunner: Send + Sync {
    /// Run invocation to completion.
    ///
    /// Only failures to run the command at all are errors. Exit status of the
    /// command itself is reported through [`CommandOutput::code`].
    fn run(&self, invocation: &Invocation) -> impl Future<Output = Result<CommandOutput>> + Send;
}

/// Runs commands as real child processes.
///
/// Stdin is inherited so that Git can prompt for credentials. Stdout and
/// stderr are captured.
#[derive(Debug, Default, Clone)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    /// Construct new system runner with optional time limit per command.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        debug!("running: {invocation}");
        let mut command = Command::new(invocation.program());
        command
            .args(invocation.args())
            .stdin(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = invocation.cwd() {
            command.current_dir(dir);
        }

        let output = match self.timeout {
            Some(limit) => timeout(limit, command.output())
                .await
                .map_err(|_| SyscallError::Timeout {
                    command: invocation.to_string(),
                    limit,
                })?,
            None => command.output().await,
        }
        .map_err(|source| SyscallError::Spawn {
            source,
            command: invocation.to_string(),
        })?;

        let output = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(output.stdout.as_slice()).into_owned(),
            stderr: String::from_utf8_lossy(output.stderr.as_slice()).into_owned(),
        };
        debug!("{invocation} exited with {:?}", output.code);

        Ok(output)
    }
}

/// Command execution error types.
#[derive(Debug, thiserror::Error)]
pub enum SyscallError {
    /// Command could not be started or waited on.
    #[error("failed to run command `{command}`")]
    Spawn {
        #[source]
        source: std::io::Error,
        command: String,
    },

    /// Command ran past its time limit and was killed.
    #[error("command `{command}` did not finish within {limit:?}")]
    Timeout { command: String, limit: Duration },
}

/// Friendly result alias :3
pub type Result<T, E = SyscallError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn invocation_display() {
        let invocation = Invocation::new("git", ["commit", "-m", "hello"]).current_dir("ws");
        assert_eq!(invocation.to_string(), "git commit -m hello");
        assert_eq!(invocation.cwd(), Some(Path::new("ws")));
    }

    #[test]
    fn output_message_joins_streams() {
        let output = CommandOutput {
            code: Some(1),
            stdout: "On branch gh-pages\n".into(),
            stderr: "fatal: oops\n".into(),
        };
        assert_eq!(output.message(), "On branch gh-pages\nfatal: oops");
        assert!(!output.is_success());
        assert!(CommandOutput::success("").is_success());
    }

    #[tokio::test]
    async fn system_runner_reports_missing_program() {
        let runner = SystemRunner::default();
        let result = runner
            .run(&Invocation::new("docpub-no-such-program", ["--help"]))
            .await;
        assert!(matches!(result, Err(SyscallError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_runner_enforces_timeout() {
        let runner = SystemRunner::new(Some(Duration::from_millis(50)));
        let result = runner.run(&Invocation::new("sleep", ["5"])).await;
        assert!(matches!(result, Err(SyscallError::Timeout { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_runner_captures_exit_code() -> anyhow::Result<()> {
        let runner = SystemRunner::default();
        let output = runner
            .run(&Invocation::new("sh", ["-c", "echo out; exit 3"]))
            .await?;
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout, "out\n");

        Ok(())
    }
}
