// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Site deployment logic.
//!
//! Publish an already built static site to a hosting branch of a remote
//! repository. Deployment never touches the operator's own checkout. Instead
//! a fresh clone of the publishing repository is made into a disposable
//! __workspace__ directory, the hosting branch is checked out (or created as
//! an orphan branch if it does not exist yet), every previously published
//! file is cleared out, and the build output is copied in, committed, and
//! pushed.
//!
//! # Workspace Lifecycle
//!
//! The workspace is owned by exactly one deploy run. Any workspace left over
//! from an earlier run is destroyed before cloning, and the workspace is
//! destroyed again once the run finishes, whether it published, found
//! nothing to publish, or failed part way through.

use crate::{
    config::DeploySettings,
    path::{clear_dir_except, copy_tree, remove_if_exists},
    syscall::{CommandOutput, CommandRunner, Invocation, SystemRunner},
};

use chrono::{SecondsFormat, Utc};
use std::{ffi::OsString, path::PathBuf};
use tracing::{info, instrument, warn};

/// Final state of a successful deploy run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployOutcome {
    /// New commit was pushed to the hosting branch.
    Published,

    /// Build output matched what is already published, nothing was pushed.
    NoChanges,
}

/// Publishes build output through a [`CommandRunner`].
#[derive(Debug)]
pub struct SitePublisher<R = SystemRunner>
where
    R: CommandRunner,
{
    settings: DeploySettings,
    runner: R,
}

impl SitePublisher<SystemRunner> {
    /// Construct new publisher that runs real processes.
    pub fn with_system_runner(settings: DeploySettings) -> Self {
        let runner = SystemRunner::new(settings.timeout());
        Self::new(settings, runner)
    }
}

impl<R> SitePublisher<R>
where
    R: CommandRunner,
{
    /// Construct new publisher.
    pub fn new(settings: DeploySettings, runner: R) -> Self {
        Self { settings, runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Check prerequisites, publish, and always clean up the workspace.
    ///
    /// # Errors
    ///
    /// - Return any error of [`check_prerequisites`](Self::check_prerequisites).
    /// - Return any error of [`deploy_to_remote`](Self::deploy_to_remote).
    /// - Return [`DeployError::Path`] if the workspace cannot be removed
    ///   after an otherwise successful run.
    #[instrument(skip(self), level = "debug")]
    pub async fn run(&self) -> Result<DeployOutcome> {
        info!("starting documentation deployment");
        self.check_prerequisites().await?;

        let outcome = self.deploy_to_remote().await;
        let cleanup = remove_if_exists(&self.settings.workspace_dir);

        match (outcome, cleanup) {
            (Ok(outcome), Ok(_)) => {
                info!("deployment completed successfully");
                if let Some(url) = &self.settings.site_url {
                    info!("documentation will be available at {url}");
                }
                Ok(outcome)
            }
            (Ok(_), Err(error)) => Err(error.into()),
            (Err(error), Ok(_)) => Err(error),
            (Err(error), Err(cleanup_error)) => {
                warn!(
                    "workspace {:?} left behind: {cleanup_error}",
                    self.settings.workspace_dir.display()
                );
                Err(error)
            }
        }
    }

    /// Validate that deployment can proceed.
    ///
    /// Build directory must exist, and Git must know who the commit author
    /// is. Nothing is modified.
    ///
    /// # Errors
    ///
    /// - Return [`DeployError::MissingBuildDir`] if build directory is absent.
    ///   No command is run in that case.
    /// - Return [`DeployError::MissingGitIdentity`] if Git user name or
    ///   email is not configured.
    /// - Return [`DeployError::Syscall`] if Git cannot be run at all.
    #[instrument(skip(self), level = "debug")]
    pub async fn check_prerequisites(&self) -> Result<()> {
        info!("checking prerequisites");
        if !self.settings.build_dir.is_dir() {
            return Err(DeployError::MissingBuildDir {
                build_dir: self.settings.build_dir.clone(),
                build_command: self.settings.build_command.clone(),
            });
        }

        for key in ["user.name", "user.email"] {
            let output = self
                .runner
                .run(&Invocation::new("git", ["config", key]))
                .await?;
            if !output.is_success() || output.stdout.trim().is_empty() {
                return Err(DeployError::MissingGitIdentity);
            }
        }

        info!("prerequisites check passed");
        Ok(())
    }

    /// Publish build output to hosting branch.
    ///
    /// Leaves the workspace in place. Use [`run`](Self::run) for a full
    /// deployment with cleanup.
    ///
    /// # Errors
    ///
    /// - Return [`DeployError::CommandFailed`] if any Git step fails, except
    ///   a commit that has nothing to commit.
    /// - Return [`DeployError::Path`] if workspace files cannot be cleared or
    ///   build output cannot be copied.
    /// - Return [`DeployError::Syscall`] if Git cannot be run at all.
    #[instrument(skip(self), level = "debug")]
    pub async fn deploy_to_remote(&self) -> Result<DeployOutcome> {
        let settings = &self.settings;
        let workspace = &settings.workspace_dir;
        info!("deploying to {} on {}", settings.branch, settings.repository_url);

        if remove_if_exists(workspace)? {
            info!("removed stale workspace {:?}", workspace.display());
        }

        let workspace_arg = OsString::from(workspace.as_os_str());
        self.git(None, [
            OsString::from("clone"),
            OsString::from(&settings.repository_url),
            workspace_arg,
        ])
        .await?;

        let checkout = self
            .try_git(Some(workspace), ["checkout", settings.branch.as_str()])
            .await?;
        if !checkout.is_success() {
            info!("creating new {} branch", settings.branch);
            self.git(Some(workspace), ["checkout", "--orphan", settings.branch.as_str()])
                .await?;
        }

        // INVARIANT: Clear previously published files, but keep history.
        if workspace.join(".git").exists() {
            clear_dir_except(workspace, ".git")?;
        }

        let copied = copy_tree(&settings.build_dir, workspace)?;
        info!(
            "copied {copied} files from {:?}",
            settings.build_dir.display()
        );

        self.git(Some(workspace), ["add", "."]).await?;

        let message = format!(
            "Deploy documentation - {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        );
        let commit = self
            .try_git(Some(workspace), ["commit", "-m", message.as_str()])
            .await?;
        if !commit.is_success() {
            if is_nothing_to_commit(&commit) {
                info!("no changes to deploy");
                return Ok(DeployOutcome::NoChanges);
            }

            return Err(command_failed(
                git_invocation(Some(workspace), ["commit", "-m", message.as_str()]),
                commit,
            ));
        }

        self.git(
            Some(workspace),
            ["push", settings.remote.as_str(), settings.branch.as_str()],
        )
        .await?;
        info!("successfully deployed to {}", settings.branch);

        Ok(DeployOutcome::Published)
    }

    async fn try_git(
        &self,
        cwd: Option<&PathBuf>,
        args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Result<CommandOutput> {
        let invocation = git_invocation(cwd, args);
        info!("running: {invocation}");
        Ok(self.runner.run(&invocation).await?)
    }

    async fn git(
        &self,
        cwd: Option<&PathBuf>,
        args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Result<CommandOutput> {
        let invocation = git_invocation(cwd, args);
        info!("running: {invocation}");
        let output = self.runner.run(&invocation).await?;
        if !output.is_success() {
            return Err(command_failed(invocation, output));
        }

        Ok(output)
    }
}

fn git_invocation(
    cwd: Option<&PathBuf>,
    args: impl IntoIterator<Item = impl Into<OsString>>,
) -> Invocation {
    let invocation = Invocation::new("git", args);
    match cwd {
        Some(dir) => invocation.current_dir(dir),
        None => invocation,
    }
}

fn command_failed(invocation: Invocation, output: CommandOutput) -> DeployError {
    DeployError::CommandFailed {
        command: invocation.to_string(),
        status: output.code,
        output: output.message(),
    }
}

fn is_nothing_to_commit(output: &CommandOutput) -> bool {
    output.stdout.contains("nothing to commit") || output.stderr.contains("nothing to commit")
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {code}"),
        None => "termination by signal".into(),
    }
}

/// Deployment error types.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Build output has not been produced yet.
    #[error(
        "build directory {:?} not found, run '{build_command}' first",
        build_dir.display()
    )]
    MissingBuildDir {
        build_dir: PathBuf,
        build_command: String,
    },

    /// Git does not know who to author commits as.
    #[error("git user name and email must be configured")]
    MissingGitIdentity,

    /// External command completed with failure status.
    #[error("command `{command}` failed with {}:\n{output}", describe_status(.status))]
    CommandFailed {
        command: String,
        status: Option<i32>,
        output: String,
    },

    /// External command could not be run.
    #[error(transparent)]
    Syscall(#[from] crate::syscall::SyscallError),

    /// Workspace or build output could not be manipulated.
    #[error(transparent)]
    Path(#[from] crate::path::PathError),
}

/// Friendly result alias :3
pub type Result<T, E = DeployError> = std::result::Result<T, E>;
