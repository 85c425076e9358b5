// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use docpub::{config::Settings, SitePublisher};

use anyhow::Result;
use clap::Parser;
use std::{path::PathBuf, process::exit};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Publish built documentation site to its hosting branch.
#[derive(Debug, Clone, Parser)]
#[command(about, override_usage = "docpub-deploy [options]", version)]
struct Cli {
    /// Configuration file to use instead of ./docpub.toml.
    #[arg(short, long, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Remote repository to publish to.
    #[arg(short, long, value_name = "url")]
    pub repository_url: Option<String>,

    /// Hosting branch to publish to.
    #[arg(short, long, value_name = "branch")]
    pub branch: Option<String>,

    /// Directory containing the built site.
    #[arg(long, value_name = "path")]
    pub build_dir: Option<PathBuf>,

    /// Disposable directory to clone the repository into.
    #[arg(long, value_name = "path")]
    pub workspace_dir: Option<PathBuf>,

    /// Kill any Git command running longer than this many seconds.
    #[arg(short, long, value_name = "seconds")]
    pub timeout: Option<u64>,
}

impl Cli {
    async fn run(self) -> Result<()> {
        let mut settings = Settings::load(self.config.as_deref())?.deploy;
        if let Some(url) = self.repository_url {
            settings.repository_url = url;
        }
        if let Some(branch) = self.branch {
            settings.branch = branch;
        }
        if let Some(path) = self.build_dir {
            settings.build_dir = path;
        }
        if let Some(path) = self.workspace_dir {
            settings.workspace_dir = path;
        }
        if self.timeout.is_some() {
            settings.command_timeout = self.timeout;
        }

        SitePublisher::with_system_runner(settings).run().await?;

        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = Cli::parse().run().await {
        error!("deployment failed: {error:?}");
        exit(1);
    }

    exit(0)
}
