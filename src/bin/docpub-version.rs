// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use docpub::{config::Settings, VersionManager};

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::{ffi::OsString, path::PathBuf, process::exit};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Manage published documentation versions.
#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "docpub-version [options] <command>",
    subcommand_help_heading = "Commands",
    after_help = "Examples:\n  docpub-version create 2.0.0\n  docpub-version create\n  docpub-version list",
    version
)]
struct Cli {
    /// Configuration file to use instead of ./docpub.toml.
    #[arg(short, long, value_name = "path", global = true)]
    pub config: Option<PathBuf>,

    /// Version manifest to use.
    #[arg(short, long, value_name = "path", global = true)]
    pub manifest: Option<PathBuf>,

    /// Documentation tree to snapshot.
    #[arg(short, long, value_name = "path", global = true)]
    pub docs_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    fn run(self) -> Result<()> {
        let mut settings = Settings::load(self.config.as_deref())?.versions;
        if let Some(path) = self.manifest {
            settings.manifest_path = path;
        }
        if let Some(path) = self.docs_dir {
            settings.docs_dir = path;
        }
        let manager = VersionManager::new(settings);

        match self.command {
            Some(Command::Create(opts)) => run_create(&manager, opts),
            Some(Command::List) => run_list(&manager),
            Some(Command::Other(_)) | None => run_usage(),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Create new documentation version.
    #[command(override_usage = "docpub-version create [version]")]
    Create(CreateOptions),

    /// List all documentation versions.
    #[command(override_usage = "docpub-version list")]
    List,

    #[command(external_subcommand)]
    Other(Vec<OsString>),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct CreateOptions {
    /// Version to create, resolved from package file or git tags if omitted.
    #[arg(value_name = "version")]
    pub version: Option<String>,
}

fn main() {
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

    if let Err(error) = Cli::parse().run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run_create(manager: &VersionManager, opts: CreateOptions) -> Result<()> {
    manager.create_new_version(opts.version.as_deref())?;
    Ok(())
}

fn run_list(manager: &VersionManager) -> Result<()> {
    print!("{}", manager.list_versions());
    Ok(())
}

fn run_usage() -> Result<()> {
    Cli::command().print_help()?;
    Ok(())
}
