// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Publishing and versioning tools for the documentation site.
//!
//! Two independent tools live here:
//!
//! - [`deploy`] publishes an already built site to the hosting branch of a
//!   remote repository through a disposable clone.
//! - [`version`] keeps the manifest of published documentation versions,
//!   and snapshots the documentation tree for each new version.
//!
//! Both read their settings from [`config::Settings`].

pub mod config;
pub mod deploy;
pub mod path;
pub mod syscall;
pub mod version;

pub use config::{DeploySettings, Settings, VersionSettings};
pub use deploy::{DeployOutcome, SitePublisher};
pub use version::{
    manifest::{version_label, Manifest, VersionRecord},
    VersionManager,
};
