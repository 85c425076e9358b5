// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Documentation version management.
//!
//! Keep track of every published documentation version in the
//! [manifest](manifest::Manifest), and freeze the current documentation tree
//! into a __snapshot__ directory whenever a new version is created.
//!
//! # Version Resolution
//!
//! A version can be given explicitly. Otherwise it is resolved from, in
//! order:
//!
//! 1. The `version` field of the package description file.
//! 2. The most recent tag reachable from HEAD, without a leading "v".
//! 3. The configured default version.
//!
//! Each source that fails logs a warning, and the next one is tried.
//!
//! # Latest Flag
//!
//! Only the very first version ever recorded is flagged as latest. Versions
//! created afterwards never touch the flag.
//!
//! # Concurrency
//!
//! The manifest is read, modified, and rewritten without any locking. Two
//! invocations racing against the same manifest means the last writer wins.
//! This tool is meant for a single operator.

pub mod manifest;

use crate::{
    config::VersionSettings,
    path::{copy_tree, create_dir},
    version::manifest::{Manifest, ManifestError, VersionRecord},
};

use git2::{DescribeFormatOptions, DescribeOptions, Repository};
use serde::Deserialize;
use std::{
    fs::read_to_string,
    path::PathBuf,
};
use tracing::{debug, info, instrument, warn};

/// Subset of package description file that matters to us.
#[derive(Debug, Deserialize)]
struct PackageDescription {
    version: Option<String>,
}

/// Manages manifest and snapshots of documentation versions.
#[derive(Debug, Clone)]
pub struct VersionManager {
    settings: VersionSettings,
}

impl VersionManager {
    /// Construct new version manager.
    pub fn new(settings: VersionSettings) -> Self {
        Self { settings }
    }

    /// Resolve version of the documented library.
    ///
    /// Never fails, see [module documentation](self) for resolution order.
    #[instrument(skip(self), level = "debug")]
    pub fn current_version(&self) -> String {
        if let Some(version) = self.version_from_package() {
            return version;
        }

        if let Some(version) = self.version_from_tags() {
            return version;
        }

        debug!("falling back to default version {}", self.settings.default_version);
        self.settings.default_version.clone()
    }

    fn version_from_package(&self) -> Option<String> {
        let path = &self.settings.package_path;
        if !path.exists() {
            debug!("no package description at {:?}", path.display());
            return None;
        }

        let package = read_to_string(path)
            .map_err(|err| err.to_string())
            .and_then(|content| {
                serde_json::from_str::<PackageDescription>(&content).map_err(|err| err.to_string())
            });
        match package {
            Ok(PackageDescription {
                version: Some(version),
            }) if !version.trim().is_empty() => Some(version.trim().to_string()),
            Ok(PackageDescription { version: Some(_) }) => {
                warn!("empty version field in {:?}", path.display());
                None
            }
            Ok(PackageDescription { version: None }) => {
                warn!("no version field in {:?}", path.display());
                None
            }
            Err(err) => {
                warn!("could not read version from {:?}: {err}", path.display());
                None
            }
        }
    }

    fn version_from_tags(&self) -> Option<String> {
        let lookup = || -> Result<String, git2::Error> {
            let repository = Repository::discover(&self.settings.repository_path)?;
            let describe = repository.describe(DescribeOptions::new().describe_tags())?;
            let mut format = DescribeFormatOptions::new();
            format.abbreviated_size(0);
            describe.format(Some(&format))
        };

        match lookup() {
            Ok(tag) => {
                let tag = tag.trim();
                Some(tag.strip_prefix('v').unwrap_or(tag).to_string())
            }
            Err(err) => {
                warn!("could not get version from git tags: {}", err.message());
                None
            }
        }
    }

    /// Load manifest, empty if missing or unreadable.
    pub fn load_versions(&self) -> Manifest {
        Manifest::load(&self.settings.manifest_path)
    }

    /// Overwrite manifest file with `manifest`.
    ///
    /// # Errors
    ///
    /// - Return [`VersionError::Manifest`] if manifest cannot be written.
    pub fn save_versions(&self, manifest: &Manifest) -> Result<()> {
        Ok(manifest.save(&self.settings.manifest_path)?)
    }

    /// Path of snapshot directory for `version`.
    pub fn versioned_docs_path(&self, version: &str) -> PathBuf {
        self.settings
            .versioned_docs_dir
            .join(format!("version-{version}"))
    }

    /// Snapshot current documentation tree for `version`.
    ///
    /// Existing snapshots are never overwritten. Returns whether a snapshot
    /// was made.
    ///
    /// # Errors
    ///
    /// - Return [`VersionError::InvalidVersion`] if version cannot name a
    ///   directory.
    /// - Return [`VersionError::Path`] if documentation tree cannot be copied.
    #[instrument(skip(self), level = "debug")]
    pub fn create_versioned_docs(&self, version: &str) -> Result<bool> {
        check_version(version)?;
        let target = self.versioned_docs_path(version);
        if target.exists() {
            info!("version {version} already exists, skipping snapshot");
            return Ok(false);
        }

        let docs = &self.settings.docs_dir;
        if docs.is_dir() {
            copy_tree(docs, &target)?;
        } else {
            warn!("no docs at {:?}, snapshot will be empty", docs.display());
            create_dir(&target)?;
        }

        info!("created versioned docs for version {version}");
        Ok(true)
    }

    /// Record new documentation version.
    ///
    /// Resolves version through [`current_version`](Self::current_version)
    /// if none is given, or if the given one is blank. New record goes to the front of the manifest, and is
    /// flagged latest only when the manifest was empty.
    ///
    /// # Errors
    ///
    /// - Return [`VersionError::InvalidVersion`] if version cannot name a
    ///   directory. Nothing is modified.
    /// - Return [`VersionError::Duplicate`] if version is already recorded.
    ///   Nothing is modified.
    /// - Return [`VersionError::Path`] if snapshot cannot be made.
    /// - Return [`VersionError::Manifest`] if manifest cannot be written.
    #[instrument(skip(self), level = "debug")]
    pub fn create_new_version(&self, version: Option<&str>) -> Result<VersionRecord> {
        let version = match version.map(str::trim) {
            Some(version) if !version.is_empty() => version.to_string(),
            Some(_) => {
                warn!("blank version given, resolving current version instead");
                self.current_version()
            }
            None => self.current_version(),
        };
        check_version(&version)?;
        info!("creating new documentation version {version}");

        let mut manifest = self.load_versions();
        let mut record = VersionRecord::new(version.as_str());
        if manifest.is_empty() {
            record.is_latest = Some(true);
        }

        manifest.prepend(record.clone()).map_err(|err| match err {
            ManifestError::Duplicate(version) => VersionError::Duplicate(version),
            err => err.into(),
        })?;

        self.create_versioned_docs(&version)?;
        self.save_versions(&manifest)?;
        self.report_site_config(&manifest);

        info!("successfully created version {version}");
        info!("don't forget to:");
        info!(
            "  1. update {:?} with the new version",
            self.settings.site_config_path.display()
        );
        info!("  2. commit the changes to git");
        info!("  3. deploy the updated documentation");

        Ok(record)
    }

    /// Render manifest listing.
    pub fn list_versions(&self) -> String {
        self.load_versions().listing()
    }

    // Site configuration is edited by hand, so just tell the operator what
    // belongs in it.
    fn report_site_config(&self, manifest: &Manifest) {
        let config = &self.settings.site_config_path;
        if !config.exists() {
            warn!("{:?} not found, skipping config update", config.display());
            return;
        }

        info!("update {:?} with new versions manually", config.display());
        info!("versions to include:");
        for record in manifest.iter() {
            info!("  - {}: {}", record.label, record.path);
        }
    }
}

// INVARIANT: Snapshot must land directly inside versioned docs directory.
fn check_version(version: &str) -> Result<()> {
    if version.is_empty() || version.contains(['/', '\\']) || version.contains("..") {
        return Err(VersionError::InvalidVersion(version.to_string()));
    }

    Ok(())
}

/// Version management error types.
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    /// Version cannot be used as snapshot directory name.
    #[error("version {0:?} cannot be used as a directory name")]
    InvalidVersion(String),

    /// Version is already recorded in manifest.
    #[error("version {0} already exists")]
    Duplicate(String),

    /// Manifest cannot be written.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Documentation tree cannot be copied.
    #[error(transparent)]
    Path(#[from] crate::path::PathError),
}

/// Friendly result alias :3
pub type Result<T, E = VersionError> = std::result::Result<T, E>;
