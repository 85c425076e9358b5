// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Version manifest layout.
//!
//! The __manifest__ is a JSON array of [`VersionRecord`]s, newest first. It is
//! the single source of truth for which documentation versions exist. Key
//! names and key order are part of the file format, because the site reads
//! the same file.
//!
//! ```json
//! [
//!   {
//!     "version": "2.0.0-beta",
//!     "label": "2.0.0-beta (Beta)",
//!     "path": "2.0.0-beta"
//!   },
//!   {
//!     "version": "1.0.0",
//!     "label": "1.0.0",
//!     "path": "1.0.0",
//!     "isLatest": true
//!   }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// One published documentation snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VersionRecord {
    pub version: String,
    pub label: String,
    pub path: String,
    #[serde(rename = "isLatest", default, skip_serializing_if = "Option::is_none")]
    pub is_latest: Option<bool>,
}

impl VersionRecord {
    /// Construct record for `version` with derived label and path.
    pub fn new(version: impl Into<String>) -> Self {
        let version = version.into();
        Self {
            label: version_label(&version),
            path: version.clone(),
            version,
            is_latest: None,
        }
    }

    pub fn is_latest(&self) -> bool {
        self.is_latest.unwrap_or(false)
    }
}

/// Ordered listing of version records, newest first.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Manifest {
    records: Vec<VersionRecord>,
}

impl Manifest {
    /// Load manifest from `path`.
    ///
    /// A missing file is an empty manifest. So is a file that cannot be read
    /// or parsed, which gets a warning.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            debug!("no manifest at {:?}", path.display());
            return Self::default();
        }

        let parsed: std::result::Result<Self, String> = read_to_string(path)
            .map_err(|err| err.to_string())
            .and_then(|content| serde_json::from_str(&content).map_err(|err| err.to_string()));
        match parsed {
            Ok(manifest) => manifest,
            Err(err) => {
                warn!("could not parse {:?}, starting fresh: {err}", path.display());
                Self::default()
            }
        }
    }

    /// Write manifest to `path` as indented JSON, replacing the whole file.
    ///
    /// # Errors
    ///
    /// - Return [`ManifestError::Serialize`] if manifest cannot be encoded.
    /// - Return [`ManifestError::Write`] if file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        write(path, content).map_err(|source| ManifestError::Write {
            source,
            path: path.to_path_buf(),
        })
    }

    pub fn contains(&self, version: &str) -> bool {
        self.records.iter().any(|record| record.version == version)
    }

    /// Insert record at the front.
    ///
    /// # Errors
    ///
    /// - Return [`ManifestError::Duplicate`] if a record with the same version
    ///   already exists. Manifest is left untouched.
    pub fn prepend(&mut self, record: VersionRecord) -> Result<()> {
        if self.contains(&record.version) {
            return Err(ManifestError::Duplicate(record.version));
        }

        self.records.insert(0, record);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VersionRecord> {
        self.records.iter()
    }

    /// Render listing for the operator.
    ///
    /// First record is marked current, the rest are marked published.
    pub fn listing(&self) -> String {
        if self.records.is_empty() {
            return "No versions found\n".into();
        }

        let mut out = String::from("Available documentation versions:\n");
        for (index, record) in self.records.iter().enumerate() {
            let indicator = if index == 0 { "current  " } else { "published" };
            let latest = if record.is_latest() { " (latest)" } else { "" };
            out.push_str(&format!(
                "  [{indicator}] {}{latest} - {}\n",
                record.label, record.path
            ));
        }

        out
    }
}

impl From<Vec<VersionRecord>> for Manifest {
    fn from(records: Vec<VersionRecord>) -> Self {
        Self { records }
    }
}

/// Human readable label of `version`.
///
/// Pre-release qualifiers are checked in order alpha, beta, rc, and only the
/// first match is annotated.
pub fn version_label(version: &str) -> String {
    let qualifier = [("alpha", "Alpha"), ("beta", "Beta"), ("rc", "RC")]
        .into_iter()
        .find(|(needle, _)| version.contains(*needle));

    match qualifier {
        Some((_, name)) => format!("{version} ({name})"),
        None => version.to_string(),
    }
}

/// Manifest error types.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// Version already recorded.
    #[error("version {0} already exists")]
    Duplicate(String),

    /// Manifest cannot be encoded.
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),

    /// Manifest file cannot be written.
    #[error("failed to write manifest to {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = ManifestError> = std::result::Result<T, E>;
