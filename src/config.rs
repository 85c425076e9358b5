// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the `docpub.toml` configuration file that both
//! command-line tools read. Every field has a default, so the file itself is
//! optional, and any section or key may be left out.
//!
//! # General Layout
//!
//! The configuration is composed of two sections: deploy and versions. The
//! deploy section describes where the built site comes from and where it gets
//! published to. The versions section describes where the version manifest
//! and the documentation snapshots live.
//!
//! ```toml
//! [deploy]
//! repository_url = "git@github.com:helpers4/doc.git"
//! branch = "gh-pages"
//! build_dir = "build"
//! workspace_dir = "temp-gh-pages"
//!
//! [versions]
//! manifest_path = "versions.json"
//! docs_dir = "docs"
//! ```

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use tracing::debug;

/// Name of configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "docpub.toml";

/// Full configuration layout.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Settings for publishing the built site.
    pub deploy: DeploySettings,

    /// Settings for documentation version management.
    pub versions: VersionSettings,
}

impl Settings {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// read from the working directory if it exists, and the defaults are
    /// used otherwise.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if configuration file cannot be read.
    /// - Return [`ConfigError::Deserialize`] if configuration is malformed.
    /// - Return [`ConfigError::ShellExpansion`] if a path cannot be expanded.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !path.exists() {
                    debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    return Ok(Self::default());
                }
                path
            }
        };

        debug!("load configuration from {:?}", path.display());
        read_to_string(&path)
            .map_err(|source| ConfigError::Read { source, path })?
            .parse()
    }
}

impl FromStr for Settings {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut settings: Settings = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every path field.
        let deploy = &mut settings.deploy;
        deploy.build_dir = expand(&deploy.build_dir)?;
        deploy.workspace_dir = expand(&deploy.workspace_dir)?;

        let versions = &mut settings.versions;
        versions.manifest_path = expand(&versions.manifest_path)?;
        versions.docs_dir = expand(&versions.docs_dir)?;
        versions.versioned_docs_dir = expand(&versions.versioned_docs_dir)?;
        versions.package_path = expand(&versions.package_path)?;
        versions.repository_path = expand(&versions.repository_path)?;
        versions.site_config_path = expand(&versions.site_config_path)?;

        Ok(settings)
    }
}

impl Display for Settings {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Publishing settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeploySettings {
    /// Remote repository that hosts the published site.
    pub repository_url: String,

    /// Name of remote to push to inside the workspace clone.
    pub remote: String,

    /// Branch that the hosting service serves the site from.
    pub branch: String,

    /// Directory containing the built site.
    pub build_dir: PathBuf,

    /// Disposable directory holding the clone of the publishing repository.
    pub workspace_dir: PathBuf,

    /// Command the operator should run to produce the build directory.
    pub build_command: String,

    /// Public address of the published site.
    pub site_url: Option<String>,

    /// Seconds any external command may run before being killed.
    pub command_timeout: Option<u64>,
}

impl DeploySettings {
    /// Time limit for external commands, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.command_timeout.map(Duration::from_secs)
    }
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            repository_url: "git@github.com:helpers4/doc.git".into(),
            remote: "origin".into(),
            branch: "gh-pages".into(),
            build_dir: "build".into(),
            workspace_dir: "temp-gh-pages".into(),
            build_command: "bun run build".into(),
            site_url: Some("https://helpers4.github.io/doc/".into()),
            command_timeout: None,
        }
    }
}

/// Version management settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VersionSettings {
    /// JSON file listing every published documentation version.
    pub manifest_path: PathBuf,

    /// Current documentation tree.
    pub docs_dir: PathBuf,

    /// Directory that holds one snapshot per version.
    pub versioned_docs_dir: PathBuf,

    /// Package description file to read the current version from.
    pub package_path: PathBuf,

    /// Repository to look up the most recent tag in.
    pub repository_path: PathBuf,

    /// Site configuration the operator updates by hand.
    pub site_config_path: PathBuf,

    /// Version used when no other source yields one.
    pub default_version: String,
}

impl Default for VersionSettings {
    fn default() -> Self {
        Self {
            manifest_path: "versions.json".into(),
            docs_dir: "docs".into(),
            versioned_docs_dir: "versioned_docs".into(),
            package_path: "../package.json".into(),
            repository_path: ".".into(),
            site_config_path: "docusaurus.config.ts".into(),
            default_version: "1.0.0".into(),
        }
    }
}

fn expand(path: &Path) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read configuration at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("DOCS_HOME", "/srv/site")])]
    fn deserialize_settings() -> anyhow::Result<()> {
        let result: Settings = r#"
            [deploy]
            repository_url = "https://blah.org/site.git"
            branch = "pages"
            build_dir = "$DOCS_HOME/out"
            command_timeout = 120

            [versions]
            manifest_path = "$DOCS_HOME/versions.json"
        "#
        .parse()?;

        let expect = Settings {
            deploy: DeploySettings {
                repository_url: "https://blah.org/site.git".into(),
                branch: "pages".into(),
                build_dir: "/srv/site/out".into(),
                command_timeout: Some(120),
                ..DeploySettings::default()
            },
            versions: VersionSettings {
                manifest_path: "/srv/site/versions.json".into(),
                ..VersionSettings::default()
            },
        };

        assert_eq!(result, expect);
        assert_eq!(result.deploy.timeout(), Some(Duration::from_secs(120)));

        Ok(())
    }

    #[test]
    fn empty_settings_use_defaults() -> anyhow::Result<()> {
        let result: Settings = "".parse()?;
        assert_eq!(result, Settings::default());
        assert_eq!(result.deploy.timeout(), None);

        Ok(())
    }

    #[test]
    fn serialize_settings() {
        let result = Settings::default().to_string();
        let expect = indoc! {r#"
            [deploy]
            repository_url = "git@github.com:helpers4/doc.git"
            remote = "origin"
            branch = "gh-pages"
            build_dir = "build"
            workspace_dir = "temp-gh-pages"
            build_command = "bun run build"
            site_url = "https://helpers4.github.io/doc/"

            [versions]
            manifest_path = "versions.json"
            docs_dir = "docs"
            versioned_docs_dir = "versioned_docs"
            package_path = "../package.json"
            repository_path = "."
            site_config_path = "docusaurus.config.ts"
            default_version = "1.0.0"
        "#};

        assert_eq!(result, expect);
    }

    #[sealed_test]
    fn load_without_file_uses_defaults() -> anyhow::Result<()> {
        assert_eq!(Settings::load(None)?, Settings::default());
        Ok(())
    }

    #[sealed_test]
    fn load_reads_default_file() -> anyhow::Result<()> {
        std::fs::write(DEFAULT_CONFIG_FILE, "[deploy]\nbranch = \"site\"\n")?;
        assert_eq!(Settings::load(None)?.deploy.branch, "site");
        Ok(())
    }

    #[sealed_test]
    fn load_missing_explicit_file_fails() {
        let result = Settings::load(Some(Path::new("nowhere.toml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
