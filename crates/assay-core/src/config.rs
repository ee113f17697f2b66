//! Package template format.
//!
//! One TOML file per package describes where its releases come from and
//! the metadata written into its catalog.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading a package template.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The template file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The TOML content could not be deserialized into a template.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The template parsed but its values are unusable.
    #[error("Invalid template: {0}")]
    Invalid(String),
}

/// Metadata copied into the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Package name; also the catalog file stem.
    pub name: String,
    /// Short human-readable summary of the package.
    #[serde(default)]
    pub description: String,
    /// URL of the project's homepage.
    #[serde(default)]
    pub homepage: String,
    /// SPDX license identifier.
    #[serde(default)]
    pub license: String,
}

/// Where releases are listed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// GitHub repository in `"owner/repo"` format.
    pub github: String,
}

/// Executables shipped inside each archive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallSpec {
    /// Paths of the binaries; defaults to the package name.
    #[serde(default)]
    pub bin: Vec<String>,
}

/// Checksum policy for this package.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ChecksumConfig {
    /// Download and hash assets that have no published digest.
    #[serde(default)]
    pub compute: bool,
}

/// A parsed package template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageTemplate {
    /// Catalog metadata.
    pub package: PackageInfo,
    /// Release listing location.
    pub discovery: DiscoveryConfig,
    /// Binary layout.
    #[serde(default)]
    pub install: InstallSpec,
    /// Checksum policy.
    #[serde(default)]
    pub checksums: ChecksumConfig,
}

impl PackageTemplate {
    /// Load and validate a template from disk.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise any
    /// error from [`PackageTemplate::parse`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse and validate a template from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and
    /// `ConfigError::Invalid` for an empty name or a repository not shaped
    /// `owner/repo`.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let template: Self = toml::from_str(content)?;
        template.validate()?;
        Ok(template)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let name = self.package.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Invalid("package.name is empty".into()));
        }
        if name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(ConfigError::Invalid(format!(
                "package.name '{name}' is not a valid file name"
            )));
        }

        let repo = &self.discovery.github;
        let valid_repo = repo
            .split_once('/')
            .is_some_and(|(o, r)| !o.is_empty() && !r.is_empty() && !r.contains('/'));
        if !valid_repo {
            return Err(ConfigError::Invalid(format!(
                "discovery.github '{repo}' is not owner/repo"
            )));
        }
        Ok(())
    }

    /// Binaries recorded on every version entry.
    pub fn binaries(&self) -> Vec<String> {
        if self.install.bin.is_empty() {
            vec![self.package.name.clone()]
        } else {
            self.install.bin.clone()
        }
    }
}

impl std::str::FromStr for PackageTemplate {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
