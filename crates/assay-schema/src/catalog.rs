//! The persisted per-package catalog.
//!
//! A catalog is the version history of one package: for every accepted
//! release, at most one verified artifact per platform. It is written as
//! pretty-printed JSON with a stable field and key order so that successive
//! runs produce small diffs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::arch::PlatformKey;
use crate::hash::Sha256Digest;
use crate::types::ArchiveType;

/// Current catalog format revision.
pub const CATALOG_SCHEMA: u32 = 1;

/// The artifact chosen for one platform of one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedArtifact {
    /// Container format of the download.
    pub archive_type: ArchiveType,
    /// Download URL.
    pub url: String,
    /// Verified digest, serialized as `sha256:<hex>`.
    pub checksum: Sha256Digest,
}

/// One cataloged release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    /// Normalized version string; unique within a catalog.
    pub version: String,
    /// Paths of the executables inside the archive.
    #[serde(default)]
    pub binaries: Vec<String>,
    /// Selected artifact per platform.
    #[serde(default)]
    pub platforms: BTreeMap<PlatformKey, ResolvedArtifact>,
}

/// Version history and metadata for a single package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Format revision, always [`CATALOG_SCHEMA`] when written.
    #[serde(default = "default_schema")]
    pub schema: u32,
    /// Package name.
    #[serde(default)]
    pub name: String,
    /// Short human-readable summary.
    #[serde(default)]
    pub description: String,
    /// Project homepage URL.
    #[serde(default)]
    pub homepage: String,
    /// SPDX license identifier.
    #[serde(default)]
    pub license: String,
    /// Cataloged releases, newest first.
    #[serde(default)]
    pub versions: Vec<VersionEntry>,
}

fn default_schema() -> u32 {
    CATALOG_SCHEMA
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            schema: CATALOG_SCHEMA,
            name: String::new(),
            description: String::new(),
            homepage: String::new(),
            license: String::new(),
            versions: Vec::new(),
        }
    }
}

impl Catalog {
    /// Parse a catalog from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or contains an invalid
    /// digest or platform key.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize to the stable on-disk form (pretty JSON, trailing newline).
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    /// Look up an entry by exact version string.
    pub fn find(&self, version: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.version == version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::{Arch, Os};

    fn sample() -> Catalog {
        let mut platforms = BTreeMap::new();
        platforms.insert(
            PlatformKey::new(Os::Windows, Arch::Amd64),
            ResolvedArtifact {
                archive_type: ArchiveType::Zip,
                url: "https://example.com/tool-windows-amd64.zip".into(),
                checksum: Sha256Digest::new("b".repeat(64)).unwrap(),
            },
        );
        platforms.insert(
            PlatformKey::new(Os::Linux, Arch::Amd64),
            ResolvedArtifact {
                archive_type: ArchiveType::TarGz,
                url: "https://example.com/tool-linux-amd64.tar.gz".into(),
                checksum: Sha256Digest::new("a".repeat(64)).unwrap(),
            },
        );
        Catalog {
            name: "tool".into(),
            versions: vec![VersionEntry {
                version: "1.0.0".into(),
                binaries: vec!["tool".into()],
                platforms,
            }],
            ..Catalog::default()
        }
    }

    #[test]
    fn json_layout_is_stable() {
        let json = sample().to_json().unwrap();
        assert!(json.ends_with("}\n"));
        assert!(json.starts_with("{\n  \"schema\": 1,\n  \"name\": \"tool\""));

        // Platform keys are written in key order regardless of insertion.
        let linux = json.find("linux-amd64").unwrap();
        let windows = json.find("windows-amd64").unwrap();
        assert!(linux < windows);
        assert!(json.contains("\"archive_type\": \"tar.gz\""));
        assert!(json.contains(&format!("\"checksum\": \"sha256:{}\"", "a".repeat(64))));
    }

    #[test]
    fn parse_rejects_bad_checksum() {
        let json = r#"{"schema":1,"name":"x","versions":[{"version":"1.0.0","platforms":
            {"linux-amd64":{"archive_type":"zip","url":"u","checksum":"sha256:xyz"}}}]}"#;
        assert!(Catalog::from_json(json).is_err());
    }

    #[test]
    fn missing_fields_default() {
        let catalog = Catalog::from_json("{}").unwrap();
        assert_eq!(catalog, Catalog::default());
        assert_eq!(catalog.schema, CATALOG_SCHEMA);
    }

    #[test]
    fn reparse_preserves_content() {
        let catalog = sample();
        let parsed = Catalog::from_json(&catalog.to_json().unwrap()).unwrap();
        assert_eq!(parsed, catalog);
        assert_eq!(parsed.find("1.0.0").map(|v| v.platforms.len()), Some(2));
        assert!(parsed.find("2.0.0").is_none());
    }
}
