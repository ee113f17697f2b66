//! Archive types and the per-OS priority table used to rank them.

use serde::{Deserialize, Serialize};

use crate::arch::Os;

/// Priority assigned to archive types a platform does not support.
///
/// Sorts after every real priority.
pub const UNSUPPORTED_PRIORITY: u32 = 999;

/// Container format of a downloadable artifact.
///
/// This is a closed allow-list. Installer and package formats (`.msi`,
/// `.exe`, `.deb`, `.rpm`, `.dmg`, `.pkg`, `.appimage`, `.snap`) have no
/// variant and can never be selected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArchiveType {
    /// Uncompressed tar archive (`.tar`).
    #[serde(rename = "tar")]
    Tar,
    /// Gzip-compressed tar archive (`.tar.gz` / `.tgz`).
    #[serde(rename = "tar.gz")]
    TarGz,
    /// XZ-compressed tar archive (`.tar.xz` / `.txz`).
    #[serde(rename = "tar.xz")]
    TarXz,
    /// Zip archive (`.zip`).
    #[serde(rename = "zip")]
    Zip,
}

impl ArchiveType {
    /// Filename suffixes for each type, most specific first.
    pub const SUFFIXES: [(&'static str, Self); 6] = [
        (".tar.gz", Self::TarGz),
        (".tgz", Self::TarGz),
        (".tar.xz", Self::TarXz),
        (".txz", Self::TarXz),
        (".tar", Self::Tar),
        (".zip", Self::Zip),
    ];

    /// Canonical string form, as written in the catalog.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarXz => "tar.xz",
            Self::Zip => "zip",
        }
    }

    /// Selection priority of this type on `os`. Lower is preferred.
    ///
    /// Windows only supports zip; every other combination on Windows gets
    /// [`UNSUPPORTED_PRIORITY`].
    ///
    /// ```
    /// use assay_schema::{ArchiveType, Os, UNSUPPORTED_PRIORITY};
    ///
    /// assert_eq!(ArchiveType::TarGz.priority(Os::Linux), 1);
    /// assert_eq!(ArchiveType::Zip.priority(Os::Windows), 1);
    /// assert_eq!(ArchiveType::TarGz.priority(Os::Windows), UNSUPPORTED_PRIORITY);
    /// ```
    pub fn priority(self, os: Os) -> u32 {
        match (os, self) {
            (Os::Windows, Self::Zip) => 1,
            (Os::Windows, _) => UNSUPPORTED_PRIORITY,
            (Os::Linux | Os::Macos, Self::TarGz) => 1,
            (Os::Linux | Os::Macos, Self::TarXz) => 2,
            (Os::Linux | Os::Macos, Self::Tar) => 3,
            (Os::Linux | Os::Macos, Self::Zip) => 4,
        }
    }
}

impl std::fmt::Display for ArchiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_priorities_prefer_compressed_tarballs() {
        for os in [Os::Linux, Os::Macos] {
            let mut ranked = [
                ArchiveType::Zip,
                ArchiveType::Tar,
                ArchiveType::TarXz,
                ArchiveType::TarGz,
            ];
            ranked.sort_by_key(|t| t.priority(os));
            assert_eq!(
                ranked,
                [
                    ArchiveType::TarGz,
                    ArchiveType::TarXz,
                    ArchiveType::Tar,
                    ArchiveType::Zip
                ]
            );
        }
    }

    #[test]
    fn windows_only_ranks_zip() {
        assert_eq!(ArchiveType::Zip.priority(Os::Windows), 1);
        for t in [ArchiveType::Tar, ArchiveType::TarGz, ArchiveType::TarXz] {
            assert_eq!(t.priority(Os::Windows), UNSUPPORTED_PRIORITY);
        }
    }

    #[test]
    fn serializes_as_extension() {
        let json = serde_json::to_string(&ArchiveType::TarXz).unwrap();
        assert_eq!(json, "\"tar.xz\"");
    }
}
