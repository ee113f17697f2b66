//! Candidate selection: one checksum-verified artifact per platform.

use std::collections::BTreeMap;

use assay_schema::{ArchiveType, PlatformKey, ResolvedArtifact, UNSUPPORTED_PRIORITY, classify};

use super::checksum::ChecksumResolver;
use super::forges::ReleaseFile;

/// A release file paired with its archive type and selection priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    /// The underlying file.
    pub file: &'a ReleaseFile,
    /// Classified archive type.
    pub archive_type: ArchiveType,
    /// Rank from the priority table; lower is preferred.
    pub priority: u32,
}

/// Classify every file of a release and group the archives by platform.
///
/// Files without a platform or an allowed archive suffix are skipped.
pub fn group_candidates(files: &[ReleaseFile]) -> BTreeMap<PlatformKey, Vec<Candidate<'_>>> {
    let mut groups: BTreeMap<PlatformKey, Vec<Candidate<'_>>> = BTreeMap::new();
    for file in files {
        let (Some(platform), Some(archive_type)) = classify(&file.name) else {
            tracing::trace!("skipping {}", file.name);
            continue;
        };
        groups.entry(platform).or_default().push(Candidate {
            file,
            archive_type,
            priority: archive_type.priority(platform.os),
        });
    }
    groups
}

/// Order candidates for probing: `(priority, filename)` ascending.
///
/// Candidates with the sentinel priority are dropped whenever the group has
/// at least one candidate with a real priority.
pub fn rank(mut candidates: Vec<Candidate<'_>>) -> Vec<Candidate<'_>> {
    candidates.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.file.name.cmp(&b.file.name))
    });
    if candidates.iter().any(|c| c.priority < UNSUPPORTED_PRIORITY) {
        candidates.retain(|c| c.priority < UNSUPPORTED_PRIORITY);
    }
    candidates
}

/// Pick the first ranked candidate whose checksum resolves.
///
/// Candidates after the winner are never probed. Returns `None` when no
/// candidate can be verified; the platform is then left out of the entry.
pub async fn select(
    candidates: Vec<Candidate<'_>>,
    release: &[ReleaseFile],
    resolver: &ChecksumResolver,
) -> Option<ResolvedArtifact> {
    for candidate in rank(candidates) {
        match resolver.resolve(candidate.file, release).await {
            Some(checksum) => {
                return Some(ResolvedArtifact {
                    archive_type: candidate.archive_type,
                    url: candidate.file.download_url.clone(),
                    checksum,
                });
            }
            None => tracing::debug!("{}: no verifiable checksum, trying next", candidate.file.name),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::checksum::{ChecksumSource, ProvidedDigest};
    use assay_schema::{Arch, Os, Sha256Digest};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    const X: &str = "1111111111111111111111111111111111111111111111111111111111111111";
    const Y: &str = "2222222222222222222222222222222222222222222222222222222222222222";

    fn provided_only() -> ChecksumResolver {
        ChecksumResolver::new(vec![Box::new(ProvidedDigest)])
    }

    fn file(name: &str) -> ReleaseFile {
        ReleaseFile::new(name, format!("https://dl.test/{name}"))
    }

    fn with(name: &str, digest: &str) -> ReleaseFile {
        file(name).with_digest(format!("sha256:{digest}"))
    }

    struct Recording {
        probed: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ChecksumSource for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn resolve(&self, file: &ReleaseFile, _: &[ReleaseFile]) -> Option<Sha256Digest> {
            self.probed.lock().unwrap().push(file.name.clone());
            Sha256Digest::new(X).ok()
        }
    }

    #[test]
    fn test_grouping_skips_unclassifiable() {
        let files = vec![
            file("tool-1.0.0-linux-amd64.tar.gz"),
            file("tool-1.0.0-linux-amd64.tar.gz.sha256"),
            file("tool-1.0.0-darwin-arm64.zip"),
            file("tool-1.0.0-windows-amd64.msi"),
            file("tool-1.0.0.tar.gz"),
            file("checksums.txt"),
        ];
        let groups = group_candidates(&files);
        assert_eq!(groups.len(), 2);
        let linux = &groups[&PlatformKey::new(Os::Linux, Arch::Amd64)];
        assert_eq!(linux.len(), 1);
        assert_eq!(linux[0].archive_type, ArchiveType::TarGz);
        assert_eq!(linux[0].priority, 1);
        let mac = &groups[&PlatformKey::new(Os::Macos, Arch::Arm64)];
        assert_eq!(mac[0].priority, 4);
    }

    #[test]
    fn test_rank_is_priority_then_name() {
        let files = vec![
            file("tool-linux-amd64.zip"),
            file("tool-linux-x86_64.tar.gz"),
            file("tool-linux-amd64.tar.xz"),
            file("tool-linux-amd64.tar.gz"),
        ];
        let groups = group_candidates(&files);
        let ranked = rank(groups.into_values().next().unwrap());
        let names: Vec<_> = ranked.iter().map(|c| c.file.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "tool-linux-amd64.tar.gz",
                "tool-linux-x86_64.tar.gz",
                "tool-linux-amd64.tar.xz",
                "tool-linux-amd64.zip",
            ]
        );
    }

    #[test]
    fn test_sentinel_only_when_alone() {
        let files = vec![file("tool-windows-amd64.tar.gz"), file("tool-windows-amd64.zip")];
        let group = group_candidates(&files).into_values().next().unwrap();
        let ranked = rank(group);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].archive_type, ArchiveType::Zip);

        let files = vec![file("tool-windows-amd64.tar.gz")];
        let group = group_candidates(&files).into_values().next().unwrap();
        assert_eq!(rank(group)[0].priority, UNSUPPORTED_PRIORITY);
    }

    #[tokio::test]
    async fn test_checksum_gating_overrides_priority() {
        let files = vec![
            file("tool-linux-amd64.tar.gz"),
            with("tool-linux-amd64.tar.xz", X),
        ];
        let group = group_candidates(&files).into_values().next().unwrap();
        let artifact = select(group, &files, &provided_only()).await.unwrap();
        assert_eq!(artifact.archive_type, ArchiveType::TarXz);
        assert_eq!(artifact.url, "https://dl.test/tool-linux-amd64.tar.xz");
        assert_eq!(artifact.checksum.as_str(), X);
    }

    #[tokio::test]
    async fn test_windows_installer_never_selected() {
        let files = vec![with("pkg-windows-amd64.msi", X), with("pkg-windows-amd64.zip", Y)];
        let groups = group_candidates(&files);
        assert_eq!(groups.len(), 1);
        let group = groups.into_values().next().unwrap();
        let artifact = select(group, &files, &provided_only()).await.unwrap();
        assert_eq!(artifact.archive_type, ArchiveType::Zip);
        assert!(artifact.url.ends_with(".zip"));
        assert_eq!(artifact.checksum.as_str(), Y);
    }

    #[tokio::test]
    async fn test_win32_and_win64_land_on_their_own_platforms() {
        let files = vec![with("tool-1.0-win32.zip", X), with("tool-1.0-win64.zip", Y)];
        let groups = group_candidates(&files);
        assert_eq!(
            groups.keys().copied().collect::<Vec<_>>(),
            vec![
                PlatformKey::new(Os::Windows, Arch::X86),
                PlatformKey::new(Os::Windows, Arch::Amd64),
            ]
        );

        let resolver = provided_only();
        let mut picked = Vec::new();
        for (platform, group) in groups {
            let artifact = select(group, &files, &resolver).await.unwrap();
            picked.push((platform.to_string(), artifact.url));
        }
        assert_eq!(
            picked,
            vec![
                ("windows-x86".to_string(), "https://dl.test/tool-1.0-win32.zip".to_string()),
                ("windows-amd64".to_string(), "https://dl.test/tool-1.0-win64.zip".to_string()),
            ]
        );
    }

    #[test]
    fn test_win_prefixed_project_stays_on_linux() {
        let files = vec![file("wintun-tool-linux-amd64.tar.gz")];
        let groups = group_candidates(&files);
        assert_eq!(
            groups.keys().copied().collect::<Vec<_>>(),
            vec![PlatformKey::new(Os::Linux, Arch::Amd64)]
        );
        assert_eq!(groups.values().next().unwrap()[0].priority, 1);
    }

    #[tokio::test]
    async fn test_lower_ranked_candidates_not_probed() {
        let probed = Arc::new(Mutex::new(Vec::new()));
        let resolver = ChecksumResolver::new(vec![Box::new(Recording {
            probed: probed.clone(),
        })]);
        let files = vec![
            file("tool-darwin-amd64.zip"),
            file("tool-darwin-amd64.tar.gz"),
            file("tool-darwin-amd64.tar"),
        ];
        let group = group_candidates(&files).into_values().next().unwrap();
        let artifact = select(group, &files, &resolver).await.unwrap();
        assert_eq!(artifact.archive_type, ArchiveType::TarGz);
        assert_eq!(*probed.lock().unwrap(), vec!["tool-darwin-amd64.tar.gz".to_string()]);
    }

    #[tokio::test]
    async fn test_unverifiable_platform_is_omitted() {
        let files = vec![file("tool-linux-arm64.tar.gz"), file("tool-linux-arm64.zip")];
        let group = group_candidates(&files).into_values().next().unwrap();
        assert!(select(group, &files, &provided_only()).await.is_none());
    }
}
