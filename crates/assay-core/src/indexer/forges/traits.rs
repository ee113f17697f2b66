use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;

/// A release found in a remote source
#[derive(Debug, Clone, Default)]
pub struct ReleaseInfo {
    /// Raw tag as published (e.g. `v1.2.3`).
    pub tag_name: String,
    /// Marked as a pre-release by the source.
    pub prerelease: bool,
    /// Unpublished draft.
    pub draft: bool,
    /// Every downloadable file attached to the release, in source order.
    pub files: Vec<ReleaseFile>,
}

/// A downloadable file attached to a release.
///
/// The file's siblings are the other entries of [`ReleaseInfo::files`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseFile {
    /// Asset filename.
    pub name: String,
    /// Direct download URL.
    pub download_url: String,
    /// Digest supplied by the listing API (e.g. `sha256:<hex>`), unvalidated.
    pub digest: Option<String>,
}

impl ReleaseFile {
    /// Create a file entry without a provided digest.
    pub fn new(name: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            download_url: download_url.into(),
            digest: None,
        }
    }

    /// Attach an API-provided digest.
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into());
        self
    }
}

/// A remote source that can list available releases (e.g. GitHub)
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Unique identifier for this source instance (e.g. "github:owner/repo")
    fn key(&self) -> String;

    /// Fetch all published, non-prerelease releases from this source
    async fn fetch_releases(&self, client: &Client) -> Result<Vec<ReleaseInfo>>;
}
