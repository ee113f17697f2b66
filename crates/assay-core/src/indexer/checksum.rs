//! Checksum resolution for release files.
//!
//! A [`ChecksumResolver`] holds an ordered list of [`ChecksumSource`] tiers
//! and returns the first digest any of them produces:
//!
//! 1. [`ProvidedDigest`]: the digest the listing API attached to the file.
//! 2. [`SiblingChecksumFile`]: a checksum file published in the same release.
//! 3. [`DirectDownload`]: download the file and hash it (opt-in).
//!
//! Failures inside a tier are logged and read as "no digest"; they never
//! surface as errors.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use assay_schema::{ArchiveType, Sha256Digest};
use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::Mutex;

use super::forges::ReleaseFile;
use super::hashing::HashCache;
use crate::io::download;

/// Release-wide checksum filenames, compared case-insensitively.
const RELEASE_WIDE_NAMES: &[&str] = &[
    "checksums.txt",
    "checksums.sha256",
    "sha256sums",
    "sha256sums.txt",
    "sha256sum.txt",
    "sha256.txt",
];

/// Suffixes that mark a release-wide checksum file (`tool_1.0.0_checksums.txt`).
const RELEASE_WIDE_SUFFIXES: &[&str] = &[
    "_checksums.txt",
    "-checksums.txt",
    "_sha256sums.txt",
    "-sha256sums.txt",
];

/// Sidecar suffixes appended to an asset name (`tool.tar.gz.sha256`).
const SIDECAR_SUFFIXES: &[&str] = &[".sha256", ".sha256sum", ".sha256.txt"];

/// One strategy for obtaining a digest.
#[async_trait]
pub trait ChecksumSource: Send + Sync {
    /// Short label used in log lines.
    fn name(&self) -> &'static str;

    /// Try to produce a digest for `file`. `release` is every file of the
    /// release `file` belongs to, `file` included.
    async fn resolve(&self, file: &ReleaseFile, release: &[ReleaseFile]) -> Option<Sha256Digest>;
}

/// Tier 1: the digest attached to the listing entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProvidedDigest;

#[async_trait]
impl ChecksumSource for ProvidedDigest {
    fn name(&self) -> &'static str {
        "provided"
    }

    async fn resolve(&self, file: &ReleaseFile, _release: &[ReleaseFile]) -> Option<Sha256Digest> {
        let raw = file.digest.as_deref()?;
        match Sha256Digest::new(raw) {
            Ok(digest) => Some(digest),
            Err(e) => {
                tracing::debug!("{}: ignoring provided digest '{raw}': {e}", file.name);
                None
            }
        }
    }
}

/// Tier 2: a checksum file published alongside the asset.
pub struct SiblingChecksumFile {
    client: Client,
    timeout: Duration,
    // Checksum files are shared by every platform of a release.
    fetched: Mutex<HashMap<String, String>>,
}

impl SiblingChecksumFile {
    /// Create the tier with its own per-fetch timeout.
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            fetched: Mutex::new(HashMap::new()),
        }
    }

    async fn fetch(&self, url: &str) -> Option<String> {
        if let Some(text) = self.fetched.lock().await.get(url) {
            return Some(text.clone());
        }
        match download::fetch_text(&self.client, url, self.timeout).await {
            Ok(text) => {
                self.fetched
                    .lock()
                    .await
                    .insert(url.to_string(), text.clone());
                Some(text)
            }
            Err(e) => {
                tracing::warn!("Checksum file unavailable: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl ChecksumSource for SiblingChecksumFile {
    fn name(&self) -> &'static str {
        "sibling"
    }

    async fn resolve(&self, file: &ReleaseFile, release: &[ReleaseFile]) -> Option<Sha256Digest> {
        let sole_asset = release.iter().filter(|f| !is_checksum_name(&f.name)).count() == 1;

        for (sibling, allow_bare) in checksum_siblings(&file.name, release, sole_asset) {
            let Some(text) = self.fetch(&sibling.download_url).await else {
                continue;
            };
            if let Some(digest) = scan_text_for_hash(&text, &file.name, allow_bare) {
                tracing::debug!("{}: digest found in {}", file.name, sibling.name);
                return Some(digest);
            }
            tracing::debug!("{}: no entry in {}", file.name, sibling.name);
        }
        None
    }
}

/// Tier 3: download the asset and hash it, memoized in a [`HashCache`].
pub struct DirectDownload {
    client: Client,
    timeout: Duration,
    cache: Arc<Mutex<HashCache>>,
}

impl DirectDownload {
    /// Create the tier with its per-download timeout.
    pub fn new(client: Client, timeout: Duration, cache: Arc<Mutex<HashCache>>) -> Self {
        Self {
            client,
            timeout,
            cache,
        }
    }
}

#[async_trait]
impl ChecksumSource for DirectDownload {
    fn name(&self) -> &'static str {
        "download"
    }

    async fn resolve(&self, file: &ReleaseFile, _release: &[ReleaseFile]) -> Option<Sha256Digest> {
        if let Some(digest) = self.cache.lock().await.get(&file.download_url) {
            return Some(digest);
        }

        println!("  Computing checksum for {}...", file.name);
        match download::hash_url(&self.client, &file.download_url, self.timeout).await {
            Ok(digest) => {
                self.cache
                    .lock()
                    .await
                    .insert(file.download_url.clone(), &digest);
                Some(digest)
            }
            Err(e) => {
                tracing::warn!("{}: download failed: {e}", file.name);
                None
            }
        }
    }
}

/// Ordered chain of checksum tiers.
pub struct ChecksumResolver {
    sources: Vec<Box<dyn ChecksumSource>>,
}

impl ChecksumResolver {
    /// A resolver over exactly `sources`, tried in order. An empty list
    /// never resolves anything.
    pub fn new(sources: Vec<Box<dyn ChecksumSource>>) -> Self {
        Self { sources }
    }

    /// The usual chain: provided digest, then sibling checksum files, then
    /// (only when `compute` is set) a full download.
    pub fn standard(
        client: &Client,
        timeout: Duration,
        compute: bool,
        cache: Arc<Mutex<HashCache>>,
    ) -> Self {
        let mut sources: Vec<Box<dyn ChecksumSource>> = vec![
            Box::new(ProvidedDigest),
            Box::new(SiblingChecksumFile::new(client.clone(), timeout)),
        ];
        if compute {
            sources.push(Box::new(DirectDownload::new(client.clone(), timeout, cache)));
        }
        Self::new(sources)
    }

    /// Labels of the configured tiers, in order.
    pub fn tiers(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Resolve a digest for `file`, stopping at the first tier that succeeds.
    pub async fn resolve(&self, file: &ReleaseFile, release: &[ReleaseFile]) -> Option<Sha256Digest> {
        for source in &self.sources {
            if let Some(digest) = source.resolve(file, release).await {
                return Some(digest);
            }
            tracing::debug!("{}: no digest from {}", file.name, source.name());
        }
        None
    }
}

fn is_release_wide_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    RELEASE_WIDE_NAMES.contains(&lower.as_str())
        || RELEASE_WIDE_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

fn is_checksum_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    is_release_wide_name(&lower) || SIDECAR_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

/// Name of `asset` without its archive suffix, if it has one.
fn archive_stem(asset: &str) -> Option<&str> {
    let lower = asset.to_ascii_lowercase();
    ArchiveType::SUFFIXES
        .iter()
        .find(|(suffix, _)| lower.ends_with(suffix))
        .map(|(suffix, _)| &asset[..asset.len() - suffix.len()])
}

/// Checksum files in `release` that may describe `asset`, most specific
/// first, paired with whether a bare digest (no filename) may be trusted.
fn checksum_siblings<'a>(
    asset: &str,
    release: &'a [ReleaseFile],
    sole_asset: bool,
) -> Vec<(&'a ReleaseFile, bool)> {
    let mut wanted: Vec<(String, bool)> = SIDECAR_SUFFIXES
        .iter()
        .map(|s| (format!("{asset}{s}"), true))
        .collect();
    if let Some(stem) = archive_stem(asset) {
        // `tool.sha256` cannot tell `tool.tar.gz` from `tool.zip`.
        let unique_stem = release
            .iter()
            .filter(|f| archive_stem(&f.name).is_some_and(|s| s.eq_ignore_ascii_case(stem)))
            .count()
            <= 1;
        wanted.push((format!("{stem}.sha256"), unique_stem));
        wanted.push((format!("{stem}.sha256sum"), unique_stem));
    }

    let mut out = Vec::new();
    for (name, allow_bare) in &wanted {
        if let Some(f) = release.iter().find(|f| f.name.eq_ignore_ascii_case(name)) {
            out.push((f, *allow_bare));
        }
    }
    out.extend(
        release
            .iter()
            .filter(|f| is_release_wide_name(&f.name))
            .map(|f| (f, sole_asset)),
    );
    out
}

/// Find the digest for `asset_filename` in the text of a checksum file.
///
/// Understands `<hex>  <file>`, `<hex> *<file>` and the BSD
/// `SHA256 (<file>) = <hex>` form. A line naming the file exactly wins over
/// one that merely contains it. When `allow_bare` is set, a file consisting
/// of a single bare digest is accepted too.
pub fn scan_text_for_hash(text: &str, asset_filename: &str, allow_bare: bool) -> Option<Sha256Digest> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();

    if allow_bare && lines.len() == 1 && !lines[0].contains(char::is_whitespace) {
        return Sha256Digest::new(lines[0].trim_end_matches(':')).ok();
    }

    let mut partial = None;
    for line in lines {
        let Some((hash, file)) = parse_line(line) else {
            continue;
        };
        let file = file.trim_start_matches('*').trim_start_matches("./");
        let Ok(digest) = Sha256Digest::new(hash) else {
            continue;
        };
        if file == asset_filename {
            return Some(digest);
        }
        if partial.is_none() && file.contains(asset_filename) {
            partial = Some(digest);
        }
    }
    partial
}

/// Split a checksum line into `(hash, filename)`.
fn parse_line(line: &str) -> Option<(&str, &str)> {
    if let Some(rest) = line
        .get(..8)
        .filter(|p| p.eq_ignore_ascii_case("sha256 ("))
        .map(|_| &line[8..])
    {
        let (file, hash) = rest.rsplit_once(") = ")?;
        return Some((hash.trim(), file));
    }
    let (hash, file) = line.split_once(char::is_whitespace)?;
    Some((hash.trim_end_matches(':'), file.trim()))
}
