/// Checksum tiers and the resolver chain.
pub mod checksum;
/// Release listing adapters.
pub mod forges;
/// Persistent hash caching for downloaded artifacts.
pub mod hashing;
/// Catalog merge and metadata precedence.
pub mod merge;
/// Per-platform candidate ranking and selection.
pub mod select;
/// Registry directory traversal utilities.
pub mod walk;

pub use checksum::{ChecksumResolver, ChecksumSource};
pub use hashing::HashCache;
pub use walk::{collect_templates, walk_registry_toml_files};

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use assay_schema::version;
use assay_schema::{Catalog, VersionEntry};
use reqwest::Client;
use tokio::sync::Mutex;

use crate::config::PackageTemplate;
use forges::{ListingSource, ReleaseInfo};

/// Everything an indexing run shares across packages.
pub struct IndexContext {
    /// HTTP client for listings, checksum files and downloads.
    pub client: Client,
    /// Limit for a single checksum fetch or download.
    pub download_timeout: Duration,
    /// Limit for resolving every platform of one release.
    pub release_timeout: Duration,
    /// Enable direct computation for every package.
    pub compute_checksums: bool,
    /// Re-resolve versions already present in the catalog.
    pub full: bool,
    /// Digests computed by direct download, keyed by URL.
    pub hash_cache: Arc<Mutex<HashCache>>,
}

impl IndexContext {
    /// Create a context with default timeouts and an in-memory hash cache.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            download_timeout: Duration::from_secs(300),
            release_timeout: Duration::from_secs(900),
            compute_checksums: false,
            full: false,
            hash_cache: Arc::new(Mutex::new(HashCache::default())),
        }
    }

    /// The checksum chain for `template`.
    pub fn resolver_for(&self, template: &PackageTemplate) -> ChecksumResolver {
        ChecksumResolver::standard(
            &self.client,
            self.download_timeout,
            self.compute_checksums || template.checksums.compute,
            self.hash_cache.clone(),
        )
    }
}

/// Counts of what happened to each release during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Releases seen.
    pub total: usize,
    /// Skipped because the version is already cataloged.
    pub known: usize,
    /// Tag failed the version gate.
    pub rejected: usize,
    /// No platform had a verifiable artifact.
    pub empty: usize,
    /// Discarded after exceeding the release timeout.
    pub timed_out: usize,
    /// New or replaced entries.
    pub indexed: usize,
}

impl std::ops::AddAssign for IndexStats {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.known += other.known;
        self.rejected += other.rejected;
        self.empty += other.empty;
        self.timed_out += other.timed_out;
        self.indexed += other.indexed;
    }
}

impl std::fmt::Display for IndexStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} releases: {} indexed, {} known, {} rejected, {} unverifiable, {} timed out",
            self.total, self.indexed, self.known, self.rejected, self.empty, self.timed_out
        )
    }
}

/// Resolve one artifact per platform for an accepted release.
///
/// Platform groups are resolved concurrently; the result only depends on
/// the release and the resolver, not on completion order.
pub async fn resolve_release(
    version: String,
    release: &ReleaseInfo,
    binaries: &[String],
    resolver: &ChecksumResolver,
) -> VersionEntry {
    let groups = select::group_candidates(&release.files);
    let selections = groups.into_iter().map(|(platform, candidates)| async move {
        (
            platform,
            select::select(candidates, &release.files, resolver).await,
        )
    });

    let platforms: BTreeMap<_, _> = futures::future::join_all(selections)
        .await
        .into_iter()
        .filter_map(|(platform, artifact)| artifact.map(|a| (platform, a)))
        .collect();

    VersionEntry {
        version,
        binaries: binaries.to_vec(),
        platforms,
    }
}

/// Run every release through the version gate and selection.
///
/// Returns only complete, non-empty entries. Rejected, known, empty and
/// timed-out releases are counted in `stats` and otherwise dropped.
pub async fn index_releases(
    ctx: &IndexContext,
    releases: &[ReleaseInfo],
    prior: &Catalog,
    binaries: &[String],
    resolver: &ChecksumResolver,
    stats: &mut IndexStats,
) -> Vec<VersionEntry> {
    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for release in releases {
        stats.total += 1;

        let version = match version::validate(&release.tag_name) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Skipping release: {e}");
                stats.rejected += 1;
                continue;
            }
        };

        if !seen.insert(version.clone()) {
            tracing::debug!("{}: duplicate of {version}", release.tag_name);
            stats.known += 1;
            continue;
        }
        if !ctx.full && prior.find(&version).is_some() {
            stats.known += 1;
            continue;
        }

        let work = resolve_release(version.clone(), release, binaries, resolver);
        match tokio::time::timeout(ctx.release_timeout, work).await {
            Err(_) => {
                tracing::warn!(
                    "{version}: timed out after {}s, discarded",
                    ctx.release_timeout.as_secs()
                );
                stats.timed_out += 1;
            }
            Ok(entry) if entry.platforms.is_empty() => {
                tracing::info!("{version}: no verifiable artifacts");
                stats.empty += 1;
            }
            Ok(entry) => {
                println!("  {version} ({} platforms)", entry.platforms.len());
                stats.indexed += 1;
                entries.push(entry);
            }
        }
    }

    entries
}

/// Index one package and write its catalog to `out_path`.
///
/// Returns `Ok(None)` without touching the catalog when the release listing
/// cannot be fetched.
///
/// # Errors
///
/// Returns an error only if the catalog cannot be written.
pub async fn index_package(
    ctx: &IndexContext,
    template: &PackageTemplate,
    source: &dyn ListingSource,
    out_path: &Path,
    stats: &mut IndexStats,
) -> Result<Option<Catalog>> {
    let releases = match source.fetch_releases(&ctx.client).await {
        Ok(releases) => releases,
        Err(e) => {
            tracing::warn!("{}: listing failed: {e:#}", template.package.name);
            return Ok(None);
        }
    };
    let prior = crate::store::load_catalog(out_path);
    tracing::info!(
        "{}: {} releases from {}",
        template.package.name,
        releases.len(),
        source.key()
    );

    let resolver = ctx.resolver_for(template);
    let binaries = template.binaries();
    let entries = index_releases(ctx, &releases, &prior, &binaries, &resolver, stats).await;

    let catalog = merge::merge_catalog(prior, &template.package, entries);
    crate::store::save_catalog(out_path, &catalog)?;
    Ok(Some(catalog))
}
