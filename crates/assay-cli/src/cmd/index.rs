use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use assay_core::indexer::forges::github::{self, FileSource, GitHubSource};
use assay_core::indexer::forges::ListingSource;
use assay_core::indexer::{HashCache, collect_templates, index_package};
use assay_core::{IndexContext, IndexStats, PackageTemplate};
use tokio::sync::Mutex;

use crate::IndexArgs;

/// Index every template named on the command line.
///
/// # Errors
///
/// Returns an error for unusable input (missing or invalid templates, a
/// bad flag combination) and when a catalog cannot be written. Network
/// failures only reduce what gets cataloged.
pub async fn index(args: &IndexArgs) -> Result<()> {
    let paths = collect_templates(&args.templates)?;
    if paths.is_empty() {
        anyhow::bail!("No templates found");
    }
    if args.releases.is_some() && paths.len() != 1 {
        anyhow::bail!("--releases requires exactly one template, got {}", paths.len());
    }

    let templates = paths
        .iter()
        .map(|p| {
            PackageTemplate::from_file(p).with_context(|| format!("Invalid template {}", p.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let client = github::build_client(args.token.as_deref(), Duration::from_secs(args.timeout))?;
    let cache = match assay_core::hash_cache_path() {
        Ok(path) => HashCache::load(&path),
        Err(e) => {
            tracing::warn!("{e}; computed hashes will not be cached");
            HashCache::default()
        }
    };

    let ctx = IndexContext {
        client,
        download_timeout: Duration::from_secs(args.timeout),
        release_timeout: Duration::from_secs(args.release_timeout),
        compute_checksums: args.compute_checksums,
        full: args.full,
        hash_cache: Arc::new(Mutex::new(cache)),
    };

    println!();
    println!("  indexing {} packages", templates.len());
    if ctx.full {
        println!("  force full rebuild");
    }

    let mut total = IndexStats::default();
    let mut unavailable = 0;
    for template in &templates {
        let out = catalog_path(&args.out_dir, &template.package.name);
        let source = source_for(args, template)?;

        println!();
        println!("  {}", template.package.name);
        let mut stats = IndexStats::default();
        match index_package(&ctx, template, source.as_ref(), &out, &mut stats).await? {
            Some(catalog) => println!(
                "  {stats}; {} versions in {}",
                catalog.versions.len(),
                out.display()
            ),
            None => {
                println!("  release listing unavailable, catalog unchanged");
                unavailable += 1;
            }
        }
        total += stats;
    }

    if let Err(e) = ctx.hash_cache.lock().await.save() {
        tracing::warn!("Failed to save hash cache: {e}");
    }

    println!();
    println!("  done: {total}");
    if unavailable > 0 {
        println!("  {unavailable} packages could not be listed");
    }
    Ok(())
}

fn source_for(args: &IndexArgs, template: &PackageTemplate) -> Result<Box<dyn ListingSource>> {
    Ok(match &args.releases {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(GitHubSource::new(&args.api_url, &template.discovery.github)?),
    })
}

fn catalog_path(out_dir: &Path, name: &str) -> PathBuf {
    out_dir.join(format!("{name}.json"))
}
