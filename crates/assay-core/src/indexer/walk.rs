//! Registry directory traversal utilities.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

fn is_toml(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == "toml")
}

/// Walk a registry directory and return all TOML template files, sorted.
///
/// Handles both sharded (`registry/ab/abc.toml`) and flat
/// (`registry/abc.toml`) layouts. Both may be mixed in one directory.
///
/// # Errors
///
/// Returns an error if the registry directory cannot be read.
pub fn walk_registry_toml_files(registry_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(registry_dir)
        .with_context(|| format!("Failed to read registry {}", registry_dir.display()))?
        .filter_map(std::result::Result::ok)
    {
        let path = entry.path();
        if path.is_dir() {
            // Shard directory ("1", "ab", ...)
            files.extend(
                fs::read_dir(&path)
                    .ok()
                    .into_iter()
                    .flatten()
                    .filter_map(std::result::Result::ok)
                    .map(|e| e.path())
                    .filter(|p| is_toml(p)),
            );
        } else if is_toml(&path) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Expand command-line inputs into template files.
///
/// Files are taken as given; directories are walked with
/// [`walk_registry_toml_files`]. Duplicates are removed, order is sorted.
///
/// # Errors
///
/// Returns an error if an input does not exist or a directory cannot be read.
pub fn collect_templates(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(walk_registry_toml_files(input)?);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            anyhow::bail!("Template not found: {}", input.display());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}
