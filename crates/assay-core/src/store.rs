//! Catalog persistence.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use assay_schema::Catalog;

/// Load the catalog at `path`.
///
/// A missing, unreadable or unparsable file yields an empty catalog; the
/// run continues and the next save rewrites it.
pub fn load_catalog(path: &Path) -> Catalog {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Catalog::default(),
        Err(e) => {
            tracing::warn!("Failed to read {}: {e}, starting empty", path.display());
            return Catalog::default();
        }
    };
    Catalog::from_json(&content).unwrap_or_else(|e| {
        tracing::warn!("Failed to parse {}: {e}, starting empty", path.display());
        Catalog::default()
    })
}

/// Atomically write `catalog` to `path`.
///
/// The JSON is written to a temporary file in the same directory and then
/// renamed over the target, so readers never observe a partial catalog.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot
/// be written or renamed.
pub fn save_catalog(path: &Path, catalog: &Catalog) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let json = catalog.to_json()?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(json.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
