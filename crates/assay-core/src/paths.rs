use dirs::home_dir;
use std::path::PathBuf;

/// The assay home directory, or None if the user's home cannot be resolved.
fn try_assay_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("ASSAY_HOME") {
        if !val.is_empty() {
            return Some(PathBuf::from(val));
        }
    }
    home_dir().map(|h| h.join(".assay"))
}

/// Returns the canonical assay home directory (`~/.assay`).
///
/// # Errors
///
/// Returns an error if neither `ASSAY_HOME` is set nor the user's home
/// directory can be resolved.
pub fn assay_home() -> anyhow::Result<PathBuf> {
    try_assay_home()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory. Set ASSAY_HOME to override."))
}

/// Cache path: ~/.assay/cache
pub fn cache_path() -> anyhow::Result<PathBuf> {
    Ok(assay_home()?.join("cache"))
}

/// Hash cache file: ~/.assay/cache/hashes.json
pub fn hash_cache_path() -> anyhow::Result<PathBuf> {
    Ok(cache_path()?.join("hashes.json"))
}
