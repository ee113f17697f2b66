//! Folding newly resolved versions into a catalog.

use std::collections::HashMap;

use assay_schema::version::compare_versions;
use assay_schema::{CATALOG_SCHEMA, Catalog, VersionEntry};

use crate::config::PackageInfo;

/// Merge `new` into `existing`, keyed by exact version string.
///
/// An entry in `new` replaces the same version in `existing` wholesale.
/// The result is sorted newest first.
pub fn merge(existing: Vec<VersionEntry>, new: Vec<VersionEntry>) -> Vec<VersionEntry> {
    let mut by_version: HashMap<String, VersionEntry> = HashMap::new();
    for entry in existing.into_iter().chain(new) {
        by_version.insert(entry.version.clone(), entry);
    }

    let mut versions: Vec<VersionEntry> = by_version.into_values().collect();
    versions.sort_by(|a, b| compare_versions(&b.version, &a.version));
    versions
}

/// Build the catalog to persist from the prior catalog, the template
/// metadata and this run's entries.
///
/// Each metadata field takes the template value when non-empty, else the
/// prior catalog's value.
pub fn merge_catalog(prior: Catalog, info: &PackageInfo, new: Vec<VersionEntry>) -> Catalog {
    fn pick(template: &str, prior: String) -> String {
        if template.is_empty() {
            prior
        } else {
            template.to_string()
        }
    }

    Catalog {
        schema: CATALOG_SCHEMA,
        name: pick(&info.name, prior.name),
        description: pick(&info.description, prior.description),
        homepage: pick(&info.homepage, prior.homepage),
        license: pick(&info.license, prior.license),
        versions: merge(prior.versions, new),
    }
}
