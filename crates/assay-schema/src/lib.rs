//! Shared types and wire format for assay.
//!
//! Everything here is pure: filename classification, the archive priority
//! table, digest validation, the version gate and the catalog data model.
//! Network and filesystem work lives in `assay-core`.

pub mod arch;
pub mod asset_pattern;
pub mod catalog;
pub mod hash;
pub mod types;
pub mod version;

// Re-exports
pub use arch::*;
pub use asset_pattern::{AssetPattern, classify};
pub use catalog::{CATALOG_SCHEMA, Catalog, ResolvedArtifact, VersionEntry};
pub use hash::*;
pub use types::*;
