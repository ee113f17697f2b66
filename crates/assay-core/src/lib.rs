//! Asset resolution engine for assay.
//!
//! Turns release listings into verified per-platform catalog entries:
//! candidate selection, checksum resolution, catalog merge, plus the
//! listing, download and persistence plumbing around them.

pub mod config;
pub mod indexer;
pub mod io;
pub mod paths;
pub mod store;

pub use config::{ConfigError, PackageTemplate};
pub use indexer::{IndexContext, IndexStats};
pub use paths::*;

/// User Agent string for core operations
pub const USER_AGENT: &str = concat!("assay/", env!("CARGO_PKG_VERSION"));
