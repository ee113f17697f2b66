//! Release listing adapters for code hosting platforms.

/// GitHub REST adapter and local-file listing.
pub mod github;
/// Shared traits and types for listing adapters.
pub mod traits;

pub use traits::{ListingSource, ReleaseFile, ReleaseInfo};
