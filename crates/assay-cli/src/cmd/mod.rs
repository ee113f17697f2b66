//! Subcommand implementations.

/// `assay classify`
pub mod classify;
/// `assay completions`
pub mod completions;
/// `assay index`
pub mod index;
