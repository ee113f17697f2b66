//! assay - resolve verified release artifacts into per-package catalogs.
//!
//! For every package template, assay lists the upstream releases, picks one
//! checksum-verified archive per platform and merges the result into a JSON
//! catalog consumed by installers.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.assay/
//! └── cache/
//!     └── hashes.json   # Digests computed by direct download
//! ```

pub mod cmd;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line interface.
#[derive(Debug, Parser)]
#[command(name = "assay")]
#[command(author, version, about = "assay - verified release artifacts per platform")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve releases for package templates and update their catalogs
    Index(IndexArgs),
    /// Show how filenames are classified
    Classify {
        /// Asset filenames to classify
        #[arg(required = true)]
        filenames: Vec<String>,
    },
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

/// Options for `assay index`.
#[derive(Debug, Args)]
pub struct IndexArgs {
    /// Template files or registry directories
    #[arg(required = true)]
    pub templates: Vec<PathBuf>,

    /// Directory receiving `<name>.json` catalogs
    #[arg(long, default_value = "catalogs")]
    pub out_dir: PathBuf,

    /// Download and hash assets with no published checksum
    #[arg(long)]
    pub compute_checksums: bool,

    /// Re-resolve versions already in the catalog
    #[arg(long)]
    pub full: bool,

    /// Read releases from a local JSON file instead of the GitHub API
    #[arg(long)]
    pub releases: Option<PathBuf>,

    /// GitHub API base URL
    #[arg(long, env = "ASSAY_GITHUB_API", default_value = assay_core::indexer::forges::github::GITHUB_API)]
    pub api_url: String,

    /// GitHub token for authenticated requests
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Per-download timeout in seconds
    #[arg(long, default_value_t = 300)]
    pub timeout: u64,

    /// Per-release timeout in seconds
    #[arg(long, default_value_t = 900)]
    pub release_timeout: u64,
}
