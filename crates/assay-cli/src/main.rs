//! assay - verified release artifacts per platform

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use assay_cli::cmd;
use assay_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("assay=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("assay=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Index(args) => cmd::index::index(&args).await,
        Commands::Classify { filenames } => {
            cmd::classify::classify(&filenames);
            Ok(())
        }
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(())
        }
    }
}
