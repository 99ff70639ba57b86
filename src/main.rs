//! Command-line entry point: rebuild the artifact index from a manifest.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use veridex::fetch::HttpFetcher;
use veridex::index;
use veridex::manifest::Manifest;

/// Rebuild the verified program artifact index.
#[derive(Parser, Debug)]
#[command(name = "veridex", version, about)]
struct Cli {
    /// Path to the repository -> release tags manifest.
    #[arg(long, default_value = "programs.yml")]
    manifest: PathBuf,

    /// Directory the index is written into.
    #[arg(long, default_value = "index")]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("veridex=info")),
        )
        .init();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let manifest = Manifest::load(&cli.manifest)?;
    let fetcher = HttpFetcher::new();

    let summary = index::build_index(&fetcher, &manifest, &cli.out).await?;
    tracing::info!(
        "Indexed {} programs ({} idls, {} artifact entries) into {}",
        summary.programs,
        summary.idls,
        summary.artifacts,
        cli.out.display()
    );
    Ok(())
}
