//! Command-line interface for the catalog build.
//!
//! Usage:
//!   symcat walk [FILES...]  - rewrite sources into per-page artifacts
//!   symcat merge            - build the label and record indexes
//!   symcat render           - render every artifact to HTML
//!   symcat build            - all three stages in order
//!
//! Exits with 1 when content errors were reported and 2 on fatal errors.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use symcat::{discover_sources, BuildReport, Pipeline, Result, SiteConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "symcat", version, about = "Build the symmetric-function catalog site")]
struct Cli {
    /// Configuration file (default: ./symcat.toml if present)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rewrite sources into per-page artifacts
    Walk {
        /// Sources to walk (default: every .tex file in the source directory)
        files: Vec<PathBuf>,
    },
    /// Merge all artifacts into the site indexes
    Merge,
    /// Render every artifact to HTML
    Render,
    /// Walk, merge and render
    Build,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("symcat=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(report) => ExitCode::from(report.exit_code() as u8),
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<BuildReport> {
    let config = SiteConfig::load(cli.config.as_deref())?;
    let pipeline = Pipeline::new(&config)?;

    match cli.command {
        Command::Walk { files } => {
            let files = if files.is_empty() {
                discover_sources(&config.source_dir)?
            } else {
                files
            };
            pipeline.walk(&files)
        }
        Command::Merge => pipeline.merge(),
        Command::Render => pipeline.render(),
        Command::Build => pipeline.build(),
    }
}
