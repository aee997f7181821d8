// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cartoteca — batch ingestion pipeline for a scanned letters archive
//
// Entry point. Initialises logging, parses the command line, and hands
// off to the pipeline commands.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cartoteca_core::error::Result;

#[derive(Debug, Parser)]
#[command(author, version, about = "Cartoteca — scanned letters ingestion pipeline")]
struct Cli {
    /// Pipeline configuration file; built-in defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory the image tree and artifacts live under
    #[arg(long, global = true, default_value = ".")]
    base_dir: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract embedded page images from the volume PDFs
    Extract(ExtractArgs),
    /// Remove undersized and duplicate images, then repair the artifacts
    Curate,
    /// Apply the curated exclusion list, then repair the artifacts
    Prune,
    /// Recognize and index every image in the manifest
    Index(OcrArgs),
    /// Rebuild manifest and index from the images on disk
    Reindex(OcrArgs),
    /// Check that the manifest, the index, and the files agree
    Verify,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Extract only this volume
    #[arg(long)]
    volume: Option<u32>,
    /// Replace the configured source PDF (requires --volume)
    #[arg(long, requires = "volume")]
    pdf: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct OcrArgs {
    /// Directory holding the OCR model files
    #[arg(long)]
    models: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = commands::load_config(cli.config.as_deref())?;
    let base_dir = cli.base_dir;

    match cli.command {
        Commands::Extract(args) => {
            commands::extract(&config, &base_dir, args.volume, args.pdf.as_deref())
        }
        Commands::Curate => commands::curate(&config, &base_dir),
        Commands::Prune => commands::prune(&config, &base_dir),
        Commands::Index(args) => commands::index(&config, &base_dir, args.models.as_deref()),
        Commands::Reindex(args) => commands::reindex(&config, &base_dir, args.models.as_deref()),
        Commands::Verify => commands::verify(&config, &base_dir),
    }
}
