//! Lectern CLI - renders a directory of documents into a static HTML site.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod build;
mod config;

#[derive(Parser)]
#[command(name = "lectern")]
#[command(about = "Render a directory of documents into a static HTML site")]
#[command(version)]
pub struct Cli {
    /// Directory containing the source documents
    input: PathBuf,

    /// Directory the site is written to
    output: PathBuf,

    /// Path to lectern.toml config file
    #[arg(short, long, default_value = "lectern.toml")]
    config: PathBuf,

    /// Site title shown on every page
    #[arg(long)]
    title: Option<String>,

    /// Extension of document files (e.g. "md")
    #[arg(short, long)]
    extension: Option<String>,

    /// Directory with templates overriding the built-in ones
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Do not generate a table of contents on pages
    #[arg(long)]
    no_toc: bool,

    /// Do not number section headings
    #[arg(long)]
    no_section_numbers: bool,

    /// Build into a staging directory and replace the output only on success
    #[arg(long)]
    transactional: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins unless --verbose asks for debug output
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let file_config = config::load(&cli.config)?;
    build::run(cli, file_config).await
}
