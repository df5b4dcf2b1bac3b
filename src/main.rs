//! TAAD cohort worker main executable

pub mod clean;
pub mod common;
pub mod conf;
pub mod depth;
pub mod err;
pub mod ingest;
pub mod schema;
pub mod stats;
pub mod tables;

use clap::{Parser, Subcommand};
use console::{Emoji, Term};

/// CLI parser based on clap.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "TAAD cohort data cleaning",
    long_about = "This tool merges, cleans and reconciles the TAAD cohort data"
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Build the cleaned "all variants" and "most damaging" tables.
    Clean(clean::Args),
    /// Combine the per-assay coverage summaries.
    Depth(depth::Args),
    /// Compute the risk ratio table of the cleaned patients.
    RiskRatio(stats::Args),
    /// Write the demographics and variant tables of the cleaned patients.
    Tables(tables::Args),
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();

    // Install collector and go into sub commands.
    let term = Term::stderr();
    tracing::subscriber::with_default(collector, || {
        match &cli.command {
            Commands::Clean(args) => clean::run(&cli.common, args)?,
            Commands::Depth(args) => depth::run(&cli.common, args)?,
            Commands::RiskRatio(args) => stats::run(&cli.common, args)?,
            Commands::Tables(args) => tables::run(&cli.common, args)?,
        }

        Ok::<(), anyhow::Error>(())
    })?;
    term.write_line(&format!("All done. Have a nice day!{}", Emoji(" 😃", "")))?;

    Ok(())
}
