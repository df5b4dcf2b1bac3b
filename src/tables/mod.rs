//! Implementation of the `tables` sub command.
//!
//! Builds the manuscript tables from the cleaned "all variants" and "most
//! damaging" tables.

pub mod demographics;
pub mod variants;

use std::{path::Path, time::Instant};

use clap::Parser;
use thousands::Separable;

use self::variants::Selection;
use crate::{
    clean::output::{AllVariantsRow, MostDamagingRow},
    common::io::{read_csv, write_csv},
};

/// File name of the demographics table.
pub const DEMOGRAPHICS_CSV: &str = "Patient_Demographics.csv";
/// File name of the validated P/LP variant table.
pub const PLP_VARIANTS_CSV: &str = "Pathogenic_Likely_Pathogenic_Variants.csv";
/// File name of the VUS table.
pub const VUS_VARIANTS_CSV: &str = "VUS_Variants.csv";
/// File name of the per-gene variant summary.
pub const VARIANT_SUMMARY_CSV: &str = "Summary_of_Variants.csv";

/// Command line arguments for `tables` sub command.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Demographics and variant tables of the cleaned cohorts",
    long_about = None
)]
pub struct Args {
    /// Path to the cleaned `All_Variants.csv` file.
    #[arg(long)]
    pub path_all_variants: String,
    /// Path to the cleaned `Most_Damaging.csv` file.
    #[arg(long)]
    pub path_most_damaging: String,
    /// Path to the output directory.
    #[arg(long)]
    pub path_output_dir: String,
}

/// Main entry point for `tables` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = Instant::now();
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let all_variants: Vec<AllVariantsRow> = read_csv(&args.path_all_variants)?;
    let most_damaging: Vec<MostDamagingRow> = read_csv(&args.path_most_damaging)?;
    tracing::info!(
        "read {} variant calls and {} patients",
        all_variants.len().separate_with_commas(),
        most_damaging.len().separate_with_commas()
    );

    let output_dir = Path::new(&args.path_output_dir);
    std::fs::create_dir_all(output_dir)
        .map_err(|e| anyhow::anyhow!("could not create {:?}: {}", output_dir, e))?;

    demographics::demographics_table(&most_damaging).write(output_dir.join(DEMOGRAPHICS_CSV))?;
    for (selection, file_name) in [
        (Selection::ValidatedPathogenic, PLP_VARIANTS_CSV),
        (Selection::Vus, VUS_VARIANTS_CSV),
    ] {
        let table = variants::variant_table(&all_variants, selection);
        tracing::info!(
            "writing {} variants to {}",
            table.len().separate_with_commas(),
            file_name
        );
        write_csv(output_dir.join(file_name), &table)?;
    }
    write_csv(
        output_dir.join(VARIANT_SUMMARY_CSV),
        &variants::variant_summary(&all_variants),
    )?;

    tracing::info!("wrote tables in {:?}", before_anything.elapsed());
    Ok(())
}
