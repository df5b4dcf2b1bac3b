//! Combination of per-assay sequencing depth summaries.

pub mod calc;

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use clap::Parser;
use thousands::Separable;

use self::calc::CoverageRow;
use crate::{
    common::{io::write_csv, parse_numeric},
    conf::Conf,
    schema::DepthRecord,
};

/// Command line arguments for `depth` sub command.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Combine coverage summaries into per-sample depth",
    long_about = None
)]
pub struct Args {
    /// Path to the TOML configuration file.
    #[arg(long)]
    pub path_conf: String,
    /// Path to the output CSV file.
    #[arg(long)]
    pub path_output: String,
}

/// Module with code supporting the parsing.
mod input {
    use serde::Deserialize;

    /// Record of a coverage summary as written by GATK `DepthOfCoverage`.
    #[derive(Debug, Deserialize)]
    pub struct Record {
        /// Sample identifier.
        pub sample_id: String,
        /// Number of reads.
        pub total: String,
        /// Percentage of bases with depth above 49.
        #[serde(rename = "%_bases_above_49", default)]
        pub pct_above_49: Option<String>,
        /// Percentage of bases with depth above 99.
        #[serde(rename = "%_bases_above_99", default)]
        pub pct_above_99: Option<String>,
    }
}

/// List the coverage summary files in `dir`, sorted by name.
fn list_summary_files(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>, anyhow::Error> {
    let mut result = Vec::new();
    for entry in std::fs::read_dir(dir)
        .map_err(|e| anyhow::anyhow!("could not list directory {:?}: {}", dir, e))?
    {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.ends_with(suffix))
            .unwrap_or(false);
        if matches && path.is_file() {
            result.push(path);
        }
    }
    result.sort();
    Ok(result)
}

/// Read the rows of one tab-separated coverage summary file.
///
/// Rows whose `total` is not numeric are skipped, missing percentages count
/// as zero.
pub fn read_summary_file<P: AsRef<Path>>(path: P) -> Result<Vec<CoverageRow>, anyhow::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(crate::common::io::open_read_maybe_gz(path.as_ref())?);

    let mut result = Vec::new();
    for record in reader.deserialize() {
        let record: input::Record = record
            .map_err(|e| anyhow::anyhow!("problem reading {:?}: {}", path.as_ref(), e))?;
        let total = match parse_numeric(&record.total) {
            Some(total) => total,
            None => {
                tracing::debug!(
                    "skipping row of {} in {:?} with total {:?}",
                    &record.sample_id,
                    path.as_ref(),
                    &record.total
                );
                continue;
            }
        };
        let pct = |value: &Option<String>| value.as_deref().and_then(parse_numeric).unwrap_or(0.0);
        result.push(CoverageRow {
            pct_above_49: pct(&record.pct_above_49),
            pct_above_99: pct(&record.pct_above_99),
            sample_id: record.sample_id,
            total,
        });
    }
    Ok(result)
}

/// Read all coverage summaries of one cohort.
pub fn read_cohort_rows(dirs: &[String], suffix: &str) -> Result<Vec<CoverageRow>, anyhow::Error> {
    let mut rows = Vec::new();
    for dir in dirs {
        for path in list_summary_files(Path::new(dir), suffix)? {
            rows.append(&mut read_summary_file(&path)?);
        }
    }
    Ok(rows)
}

/// Build the combined depth table over all cohorts of `conf`.
pub fn build_depth_table(conf: &Conf) -> Result<Vec<DepthRecord>, anyhow::Error> {
    let mut records = Vec::new();
    for cohort in &conf.cohorts {
        let rows = read_cohort_rows(&cohort.depth_assay_dirs, &conf.depth_file_suffix)?;
        let mut cohort_records = calc::recalculate(&rows);
        tracing::info!(
            "{}: {} depth records from {} coverage rows",
            &cohort.name,
            cohort_records.len().separate_with_commas(),
            rows.len().separate_with_commas()
        );
        records.append(&mut cohort_records);
    }
    Ok(calc::average_duplicates(records))
}

/// Main entry point for `depth` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = Instant::now();
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let conf = Conf::load(&args.path_conf)?;
    let records = build_depth_table(&conf)?;
    write_csv(&args.path_output, &records)?;

    tracing::info!(
        "wrote {} depth records to {} in {:?}",
        records.len().separate_with_commas(),
        &args.path_output,
        before_anything.elapsed()
    );
    Ok(())
}
