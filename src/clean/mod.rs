//! Implementation of the `clean` sub command.
//!
//! Builds the cleaned "all variants" and "most damaging" tables from the
//! per-cohort genotype, phenotype, survival and coverage inputs.

pub mod combine;
pub mod dedup;
pub mod depth_filter;
pub mod merge;
pub mod next_damaging;
pub mod output;
pub mod quality;

use std::{path::Path, time::Instant};

use clap::Parser;
use thousands::Separable;

use self::{
    dedup::Discrepancy,
    output::{AllVariantsRow, MostDamagingRow},
    quality::QualityFilter,
};
use crate::{
    common::io::write_csv,
    conf::{CohortConf, Conf},
    ingest::{
        normalize::{Normalizer, SampleIdRules},
        records,
    },
    schema::{PatientSample, PhenotypeRecord, VariantCall},
};

/// File name of the cleaned "all variants" table.
pub const ALL_VARIANTS_CSV: &str = "All_Variants.csv";
/// File name of the cleaned "most damaging" table.
pub const MOST_DAMAGING_CSV: &str = "Most_Damaging.csv";
/// File name of the duplicate discrepancy report.
pub const DISCREPANCIES_CSV: &str = "duplicate_discrepancies.csv";

/// Command line arguments for `clean` sub command.
#[derive(Parser, Debug)]
#[command(author, version, about = "Build cleaned cohort tables", long_about = None)]
pub struct Args {
    /// Path to the TOML configuration file.
    #[arg(long)]
    pub path_conf: String,
    /// Path to the output directory.
    #[arg(long)]
    pub path_output_dir: String,
    /// Override the `%_bases_above_49` threshold of the configuration.
    #[arg(long)]
    pub depth_threshold: Option<f64>,
}

/// Shared state of the cohort processing.
struct Context<'a> {
    conf: &'a Conf,
    normalizer: Normalizer,
    filter: QualityFilter,
    controls: regex::Regex,
}

/// Result of processing one cohort.
struct CohortResult {
    all_variants: Vec<VariantCall>,
    most_damaging: Vec<PatientSample>,
    discrepancies: Vec<Discrepancy>,
}

/// Build the "all variants" view of one cohort.
fn all_variants_view(
    ctx: &Context,
    cohort: &CohortConf,
    phenotypes: &[PhenotypeRecord],
) -> Result<Vec<VariantCall>, anyhow::Error> {
    let mut variants = records::load_variants(&cohort.path_all_variants, &ctx.normalizer)?;
    let num_overrides = merge::apply_vus_overrides(&mut variants, &ctx.conf.vus_overrides);
    tracing::debug!("{}: {} calls reclassified to VUS", &cohort.name, num_overrides);

    let calls = merge::merge_genotype_phenotype(&cohort.name, phenotypes, variants);
    let calls = combine::drop_excluded_genes(calls, &ctx.filter);
    let calls = dedup::drop_duplicate_samples(calls, &ctx.conf.duplicate_suffixes);
    let calls = combine::drop_control_samples(calls, &ctx.controls);
    Ok(combine::drop_false_positives(calls, &ctx.filter))
}

/// Build the "most damaging" view of one cohort, without depth filter.
fn most_damaging_view(
    ctx: &Context,
    cohort: &CohortConf,
    phenotypes: &[PhenotypeRecord],
    all_variants: &[VariantCall],
) -> Result<(Vec<PatientSample>, Vec<Discrepancy>), anyhow::Error> {
    let mut variants = records::load_variants(&cohort.path_most_damaging, &ctx.normalizer)?;
    merge::apply_vus_overrides(&mut variants, &ctx.conf.vus_overrides);
    let calls = merge::merge_genotype_phenotype(&cohort.name, phenotypes, variants);

    let mut samples = next_damaging::resolve_next_most_damaging(calls, all_variants, &ctx.filter);
    if let Some(path_survival) = cohort.path_survival.as_ref() {
        let survival = records::load_survival(path_survival, &ctx.normalizer)?;
        merge::merge_survival(&mut samples, &survival);
    }

    let (mut samples, discrepancies) =
        dedup::resolve_duplicates(samples, &ctx.conf.duplicate_suffixes);
    for sample in samples.iter_mut() {
        sample.family_history = merge::determine_family_history(
            &sample.phenotype.sample,
            sample.phenotype.proven_family_history.as_deref(),
            sample.phenotype.probable_family_history.as_deref(),
        );
    }
    let samples = dedup::collapse_duplicates(samples, &ctx.filter);
    let mut samples = combine::drop_control_samples(samples, &ctx.controls);
    combine::null_excluded_genes(&mut samples, &ctx.filter);

    Ok((samples, discrepancies))
}

/// Run the per-cohort part of the pipeline.
fn process_cohort(ctx: &Context, cohort: &CohortConf) -> Result<CohortResult, anyhow::Error> {
    tracing::info!("processing cohort {}", &cohort.name);
    let rules = SampleIdRules::new(&ctx.conf.sample_id_strip_chars, &cohort.sample_corrections);
    let phenotypes = records::load_phenotypes(&cohort.path_phenotype, &ctx.normalizer, &rules)?;

    let all_variants = all_variants_view(ctx, cohort, &phenotypes)?;
    let (most_damaging, discrepancies) =
        most_damaging_view(ctx, cohort, &phenotypes, &all_variants)?;

    tracing::info!(
        "{}: {} qualifying calls, {} patients",
        &cohort.name,
        all_variants.len().separate_with_commas(),
        most_damaging.len().separate_with_commas()
    );
    Ok(CohortResult {
        all_variants,
        most_damaging,
        discrepancies,
    })
}

/// Cleaned tables over all cohorts.
pub struct Cleaned {
    pub all_variants: Vec<AllVariantsRow>,
    pub most_damaging: Vec<MostDamagingRow>,
    pub discrepancies: Vec<Discrepancy>,
}

/// Run the full pipeline on the configured cohorts.
pub fn build_tables(conf: &Conf, depth_threshold: f64) -> Result<Cleaned, anyhow::Error> {
    let ctx = Context {
        conf,
        normalizer: Normalizer::new(&conf.column_aliases),
        filter: QualityFilter::from_conf(conf),
        controls: conf.control_sample_regex()?,
    };

    let mut all_variants = Vec::new();
    let mut most_damaging = Vec::new();
    let mut discrepancies = Vec::new();
    for cohort in &conf.cohorts {
        let result = process_cohort(&ctx, cohort)?;
        all_variants.push((cohort.name.clone(), result.all_variants));
        most_damaging.push((cohort.name.clone(), result.most_damaging));
        discrepancies.extend(result.discrepancies);
    }
    let all_variants = combine::combine_cohorts(all_variants);
    let mut most_damaging = combine::combine_cohorts(most_damaging);

    let depth_records = crate::depth::build_depth_table(conf)?;
    depth_filter::apply_depth_filter(
        &mut most_damaging,
        &depth_records,
        depth_threshold,
        &ctx.filter,
    );

    Ok(Cleaned {
        all_variants: all_variants
            .iter()
            .map(|call| AllVariantsRow::from_call(call, &ctx.filter))
            .collect(),
        most_damaging: most_damaging
            .iter()
            .map(|sample| MostDamagingRow::from_sample(sample, &ctx.filter))
            .collect(),
        discrepancies,
    })
}

/// Main entry point for `clean` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = Instant::now();
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let conf = Conf::load(&args.path_conf)?;
    let depth_threshold = args
        .depth_threshold
        .unwrap_or(conf.thresholds.min_depth_pct);
    tracing::info!("using depth threshold {}", depth_threshold);

    let cleaned = build_tables(&conf, depth_threshold)?;

    let output_dir = Path::new(&args.path_output_dir);
    std::fs::create_dir_all(output_dir)
        .map_err(|e| anyhow::anyhow!("could not create {:?}: {}", output_dir, e))?;
    write_csv(output_dir.join(ALL_VARIANTS_CSV), &cleaned.all_variants)?;
    write_csv(output_dir.join(MOST_DAMAGING_CSV), &cleaned.most_damaging)?;
    write_csv(output_dir.join(DISCREPANCIES_CSV), &cleaned.discrepancies)?;

    tracing::info!(
        "wrote {} variant calls and {} patients in {:?}",
        cleaned.all_variants.len().separate_with_commas(),
        cleaned.most_damaging.len().separate_with_commas(),
        before_anything.elapsed()
    );
    Ok(())
}
