//! Joining of genotype, phenotype and survival records.

use std::collections::HashMap;

use thousands::Separable;

use crate::{
    common::canonical_chrom,
    conf::Locus,
    schema::{
        Classification, FamilyHistory, PatientSample, PhenotypeRecord, SurvivalRecord,
        VariantCall, VariantRecord,
    },
};

/// Reclassify calls on the override loci to "Uncertain Significance".
///
/// Returns the number of reclassified calls.
pub fn apply_vus_overrides(variants: &mut [VariantRecord], overrides: &[Locus]) -> usize {
    let loci = overrides
        .iter()
        .map(|locus| (canonical_chrom(&locus.chrom), locus.pos))
        .collect::<Vec<_>>();
    let mut count = 0;
    for variant in variants.iter_mut() {
        if let (Some(chrom), Some(pos)) = (variant.chrom.as_deref(), variant.pos) {
            let chrom = canonical_chrom(chrom);
            if loci.iter().any(|(c, p)| *c == chrom && *p == pos) {
                tracing::debug!(
                    "reclassifying {}:{} of sample {} from {:?} to VUS",
                    &chrom,
                    pos,
                    &variant.sample,
                    &variant.classification
                );
                variant.classification = Some(Classification::UncertainSignificance);
                count += 1;
            }
        }
    }
    count
}

/// Merge proven and probable family history.
///
/// A missing value counts as "unknown".  Returns `None` (and logs) for
/// combinations that cannot be decided.
pub fn determine_family_history(
    sample: &str,
    proven: Option<&str>,
    probable: Option<&str>,
) -> Option<FamilyHistory> {
    let proven = proven.unwrap_or("unknown").trim().to_lowercase();
    let probable = probable.unwrap_or("unknown").trim().to_lowercase();
    let both = [proven.as_str(), probable.as_str()];

    if both.iter().any(|v| *v == "yes" || *v == "y") {
        Some(FamilyHistory::Yes)
    } else if both.contains(&"marfan") {
        Some(FamilyHistory::Yes)
    } else if both.contains(&"unknown") && !both.contains(&"no") {
        Some(FamilyHistory::Unknown)
    } else if both.contains(&"no") {
        Some(FamilyHistory::No)
    } else {
        tracing::warn!(
            "unable to determine family history for {} (proven={:?}, probable={:?})",
            sample,
            &proven,
            &probable
        );
        None
    }
}

/// Inner join of variant calls with phenotypes on the sample ID.
///
/// The result keeps the order of `variants`.  If a sample has more than one
/// phenotype record, the first one is used.
pub fn merge_genotype_phenotype(
    cohort: &str,
    phenotypes: &[PhenotypeRecord],
    variants: Vec<VariantRecord>,
) -> Vec<VariantCall> {
    let mut by_sample: HashMap<&str, &PhenotypeRecord> = HashMap::new();
    for phenotype in phenotypes {
        if by_sample.contains_key(phenotype.sample.as_str()) {
            tracing::warn!(
                "{}: phenotype sample {} occurs more than once, using the first record",
                cohort,
                &phenotype.sample
            );
        } else {
            by_sample.insert(phenotype.sample.as_str(), phenotype);
        }
    }

    let num_variants = variants.len();
    let result = variants
        .into_iter()
        .filter_map(|variant| {
            by_sample.get(variant.sample.as_str()).map(|phenotype| {
                let family_history = determine_family_history(
                    &phenotype.sample,
                    phenotype.proven_family_history.as_deref(),
                    phenotype.probable_family_history.as_deref(),
                );
                VariantCall {
                    cohort: cohort.to_string(),
                    phenotype: (*phenotype).clone(),
                    variant,
                    family_history,
                }
            })
        })
        .collect::<Vec<_>>();

    if result.is_empty() {
        tracing::warn!(
            "{}: no overlapping sample IDs between {} genotype and {} phenotype records",
            cohort,
            num_variants.separate_with_commas(),
            phenotypes.len().separate_with_commas()
        );
    } else {
        tracing::debug!(
            "{}: merged {} of {} calls with phenotype data",
            cohort,
            result.len().separate_with_commas(),
            num_variants.separate_with_commas()
        );
    }

    result
}

/// Left join of survival records into the samples.
///
/// Survival records of unknown samples are ignored.
pub fn merge_survival(samples: &mut [PatientSample], survival: &[SurvivalRecord]) {
    let mut by_sample: HashMap<&str, &SurvivalRecord> = HashMap::new();
    for record in survival {
        by_sample.entry(record.sample.as_str()).or_insert(record);
    }
    let mut count = 0usize;
    for sample in samples.iter_mut() {
        if let Some(record) = by_sample.get(sample.sample()) {
            sample.survival = Some((*record).clone());
            count += 1;
        }
    }
    tracing::debug!(
        "attached survival data to {} of {} samples",
        count.separate_with_commas(),
        samples.len().separate_with_commas()
    );
}
