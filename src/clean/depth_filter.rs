//! Sequencing depth status and final nulling of unusable genotypes.

use std::collections::HashMap;

use thousands::Separable;

use super::quality::QualityFilter;
use crate::schema::{DepthRecord, DepthStatus, PatientSample};

/// Depth status of a sample; samples without depth record are `High`.
pub fn depth_status(record: Option<&DepthRecord>, threshold: f64) -> DepthStatus {
    match record {
        Some(record) if record.pct_above_49 <= threshold => DepthStatus::Low,
        _ => DepthStatus::High,
    }
}

/// Set the depth status and null the genotype of unusable samples.
///
/// Samples with `Low` depth and samples whose (possibly replaced) variant is
/// still disqualified lose their variant but keep phenotype and survival data.
pub fn apply_depth_filter(
    samples: &mut [PatientSample],
    depth_records: &[DepthRecord],
    threshold: f64,
    filter: &QualityFilter,
) {
    let by_sample = depth_records
        .iter()
        .map(|record| (record.sample_id.as_str(), record))
        .collect::<HashMap<_, _>>();

    let mut num_low = 0usize;
    let mut num_disqualified = 0usize;
    for sample in samples.iter_mut() {
        sample.depth = depth_status(by_sample.get(sample.sample()).copied(), threshold);
        if sample.depth == DepthStatus::Low {
            num_low += 1;
            sample.variant = None;
        } else if sample
            .variant
            .as_ref()
            .map(|variant| filter.is_disqualified(variant))
            .unwrap_or(false)
        {
            tracing::debug!("nulling disqualified variant of sample {}", sample.sample());
            num_disqualified += 1;
            sample.variant = None;
        }
    }

    tracing::info!(
        "{} samples have not passed the % above 49 reads threshold of {}",
        num_low.separate_with_commas(),
        threshold
    );
    tracing::info!(
        "{} samples still had a disqualified variant",
        num_disqualified.separate_with_commas()
    );
}
