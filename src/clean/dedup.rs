//! Detection and reconciliation of duplicate sample records.
//!
//! Duplicates of a patient carry a suffix such as `_2` or `_pool7A`.  Their
//! phenotype fields are filled from each other, remaining differences are
//! reported and finally one record per patient is kept.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use thousands::Separable;

use super::quality::QualityFilter;
use crate::schema::{PatientSample, VariantCall};

/// Canonical sample ID, i.e., the ID with any duplicate suffix stripped.
///
/// IDs of at most four characters are never considered duplicates.  If
/// several suffixes match, the last one in `suffixes` wins.
pub fn canonical_id(sample: &str, suffixes: &[String]) -> String {
    let mut result = sample;
    if sample.chars().count() > 4 {
        for suffix in suffixes {
            if let Some(stripped) = sample.strip_suffix(suffix.as_str()) {
                result = stripped;
            }
        }
    }
    result.to_string()
}

/// A phenotype difference between two records of the same patient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discrepancy {
    /// The canonical sample ID.
    pub canonical_id: String,
    /// The column with differing values.
    pub column: String,
    /// First raw sample ID.
    pub left_sample: String,
    /// Value of the first record.
    pub left_value: String,
    /// Second raw sample ID.
    pub right_sample: String,
    /// Value of the second record.
    pub right_value: String,
}

/// Forward fill the phenotype fields of adjacent records of the same patient.
fn fill_adjacent(samples: &mut [PatientSample]) {
    for idx in 1..samples.len() {
        let (head, tail) = samples.split_at_mut(idx);
        let prev = &head[idx - 1];
        let current = &mut tail[0];
        if prev.canonical_id == current.canonical_id {
            current.phenotype.fill_missing_from(&prev.phenotype);
        }
    }
}

/// Collect the remaining phenotype differences between adjacent records.
fn find_discrepancies(samples: &[PatientSample]) -> Vec<Discrepancy> {
    let mut result = Vec::new();
    for pair in samples.windows(2) {
        let (left, right) = (&pair[0], &pair[1]);
        if left.canonical_id != right.canonical_id {
            continue;
        }
        for ((column, left_value), (_, right_value)) in left
            .phenotype
            .field_values()
            .into_iter()
            .zip(right.phenotype.field_values())
        {
            if left_value != right_value {
                let discrepancy = Discrepancy {
                    canonical_id: left.canonical_id.clone(),
                    column: column.to_string(),
                    left_sample: left.sample().to_string(),
                    left_value: left_value.unwrap_or_else(|| "-".to_string()),
                    right_sample: right.sample().to_string(),
                    right_value: right_value.unwrap_or_else(|| "-".to_string()),
                };
                tracing::warn!(
                    "duplicate samples {} and {} differ in {:?}: {:?} vs. {:?}",
                    &discrepancy.left_sample,
                    &discrepancy.right_sample,
                    &discrepancy.column,
                    &discrepancy.left_value,
                    &discrepancy.right_value
                );
                result.push(discrepancy);
            }
        }
    }
    result
}

/// Reconcile the phenotype data of duplicate samples.
///
/// Two passes of adjacent forward filling are run, first with the raw IDs
/// sorted descending then ascending within each patient.  Afterwards, the
/// remaining differences are reported and records without any phenotype data
/// are dropped.  The result is in the order of the second pass.
pub fn resolve_duplicates(
    mut samples: Vec<PatientSample>,
    suffixes: &[String],
) -> (Vec<PatientSample>, Vec<Discrepancy>) {
    for sample in samples.iter_mut() {
        sample.canonical_id = canonical_id(sample.sample(), suffixes);
    }

    samples.sort_by(|a, b| {
        b.canonical_id
            .cmp(&a.canonical_id)
            .then_with(|| b.sample().cmp(a.sample()))
    });
    fill_adjacent(&mut samples);

    samples.sort_by(|a, b| {
        b.canonical_id
            .cmp(&a.canonical_id)
            .then_with(|| a.sample().cmp(b.sample()))
    });
    fill_adjacent(&mut samples);

    let discrepancies = find_discrepancies(&samples);

    let (kept, dropped): (Vec<_>, Vec<_>) = samples
        .into_iter()
        .partition(|sample| !sample.phenotype.is_empty());
    tracing::info!(
        "number of samples without phenotype data: {}",
        dropped.len().separate_with_commas()
    );
    for sample in dropped.iter().filter(|s| {
        s.variant
            .as_ref()
            .map(|variant| variant.is_validated())
            .unwrap_or(false)
    }) {
        tracing::info!(
            "{} has no phenotype information and is dropped even though it has a validated variant",
            sample.sample()
        );
    }

    (kept, discrepancies)
}

/// Keep one record per patient: the one with the most damaging category.
///
/// Ties go to the record appearing last in `samples`.  The result is sorted by
/// canonical ID.
pub fn collapse_duplicates(
    samples: Vec<PatientSample>,
    filter: &QualityFilter,
) -> Vec<PatientSample> {
    let num_samples = samples.len();
    let mut best: BTreeMap<String, PatientSample> = BTreeMap::new();
    for sample in samples {
        let code = filter.category(sample.variant.as_ref()).code();
        let replace = best
            .get(&sample.canonical_id)
            .map(|other| code >= filter.category(other.variant.as_ref()).code())
            .unwrap_or(true);
        if replace {
            best.insert(sample.canonical_id.clone(), sample);
        }
    }
    tracing::debug!(
        "collapsed {} records to {} patients",
        num_samples.separate_with_commas(),
        best.len().separate_with_commas()
    );
    best.into_values().collect()
}

/// Drop the calls of duplicate samples from the "all variants" view.
///
/// Per patient only the calls of one raw sample ID are kept: the canonical ID
/// itself if present, else the smallest raw ID.
pub fn drop_duplicate_samples(calls: Vec<VariantCall>, suffixes: &[String]) -> Vec<VariantCall> {
    let mut chosen: HashMap<String, String> = HashMap::new();
    for call in &calls {
        let canonical = canonical_id(call.sample(), suffixes);
        let raw = call.sample();
        let keep_current = match chosen.get(&canonical) {
            Some(current) => *current == canonical || (raw != canonical && current.as_str() <= raw),
            None => false,
        };
        if !keep_current {
            chosen.insert(canonical, raw.to_string());
        }
    }

    let num_calls = calls.len();
    let result = calls
        .into_iter()
        .filter(|call| {
            chosen
                .get(&canonical_id(call.sample(), suffixes))
                .map(|raw| raw == call.sample())
                .unwrap_or(false)
        })
        .collect::<Vec<_>>();
    tracing::debug!(
        "dropped {} calls of duplicate samples",
        (num_calls - result.len()).separate_with_commas()
    );
    result
}
