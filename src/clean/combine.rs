//! Cohort-level filters and concatenation of the cohorts.

use thousands::Separable;

use super::quality::QualityFilter;
use crate::schema::{PatientSample, VariantCall};

/// Access to the sample ID of per-sample records.
pub trait SampleId {
    fn sample_id(&self) -> &str;
}

impl SampleId for VariantCall {
    fn sample_id(&self) -> &str {
        self.sample()
    }
}

impl SampleId for PatientSample {
    fn sample_id(&self) -> &str {
        self.sample()
    }
}

/// Remove the records of blank / water control samples.
pub fn drop_control_samples<T: SampleId>(records: Vec<T>, controls: &regex::Regex) -> Vec<T> {
    let num_records = records.len();
    let result = records
        .into_iter()
        .filter(|record| !controls.is_match(record.sample_id()))
        .collect::<Vec<_>>();
    tracing::debug!(
        "removed {} records of control samples",
        (num_records - result.len()).separate_with_commas()
    );
    result
}

/// Remove calls on excluded genes from the "all variants" view.
pub fn drop_excluded_genes(calls: Vec<VariantCall>, filter: &QualityFilter) -> Vec<VariantCall> {
    calls
        .into_iter()
        .filter(|call| !filter.is_excluded_gene(&call.variant))
        .collect()
}

/// Null variants on excluded genes in the "most damaging" view.
///
/// The patient itself is kept.
pub fn null_excluded_genes(samples: &mut [PatientSample], filter: &QualityFilter) {
    for sample in samples.iter_mut() {
        if sample
            .variant
            .as_ref()
            .map(|variant| filter.is_excluded_gene(variant))
            .unwrap_or(false)
        {
            tracing::debug!("nulling excluded gene variant of sample {}", sample.sample());
            sample.variant = None;
        }
    }
}

/// Remove calls that are known false positives.
pub fn drop_false_positives(calls: Vec<VariantCall>, filter: &QualityFilter) -> Vec<VariantCall> {
    calls
        .into_iter()
        .filter(|call| !filter.is_false_positive(&call.variant))
        .collect()
}

/// Concatenate the per-cohort records in cohort order.
///
/// Samples are not deduplicated across cohorts.
pub fn combine_cohorts<T>(per_cohort: Vec<(String, Vec<T>)>) -> Vec<T> {
    let mut result = Vec::new();
    for (cohort, mut records) in per_cohort {
        tracing::info!(
            "cohort {} contributes {} records",
            &cohort,
            records.len().separate_with_commas()
        );
        result.append(&mut records);
    }
    result
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        conf::Conf,
        schema::{PhenotypeRecord, VariantRecord},
    };

    fn call(sample: &str, symbol: &str, exon: &str) -> VariantCall {
        VariantCall {
            cohort: "UK".into(),
            variant: VariantRecord {
                sample: sample.into(),
                symbol: Some(symbol.into()),
                exon: Some(exon.into()),
                ..Default::default()
            },
            phenotype: PhenotypeRecord {
                sample: sample.into(),
                ..Default::default()
            },
            family_history: None,
        }
    }

    #[test]
    fn filters() -> Result<(), anyhow::Error> {
        let conf = Conf::default();
        let filter = QualityFilter::from_conf(&conf);
        let calls = vec![
            call("S1", "FBN1", "2/65"),
            call("Blank_1", "FBN1", "2/65"),
            call("S2", "SMAD4", "3/11"),
            call("S3", "SKI", "01-Jul"),
            call("ddH2O", "ACTA2", "1/9"),
        ];

        let calls = drop_control_samples(calls, &conf.control_sample_regex()?);
        let calls = drop_excluded_genes(calls, &filter);
        let calls = drop_false_positives(calls, &filter);

        assert_eq!(
            vec!["S1"],
            calls.iter().map(|c| c.sample()).collect::<Vec<_>>()
        );

        Ok(())
    }

    #[test]
    fn null_excluded_keeps_patient() {
        let filter = QualityFilter::from_conf(&Conf::default());
        let mut samples = vec![
            PatientSample::from(call("S1", "SMAD4", "3/11")),
            PatientSample::from(call("S2", "SMAD3", "3/9")),
        ];

        null_excluded_genes(&mut samples, &filter);

        assert_eq!(None, samples[0].variant);
        assert!(samples[1].variant.is_some());
    }

    #[test]
    fn combine_keeps_cross_cohort_duplicates() {
        let combined = combine_cohorts(vec![
            ("UK".to_string(), vec![1, 2]),
            ("Yale".to_string(), vec![2, 3]),
        ]);

        assert_eq!(vec![1, 2, 2, 3], combined);
    }
}
