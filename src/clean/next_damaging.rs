//! Replacement of disqualified "most damaging" variants.
//!
//! If the most damaging variant of a sample is a known false positive or has
//! low allele balance, the highest scoring qualifying call of the same sample
//! takes its place.  Samples without such a call keep their original variant.

use std::{cmp::Ordering, collections::HashMap, collections::HashSet};

use thousands::Separable;

use super::quality::QualityFilter;
use crate::schema::{PatientSample, VariantCall};

/// Compare two optional scores, a missing score ranks lowest.
fn cmp_score(lhs: Option<f64>, rhs: Option<f64>) -> Ordering {
    match (lhs, rhs) {
        (Some(lhs), Some(rhs)) => lhs.partial_cmp(&rhs).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Select the best qualifying call for each of the `flagged` samples.
///
/// Ties in score go to the call appearing first in `all_calls`.
fn find_candidates<'a>(
    flagged: &HashSet<&str>,
    all_calls: &'a [VariantCall],
    filter: &QualityFilter,
) -> HashMap<&'a str, &'a VariantCall> {
    let mut best: HashMap<&str, &VariantCall> = HashMap::new();
    for call in all_calls {
        if !flagged.contains(call.sample()) || filter.is_disqualified(&call.variant) {
            continue;
        }
        let better = best
            .get(call.sample())
            .map(|other| {
                cmp_score(call.variant.score, other.variant.score) == Ordering::Greater
            })
            .unwrap_or(true);
        if better {
            best.insert(call.sample(), call);
        }
    }
    best
}

/// Build the per-sample "most damaging" records with replacements applied.
///
/// The result holds one record per sample ID, sorted by sample ID.  A
/// replacement takes priority over the original record of its sample and is
/// marked with `is_replacement`.
pub fn resolve_next_most_damaging(
    most_damaging: Vec<VariantCall>,
    all_calls: &[VariantCall],
    filter: &QualityFilter,
) -> Vec<PatientSample> {
    let flagged = most_damaging
        .iter()
        .filter(|call| call.variant.has_data() && filter.is_disqualified(&call.variant))
        .map(|call| call.sample())
        .collect::<HashSet<_>>();
    let candidates = find_candidates(&flagged, all_calls, filter);
    tracing::info!(
        "{} samples with disqualified most damaging variant, {} replaced by next most damaging",
        flagged.len().separate_with_commas(),
        candidates.len().separate_with_commas()
    );

    let mut replacements = candidates
        .into_values()
        .map(|call| {
            tracing::debug!(
                "sample {}: replacing most damaging variant with {:?} {:?} (score {:?})",
                call.sample(),
                &call.variant.symbol,
                &call.variant.hgvs_c,
                &call.variant.score
            );
            PatientSample {
                is_replacement: true,
                ..PatientSample::from(call.clone())
            }
        })
        .collect::<Vec<_>>();
    replacements.extend(most_damaging.into_iter().map(PatientSample::from));
    let mut samples = replacements;
    samples.sort_by(|a, b| {
        a.sample()
            .cmp(b.sample())
            .then_with(|| b.is_replacement.cmp(&a.is_replacement))
    });
    samples.dedup_by(|later, earlier| later.sample() == earlier.sample());

    samples
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        conf::Conf,
        schema::{Classification, PhenotypeRecord, VariantRecord},
    };

    fn call(sample: &str, symbol: &str, exon: &str, ab: f64, score: Option<f64>) -> VariantCall {
        VariantCall {
            cohort: "UK".into(),
            variant: VariantRecord {
                sample: sample.into(),
                symbol: Some(symbol.into()),
                exon: Some(exon.into()),
                ab: Some(ab),
                score,
                classification: Some(Classification::LikelyPathogenic),
                ..Default::default()
            },
            phenotype: PhenotypeRecord {
                sample: sample.into(),
                ..Default::default()
            },
            family_history: None,
        }
    }

    fn all_calls() -> Vec<VariantCall> {
        vec![
            call("S1", "SKI", "1/7", 0.5, Some(30.0)),
            call("S1", "FBN1", "20/65", 0.45, Some(10.0)),
            call("S1", "TGFBR2", "4/7", 0.48, Some(12.0)),
            call("S1", "ACTA2", "3/9", 0.48, Some(12.0)),
            call("S1", "MYH11", "8/41", 0.1, Some(25.0)),
            call("S2", "COL3A1", "2/51", 0.2, Some(20.0)),
            call("S3", "SMAD3", "6/9", 0.5, Some(15.0)),
            call("S3", "LOX", "1/7", 0.5, None),
        ]
    }

    #[test]
    fn replaces_disqualified() {
        let filter = QualityFilter::from_conf(&Conf::default());
        let most_damaging = vec![
            call("S3", "SMAD3", "6/9", 0.5, Some(15.0)),
            call("S1", "SKI", "01-Jul", 0.5, Some(30.0)),
            call("S2", "COL3A1", "2/51", 0.2, Some(20.0)),
        ];

        let resolved = resolve_next_most_damaging(most_damaging, &all_calls(), &filter);

        assert_eq!(
            vec!["S1", "S2", "S3"],
            resolved.iter().map(|s| s.sample()).collect::<Vec<_>>()
        );
        // ties in score go to the first call
        assert_eq!(
            Some("TGFBR2".to_string()),
            resolved[0].variant.as_ref().and_then(|v| v.symbol.clone())
        );
        assert!(resolved[0].is_replacement);
        // no candidate, original is kept
        assert_eq!(
            Some("COL3A1".to_string()),
            resolved[1].variant.as_ref().and_then(|v| v.symbol.clone())
        );
        assert!(!resolved[1].is_replacement);
        assert!(!resolved[2].is_replacement);
    }

    #[test]
    fn replacements_are_terminal_and_deterministic() {
        let filter = QualityFilter::from_conf(&Conf::default());
        let most_damaging = || {
            vec![
                call("S1", "SKI", "1/7", 0.5, Some(30.0)),
                call("S1", "SKI", "1/7", 0.5, Some(30.0)),
                call("S2", "COL3A1", "2/51", 0.2, Some(20.0)),
            ]
        };

        let first = resolve_next_most_damaging(most_damaging(), &all_calls(), &filter);
        let second = resolve_next_most_damaging(most_damaging(), &all_calls(), &filter);

        assert_eq!(first, second);
        assert_eq!(2, first.len());
        for sample in first.iter().filter(|s| s.is_replacement) {
            let variant = sample.variant.as_ref().expect("replacement has variant");
            assert!(!filter.is_disqualified(variant));
        }
    }

    #[test]
    fn empty_most_damaging_is_not_replaced() {
        let filter = QualityFilter::from_conf(&Conf::default());
        let empty = VariantCall {
            variant: VariantRecord {
                sample: "S4".into(),
                ..Default::default()
            },
            ..call("S4", "FBN1", "1/65", 0.5, None)
        };
        let mut all_calls = all_calls();
        all_calls.push(call("S4", "FBN1", "20/65", 0.5, Some(40.0)));

        let resolved = resolve_next_most_damaging(vec![empty], &all_calls, &filter);

        assert_eq!(1, resolved.len());
        assert!(!resolved[0].is_replacement);
        assert_eq!(
            Some(VariantRecord {
                sample: "S4".into(),
                ..Default::default()
            }),
            resolved[0].variant
        );
    }

    #[test]
    fn missing_score_ranks_lowest() {
        assert_eq!(Ordering::Greater, cmp_score(Some(-1.0), None));
        assert_eq!(Ordering::Less, cmp_score(None, Some(0.0)));
        assert_eq!(Ordering::Equal, cmp_score(None, None));
    }
}
