//! Combination of per-assay coverage rows into per-sample depth records.

use std::collections::BTreeMap;

use crate::schema::DepthRecord;

/// One row of a per-assay coverage summary.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageRow {
    /// Sample identifier.
    pub sample_id: String,
    /// Number of reads of the sample in the assay.
    pub total: f64,
    /// Percentage of bases with depth above 49.
    pub pct_above_49: f64,
    /// Percentage of bases with depth above 99.
    pub pct_above_99: f64,
}

/// Combine the coverage rows of one cohort into one record per sample.
///
/// `ABS_Total` is the sum of the reads over all rows of a sample, the
/// percentages are averaged with the read counts as weights.  Samples
/// without any reads are excluded.  The result is sorted by sample ID.
pub fn recalculate(rows: &[CoverageRow]) -> Vec<DepthRecord> {
    let mut by_sample: BTreeMap<&str, Vec<&CoverageRow>> = BTreeMap::new();
    for row in rows {
        by_sample.entry(row.sample_id.as_str()).or_default().push(row);
    }

    by_sample
        .into_iter()
        .filter_map(|(sample_id, rows)| {
            let abs_total: f64 = rows.iter().map(|row| row.total).sum();
            if abs_total == 0.0 {
                tracing::debug!("sample {} has no reads, skipping", sample_id);
                return None;
            }
            let weighted = |pct: fn(&CoverageRow) -> f64| {
                rows.iter()
                    .map(|row| pct(row) * row.total / abs_total)
                    .sum::<f64>()
            };
            Some(DepthRecord {
                sample_id: sample_id.to_string(),
                abs_total,
                pct_above_49: weighted(|row| row.pct_above_49),
                pct_above_99: weighted(|row| row.pct_above_99),
            })
        })
        .collect()
}

/// Average the records of samples that occur in more than one cohort.
///
/// The result is sorted by sample ID.
pub fn average_duplicates(records: Vec<DepthRecord>) -> Vec<DepthRecord> {
    let mut by_sample: BTreeMap<String, Vec<DepthRecord>> = BTreeMap::new();
    for record in records {
        by_sample
            .entry(record.sample_id.clone())
            .or_default()
            .push(record);
    }

    by_sample
        .into_iter()
        .map(|(sample_id, records)| {
            if records.len() > 1 {
                tracing::debug!(
                    "averaging {} depth records of sample {}",
                    records.len(),
                    &sample_id
                );
            }
            let n = records.len() as f64;
            let mean = |value: fn(&DepthRecord) -> f64| records.iter().map(value).sum::<f64>() / n;
            DepthRecord {
                abs_total: mean(|r| r.abs_total),
                pct_above_49: mean(|r| r.pct_above_49),
                pct_above_99: mean(|r| r.pct_above_99),
                sample_id,
            }
        })
        .collect()
}

#[cfg(test)]
mod test {
    use float_cmp::approx_eq;
    use pretty_assertions::assert_eq;

    use super::*;

    fn row(sample_id: &str, total: f64, pct_above_49: f64, pct_above_99: f64) -> CoverageRow {
        CoverageRow {
            sample_id: sample_id.into(),
            total,
            pct_above_49,
            pct_above_99,
        }
    }

    #[test]
    fn read_weighted_percentages() {
        let rows = vec![
            row("S1", 100.0, 80.0, 50.0),
            row("S2", 0.0, 90.0, 90.0),
            row("S1", 300.0, 60.0, 30.0),
        ];

        let records = recalculate(&rows);

        assert_eq!(1, records.len());
        assert_eq!("S1", records[0].sample_id);
        assert!(approx_eq!(f64, 400.0, records[0].abs_total, ulps = 2));
        assert!(approx_eq!(f64, 65.0, records[0].pct_above_49, epsilon = 1e-9));
        assert!(approx_eq!(f64, 35.0, records[0].pct_above_99, epsilon = 1e-9));
    }

    #[test]
    fn average_across_cohorts() {
        let records = vec![
            DepthRecord {
                sample_id: "S2".into(),
                abs_total: 10.0,
                pct_above_49: 90.0,
                pct_above_99: 50.0,
            },
            DepthRecord {
                sample_id: "S1".into(),
                abs_total: 100.0,
                pct_above_49: 70.0,
                pct_above_99: 40.0,
            },
            DepthRecord {
                sample_id: "S1".into(),
                abs_total: 300.0,
                pct_above_49: 90.0,
                pct_above_99: 60.0,
            },
        ];

        let averaged = average_duplicates(records);

        assert_eq!(
            vec!["S1", "S2"],
            averaged.iter().map(|r| r.sample_id.as_str()).collect::<Vec<_>>()
        );
        assert!(approx_eq!(f64, 200.0, averaged[0].abs_total, ulps = 2));
        assert!(approx_eq!(f64, 80.0, averaged[0].pct_above_49, ulps = 2));
        assert!(approx_eq!(f64, 50.0, averaged[0].pct_above_99, ulps = 2));
    }
}
