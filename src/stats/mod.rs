//! Implementation of the `risk-ratio` sub command.
//!
//! Summarizes the cleaned "most damaging" table by phenotype group: number of
//! patients, carriers of a validated pathogenic / likely pathogenic variant
//! and the risk ratio of being a carrier in the group versus outside of it.

pub mod risk_ratio;

use std::time::Instant;

use clap::Parser;
use serde::Serialize;
use thousands::Separable;

use self::risk_ratio::{Counts, RiskRatio};
use crate::{
    clean::output::MostDamagingRow,
    common::io::{read_csv, write_csv},
    schema::{AgeGroup, FamilyHistory, Gender},
};

/// Command line arguments for `risk-ratio` sub command.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Risk ratios of validated P/LP carriers by phenotype group",
    long_about = None
)]
pub struct Args {
    /// Path to the cleaned `Most_Damaging.csv` file.
    #[arg(long)]
    pub path_input: String,
    /// Path to the output CSV file.
    #[arg(long)]
    pub path_output: String,
}

/// Membership test of a patient in a group.
type Predicate = fn(&MostDamagingRow) -> bool;

/// A phenotype group of the table.
struct RiskGroup {
    label: &'static str,
    exposed: Predicate,
    /// Comparison group; `None` for the complement of `exposed`.
    not_exposed: Option<Predicate>,
}

/// Maximal aortic size (cm) up to which a patient is in the diameter group.
const DIAMETER_CM: f64 = 5.0;

fn groups() -> Vec<RiskGroup> {
    vec![
        RiskGroup {
            label: "Young Age, < 50",
            exposed: |row| row.age_group == Some(AgeGroup::Under50),
            not_exposed: Some(|row| row.age_group == Some(AgeGroup::Over50)),
        },
        RiskGroup {
            label: "Known or Probable Family History",
            exposed: |row| row.family_history == Some(FamilyHistory::Yes),
            not_exposed: Some(|row| row.family_history == Some(FamilyHistory::No)),
        },
        RiskGroup {
            label: "Male",
            exposed: |row| row.gender == Some(Gender::Male),
            not_exposed: Some(|row| row.gender == Some(Gender::Female)),
        },
        RiskGroup {
            label: "Ascending Aorta",
            exposed: |row| row.location.as_deref() == Some("Ascending"),
            not_exposed: None,
        },
        RiskGroup {
            label: "Presence of Dissection",
            exposed: |row| row.primary_diagnosis.as_deref() == Some("Dissection"),
            not_exposed: None,
        },
        RiskGroup {
            label: "Aortic Diameter (<=5cm)",
            exposed: |row| {
                row.maximal_aortic_size
                    .map(|size| size <= DIAMETER_CM)
                    .unwrap_or(false)
            },
            not_exposed: None,
        },
        RiskGroup {
            label: "No Long-Term Mortality",
            exposed: |row| row.long_term_mortality == Some(0),
            not_exposed: Some(|row| row.long_term_mortality == Some(1)),
        },
        RiskGroup {
            label: "Syndromic",
            exposed: |row| row.known_syndrome.is_some(),
            not_exposed: None,
        },
    ]
}

/// One row of the risk ratio table.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RiskRow {
    #[serde(rename = "Group")]
    pub group: String,
    #[serde(rename = "Total")]
    pub total: usize,
    #[serde(rename = "Number/Percentage with a Pathogenic or Likely Pathogenic Variant Validated by Sanger")]
    pub carriers: String,
    #[serde(rename = "RR(95% CI)")]
    pub risk_ratio: String,
}

/// Tally the two-by-two table of `group` over `rows`.
fn tally(group: &RiskGroup, rows: &[MostDamagingRow]) -> Counts {
    let mut counts = Counts::default();
    for row in rows {
        let exposed = (group.exposed)(row);
        let not_exposed = match group.not_exposed {
            Some(not_exposed) => not_exposed(row),
            None => !exposed,
        };
        if exposed || not_exposed {
            counts.add(exposed, row.is_validated_plp());
        }
    }
    counts
}

/// Compute the risk ratio table.
///
/// Counts and ratios that are undefined are rendered as "-".
pub fn risk_table(rows: &[MostDamagingRow]) -> Vec<RiskRow> {
    groups()
        .iter()
        .map(|group| {
            let counts = tally(group, rows);
            let total = counts.exposed();
            let carriers = if total == 0 {
                "-".to_string()
            } else {
                format!(
                    "{} ({:.1})",
                    counts.exposed_cases,
                    100.0 * counts.exposed_cases as f64 / total as f64
                )
            };
            let risk_ratio: Option<RiskRatio> = counts.into();
            tracing::debug!("{}: {:?}", group.label, &counts);
            RiskRow {
                group: group.label.to_string(),
                total,
                carriers,
                risk_ratio: risk_ratio
                    .map(|rr| rr.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            }
        })
        .collect()
}

/// Main entry point for `risk-ratio` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = Instant::now();
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let rows: Vec<MostDamagingRow> = read_csv(&args.path_input)?;
    tracing::info!(
        "read {} patients, {} with validated P/LP variant",
        rows.len().separate_with_commas(),
        rows.iter()
            .filter(|row| row.is_validated_plp())
            .count()
            .separate_with_commas()
    );
    let table = risk_table(&rows);
    write_csv(&args.path_output, &table)?;

    tracing::info!("wrote risk ratio table in {:?}", before_anything.elapsed());
    Ok(())
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        clean::quality::QualityFilter,
        conf::Conf,
        schema::{
            Classification, DepthStatus, PatientSample, PhenotypeRecord, SurvivalRecord,
            VariantRecord,
        },
    };

    fn row(
        sample: &str,
        age: f64,
        gender: Gender,
        plp: bool,
        long_term_mortality: Option<i64>,
    ) -> MostDamagingRow {
        let filter = QualityFilter::from_conf(&Conf::default());
        let sample = PatientSample {
            cohort: "UK".into(),
            canonical_id: sample.into(),
            phenotype: PhenotypeRecord {
                sample: sample.into(),
                gender: Some(gender),
                age_at_diagnosis: Some(age),
                ..Default::default()
            },
            variant: Some(VariantRecord {
                sample: sample.into(),
                symbol: Some("FBN1".into()),
                classification: Some(if plp {
                    Classification::Pathogenic
                } else {
                    Classification::UncertainSignificance
                }),
                validation: Some(1),
                ..Default::default()
            }),
            is_replacement: false,
            survival: Some(SurvivalRecord {
                sample: sample.into(),
                long_term_mortality,
                ..Default::default()
            }),
            family_history: None,
            depth: DepthStatus::High,
        };
        MostDamagingRow::from_sample(&sample, &filter)
    }

    fn rows() -> Vec<MostDamagingRow> {
        vec![
            row("S1000", 30.0, Gender::Male, true, Some(1)),
            row("S1001", 35.0, Gender::Male, true, None),
            row("S1002", 40.0, Gender::Female, false, Some(0)),
            row("S1003", 45.0, Gender::Male, false, Some(1)),
            row("S1004", 60.0, Gender::Female, true, Some(0)),
            row("S1005", 65.0, Gender::Female, false, Some(0)),
            row("S1006", 70.0, Gender::Male, false, None),
            row("S1007", 75.0, Gender::Female, false, Some(0)),
        ]
    }

    #[test]
    fn young_age() {
        let table = risk_table(&rows());

        // a=2 b=2 c=1 d=3
        assert_eq!(
            RiskRow {
                group: "Young Age, < 50".into(),
                total: 4,
                carriers: "2 (50.0)".into(),
                risk_ratio: "2.00 (0.28-14.20)".into(),
            },
            table[0]
        );
    }

    #[test]
    fn undefined_groups_render_dash() {
        let table = risk_table(&rows());
        let by_label = |label: &str| table.iter().find(|r| r.group == label).cloned();

        // nobody has a family history of "yes"
        let family = by_label("Known or Probable Family History");
        assert_eq!(Some(0), family.as_ref().map(|r| r.total));
        assert_eq!(Some("-".to_string()), family.as_ref().map(|r| r.carriers.clone()));
        assert_eq!(Some("-".to_string()), family.map(|r| r.risk_ratio));

        // nobody has a known syndrome
        let syndromic = by_label("Syndromic");
        assert_eq!(Some(0), syndromic.map(|r| r.total));
    }

    #[test]
    fn mortality_ignores_missing_survival() {
        let table = risk_table(&rows());
        let mortality = table
            .iter()
            .find(|r| r.group == "No Long-Term Mortality")
            .cloned();

        // exposed: S1002, S1004 (carrier), S1005, S1007; not exposed: S1000 (carrier), S1003
        assert_eq!(Some(4), mortality.as_ref().map(|r| r.total));
        assert_eq!(
            Some("1 (25.0)".to_string()),
            mortality.as_ref().map(|r| r.carriers.clone())
        );
        assert_eq!(
            Some("0.50 (0.06-4.47)".to_string()),
            mortality.map(|r| r.risk_ratio)
        );
    }

    #[test]
    fn diameter_complement_includes_missing_size() {
        let mut rows = rows();
        rows[0].maximal_aortic_size = Some(4.5);
        rows[2].maximal_aortic_size = Some(5.0);
        rows[4].maximal_aortic_size = Some(5.5);
        let table = risk_table(&rows);
        let diameter = table
            .iter()
            .find(|r| r.group == "Aortic Diameter (<=5cm)")
            .cloned();

        // exposed: S1000 (carrier), S1002; not exposed: the other six, two carriers
        assert_eq!(Some(2), diameter.as_ref().map(|r| r.total));
        assert_eq!(
            Some("1 (50.0)".to_string()),
            diameter.as_ref().map(|r| r.carriers.clone())
        );
        assert_eq!(
            Some("1.50 (0.25-8.98)".to_string()),
            diameter.map(|r| r.risk_ratio)
        );
    }

    #[test]
    fn run_writes_table() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path_input = tmp_dir.join("Most_Damaging.csv");
        let path_output = tmp_dir.join("risk_ratios.csv");
        write_csv(&path_input, &rows())?;
        let args = Args {
            path_input: path_input.to_string_lossy().into_owned(),
            path_output: path_output.to_string_lossy().into_owned(),
        };

        run(&crate::common::Args::default(), &args)?;

        let data = std::fs::read_to_string(&path_output)?;
        let lines = data.lines().collect::<Vec<_>>();
        assert_eq!(9, lines.len());
        assert!(lines[1].starts_with("\"Young Age, < 50\",4,2 (50.0),"));

        Ok(())
    }
}
