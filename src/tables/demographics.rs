//! Patient demographics per cohort.
//!
//! Only patients whose sequencing depth passed the threshold are counted.
//! Each cohort gets one column (in order of first appearance) followed by a
//! column for the whole cohort.

use std::path::Path;

use crate::{
    clean::output::MostDamagingRow,
    common::io::open_write_maybe_gz,
    schema::{DepthStatus, FamilyHistory, Gender},
};

/// Maximal aortic size (cm) below which a patient counts as "small diameter".
const SMALL_DIAMETER_CM: f64 = 5.5;

/// The demographics table as header plus labelled rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demographics {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Demographics {
    /// Value of row `label` in column `column`.
    pub fn get(&self, label: &str, column: &str) -> Option<&str> {
        let idx = self.header.iter().position(|name| name == column)?;
        self.rows
            .iter()
            .find(|row| row.first().map(String::as_str) == Some(label))
            .and_then(|row| row.get(idx))
            .map(String::as_str)
    }

    /// Write the table as CSV to `path`.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), anyhow::Error> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(open_write_maybe_gz(path.as_ref()).map_err(|e| {
                anyhow::anyhow!("could not open {:?} for writing: {}", path.as_ref(), e)
            })?);
        writer.write_record(&self.header)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// "n (pct)" of `count` out of `total`, "-" for an empty group.
fn number(count: usize, total: usize) -> String {
    if total == 0 {
        "-".to_string()
    } else {
        format!("{} ({:.1})", count, 100.0 * count as f64 / total as f64)
    }
}

fn count<F>(cohort: &[&MostDamagingRow], pred: F) -> String
where
    F: Fn(&MostDamagingRow) -> bool,
{
    number(cohort.iter().filter(|row| pred(row)).count(), cohort.len())
}

/// Median, minimum and maximum of the present values.
fn median_min_max<F>(cohort: &[&MostDamagingRow], value: F) -> [String; 3]
where
    F: Fn(&MostDamagingRow) -> Option<f64>,
{
    let mut values = cohort.iter().filter_map(|row| value(row)).collect::<Vec<_>>();
    if values.is_empty() {
        return ["-".to_string(), "-".to_string(), "-".to_string()];
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    let median = if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    };
    [
        format!("{:.1}", median),
        format!("{:.1}", values[0]),
        format!("{:.1}", values[values.len() - 1]),
    ]
}

fn diagnosis_starts_with(row: &MostDamagingRow, prefixes: &[&str]) -> bool {
    row.primary_diagnosis
        .as_deref()
        .map(|diagnosis| prefixes.iter().any(|p| diagnosis.starts_with(p)))
        .unwrap_or(false)
}

fn is_operated(row: &MostDamagingRow) -> bool {
    [
        row.operations_endovascular,
        row.operations_open,
        row.operations_hybrid,
    ]
    .iter()
    .any(|n| n.map(|n| n > 0.0).unwrap_or(false))
}

fn syndrome_is(row: &MostDamagingRow, name: &str) -> bool {
    row.known_syndrome.as_deref() == Some(name)
}

fn is_other_syndrome(row: &MostDamagingRow) -> bool {
    match row.known_syndrome.as_deref() {
        Some(syndrome) => !["Marfan", "LDS", "EDS", "-"]
            .iter()
            .any(|name| syndrome.contains(name)),
        None => false,
    }
}

/// Labelled values of one column.
fn column(cohort: &[&MostDamagingRow], num_passed: usize) -> Vec<(&'static str, String)> {
    let [age_median, age_min, age_max] = median_min_max(cohort, |row| row.age_at_diagnosis);
    let [size_median, size_min, size_max] =
        median_min_max(cohort, |row| row.maximal_aortic_size);
    let location = |row: &MostDamagingRow| row.location.clone().unwrap_or_default();

    vec![
        ("Demographics", String::new()),
        ("Numbers (%)", number(cohort.len(), num_passed)),
        ("Age at Diagnosis, Median", age_median),
        ("Age at Diagnosis, Min", age_min),
        ("Age at Diagnosis, Max", age_max),
        ("Male (%)", count(cohort, |row| row.gender == Some(Gender::Male))),
        ("Female (%)", count(cohort, |row| row.gender == Some(Gender::Female))),
        (
            "Probable/Proven Family History (%)",
            count(cohort, |row| row.family_history == Some(FamilyHistory::Yes)),
        ),
        (
            "No Family History (%)",
            count(cohort, |row| row.family_history == Some(FamilyHistory::No)),
        ),
        ("Undergone Aortic Surgery (%)", count(cohort, is_operated)),
        ("Primary Aortic Pathology", String::new()),
        (
            "Aneurysm (%)",
            count(cohort, |row| row.primary_diagnosis.as_deref() == Some("Aneurysm")),
        ),
        (
            "Dissection (%)",
            count(cohort, |row| {
                row.primary_diagnosis.as_deref() == Some("Dissection")
            }),
        ),
        (
            "IMH/PAU (%)",
            count(cohort, |row| diagnosis_starts_with(row, &["IMH", "PAU"])),
        ),
        (
            "Rupture (%)",
            count(cohort, |row| diagnosis_starts_with(row, &["Rupture"])),
        ),
        ("Primary Anatomical Presentation", String::new()),
        (
            "Ascending/Arch (%)",
            count(cohort, |row| {
                let location = location(row);
                location.contains("Ascending") || location.contains("Arch")
            }),
        ),
        (
            "Descending/Thoracoabdominal (%)",
            count(cohort, |row| {
                let location = location(row);
                ["Descending", "Thoracoabdominal", "Infrarenal"]
                    .iter()
                    .any(|p| location.starts_with(p))
            }),
        ),
        ("Aortic Size", String::new()),
        ("Maximum Aortic Diameter (cm), Median", size_median),
        ("Maximum Aortic Diameter (cm), Min", size_min),
        ("Maximum Aortic Diameter (cm), Max", size_max),
        (
            "Maximum Aortic Diameter < 5.5cm (%)",
            count(cohort, |row| {
                row.maximal_aortic_size
                    .map(|size| size < SMALL_DIAMETER_CM)
                    .unwrap_or(false)
            }),
        ),
        ("Known Syndrome", String::new()),
        ("MFS (%)", count(cohort, |row| syndrome_is(row, "Marfan"))),
        ("LDS (%)", count(cohort, |row| syndrome_is(row, "LDS"))),
        ("EDS (%)", count(cohort, |row| syndrome_is(row, "EDS"))),
        ("Other (%)", count(cohort, is_other_syndrome)),
    ]
}

/// Build the demographics table of the "most damaging" rows.
pub fn demographics_table(rows: &[MostDamagingRow]) -> Demographics {
    let passed = rows
        .iter()
        .filter(|row| row.depth != DepthStatus::Low)
        .collect::<Vec<_>>();
    let mut cohorts: Vec<&str> = Vec::new();
    for row in &passed {
        if !cohorts.contains(&row.cohort.as_str()) {
            cohorts.push(row.cohort.as_str());
        }
    }
    tracing::debug!(
        "{} of {} patients passed depth, cohorts {:?}",
        passed.len(),
        rows.len(),
        &cohorts
    );

    let mut header = vec![String::new()];
    let mut columns = Vec::new();
    for cohort in &cohorts {
        let members = passed
            .iter()
            .filter(|row| row.cohort == *cohort)
            .copied()
            .collect::<Vec<_>>();
        header.push(format!("{} Cohort", cohort));
        columns.push(column(&members, passed.len()));
    }
    header.push("Whole Cohort".to_string());
    columns.push(column(&passed, passed.len()));

    let labels = column(&[], 0)
        .into_iter()
        .map(|(label, _)| label)
        .collect::<Vec<_>>();
    let rows = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let mut row = vec![label.to_string()];
            row.extend(columns.iter().map(|column| column[i].1.clone()));
            row
        })
        .collect();

    Demographics { header, rows }
}
