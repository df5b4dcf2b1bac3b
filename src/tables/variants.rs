//! Variant tables of the manuscript.
//!
//! The P/LP and VUS tables list the variants with anonymised patient IDs, the
//! summary counts variants by gene and classification.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    clean::output::AllVariantsRow,
    schema::{Category, Classification},
};

/// Selection of the variant table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Validated pathogenic or likely pathogenic variants.
    ValidatedPathogenic,
    /// Variants of uncertain significance.
    Vus,
}

impl Selection {
    fn contains(&self, row: &AllVariantsRow) -> bool {
        match self {
            Selection::ValidatedPathogenic => {
                row.new_category == Category::PathogenicLikelyPathogenic
                    && row.validation == Some(1)
            }
            Selection::Vus => row.new_category == Category::Vus,
        }
    }
}

/// One row of a variant table.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct VariantTableRow {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Primary Diagnosis")]
    pub primary_diagnosis: Option<String>,
    #[serde(rename = "Clinical Diagnosis")]
    pub clinical_diagnosis: String,
    #[serde(rename = "Family History")]
    pub family_history: Option<String>,
    #[serde(rename = "Gene Affected")]
    pub gene: Option<String>,
    #[serde(rename = "Variant")]
    pub variant: String,
    #[serde(rename = "Functional Category")]
    pub functional_category: Option<String>,
    #[serde(rename = "Classification")]
    pub classification: Option<String>,
}

/// Anonymised patient ID: digits of the sample ID prefixed by the cohort.
///
/// Non-digits become "_" and runs of "_" are collapsed, so "UK0001" turns into
/// "UK_0001".  Yale IDs get the prefix "Y".
pub fn anonymise(sample: &str, cohort: &str) -> String {
    let digits = sample
        .chars()
        .map(|c| if c.is_ascii_digit() { c } else { '_' })
        .collect::<String>();
    let prefixed = if cohort == "Yale" {
        format!("Y{}", digits)
    } else {
        format!("{}_{}", cohort, digits)
    };
    let mut result = String::with_capacity(prefixed.len());
    for c in prefixed.chars() {
        if !(c == '_' && result.ends_with('_')) {
            result.push(c);
        }
    }
    result
}

/// Strip the transcript/protein accession from an HGVS string.
fn strip_accession(hgvs: &str) -> &str {
    hgvs.split_once(':').map(|(_, change)| change).unwrap_or(hgvs)
}

/// Combined "HGVSc:HGVSp" notation, the protein part may be empty.
pub fn hgvs_variant(hgvs_c: Option<&str>, hgvs_p: Option<&str>) -> String {
    format!(
        "{}:{}",
        hgvs_c.map(strip_accession).unwrap_or_default(),
        hgvs_p.map(strip_accession).unwrap_or_default()
    )
}

/// Build the variant table of the `selection`, sorted by anonymised ID.
pub fn variant_table(rows: &[AllVariantsRow], selection: Selection) -> Vec<VariantTableRow> {
    let mut table = rows
        .iter()
        .filter(|row| selection.contains(row))
        .map(|row| VariantTableRow {
            id: anonymise(&row.sample, &row.cohort),
            primary_diagnosis: row.primary_diagnosis.clone(),
            clinical_diagnosis: row
                .known_syndrome
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
            family_history: row.family_history.map(|fh| fh.to_string()),
            gene: row.symbol.clone(),
            variant: hgvs_variant(row.hgvs_c.as_deref(), row.hgvs_p.as_deref()),
            functional_category: row.consequence.as_ref().map(|c| c.replace('_', " ")),
            classification: row.classification.map(|c| c.to_string()),
        })
        .collect::<Vec<_>>();
    table.sort_by(|a, b| a.id.cmp(&b.id));
    tracing::debug!("{:?} table has {} variants", selection, table.len());
    table
}

/// Per-gene variant counts.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryRow {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Pathogenic")]
    pub pathogenic: usize,
    #[serde(rename = "Likely Pathogenic")]
    pub likely_pathogenic: usize,
    #[serde(rename = "VUS")]
    pub vus: usize,
}

/// Count validated P/LP variants and VUS by gene, sorted by gene symbol.
pub fn variant_summary(rows: &[AllVariantsRow]) -> Vec<SummaryRow> {
    let mut by_symbol: BTreeMap<&str, SummaryRow> = BTreeMap::new();
    for row in rows {
        let symbol = match row.symbol.as_deref() {
            Some(symbol) => symbol,
            None => continue,
        };
        let validated = row.validation == Some(1);
        let (pathogenic, likely_pathogenic, vus) = match row.classification {
            Some(Classification::Pathogenic) if validated => (1, 0, 0),
            Some(Classification::LikelyPathogenic) if validated => (0, 1, 0),
            Some(Classification::UncertainSignificance) => (0, 0, 1),
            _ => continue,
        };
        let entry = by_symbol.entry(symbol).or_insert_with(|| SummaryRow {
            symbol: symbol.to_string(),
            ..Default::default()
        });
        entry.pathogenic += pathogenic;
        entry.likely_pathogenic += likely_pathogenic;
        entry.vus += vus;
    }
    by_symbol.into_values().collect()
}
