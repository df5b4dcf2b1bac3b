//! Typed records shared by all pipeline stages.
//!
//! Every column the pipeline looks at by name is an explicit field here.  A
//! missing cell is `None`; the various spreadsheet sentinels are removed by
//! the normalizer before records are built.

use serde::{Deserialize, Serialize};

/// Clinical classification of a variant as found in the genotype sheets.
#[derive(
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Copy,
    Debug,
    strum::Display,
    strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Classification {
    /// Pathogenic
    #[serde(rename = "Pathogenic")]
    #[strum(serialize = "Pathogenic")]
    Pathogenic,
    /// Likely pathogenic
    #[serde(rename = "Likely Pathogenic")]
    #[strum(serialize = "Likely Pathogenic")]
    LikelyPathogenic,
    /// Variant of uncertain significance
    #[serde(rename = "Uncertain Significance")]
    #[strum(serialize = "Uncertain Significance")]
    UncertainSignificance,
    /// Not classified
    #[serde(rename = "Not Classified")]
    #[strum(serialize = "Not Classified")]
    NotClassified,
    /// Likely benign
    #[serde(rename = "Likely Benign")]
    #[strum(serialize = "Likely Benign")]
    LikelyBenign,
    /// Benign
    #[serde(rename = "Benign")]
    #[strum(serialize = "Benign")]
    Benign,
    /// Placeholder used by some sheets for samples without call
    #[serde(rename = "No Variant")]
    #[strum(serialize = "No Variant")]
    NoVariant,
}

/// The three-tier category used throughout the manuscript.
#[derive(
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Clone,
    Copy,
    Debug,
    strum::Display,
    strum::EnumString,
)]
pub enum Category {
    /// Likely benign, benign, not classified or no variant at all
    #[serde(rename = "Likely Benign / No Variant")]
    #[strum(serialize = "Likely Benign / No Variant")]
    LikelyBenignNoVariant,
    /// Variant of uncertain significance
    #[serde(rename = "VUS")]
    #[strum(serialize = "VUS")]
    Vus,
    /// Pathogenic or likely pathogenic
    #[serde(rename = "Pathogenic/Likely Pathogenic")]
    #[strum(serialize = "Pathogenic/Likely Pathogenic")]
    PathogenicLikelyPathogenic,
}

impl Category {
    /// Numeric code, larger is more damaging.
    pub fn code(&self) -> u8 {
        match self {
            Category::LikelyBenignNoVariant => 1,
            Category::Vus => 2,
            Category::PathogenicLikelyPathogenic => 3,
        }
    }
}

impl From<Option<Classification>> for Category {
    fn from(classification: Option<Classification>) -> Self {
        match classification {
            Some(Classification::Pathogenic) | Some(Classification::LikelyPathogenic) => {
                Category::PathogenicLikelyPathogenic
            }
            Some(Classification::UncertainSignificance) => Category::Vus,
            Some(Classification::NotClassified)
            | Some(Classification::LikelyBenign)
            | Some(Classification::Benign)
            | Some(Classification::NoVariant)
            | None => Category::LikelyBenignNoVariant,
        }
    }
}

/// Patient gender.
#[derive(
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Copy,
    Debug,
    strum::Display,
    strum::EnumString,
)]
pub enum Gender {
    Male,
    Female,
}

/// Merged family history.
#[derive(
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Copy,
    Debug,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FamilyHistory {
    Yes,
    No,
    Unknown,
}

/// Age group at diagnosis.
#[derive(
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Copy,
    Debug,
    strum::Display,
    strum::EnumString,
)]
pub enum AgeGroup {
    #[serde(rename = "Under 50")]
    #[strum(serialize = "Under 50")]
    Under50,
    #[serde(rename = "Over 50")]
    #[strum(serialize = "Over 50")]
    Over50,
}

impl AgeGroup {
    /// Age group for the given age at diagnosis.
    pub fn from_age(age: Option<f64>) -> Option<Self> {
        match age {
            Some(age) if age < 50.0 => Some(AgeGroup::Under50),
            Some(age) if age >= 50.0 => Some(AgeGroup::Over50),
            _ => None,
        }
    }
}

/// Two-way split of the primary diagnosis location.
#[derive(
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Copy,
    Debug,
    strum::Display,
    strum::EnumString,
)]
pub enum SimpleLocation {
    Ascending,
    #[serde(rename = "Not Ascending")]
    #[strum(serialize = "Not Ascending")]
    NotAscending,
}

impl SimpleLocation {
    /// Simplify a (normalized) location of primary diagnosis.
    pub fn from_location(location: Option<&str>) -> Option<Self> {
        location.map(|location| {
            if location.contains("Ascending") {
                SimpleLocation::Ascending
            } else {
                SimpleLocation::NotAscending
            }
        })
    }
}

/// Sequencing depth status of a sample.
#[derive(
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Copy,
    Debug,
    Default,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum DepthStatus {
    #[default]
    High,
    Low,
}

/// One called variant for one sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantRecord {
    /// Sample identifier.
    pub sample: String,
    /// Allele depth as given in the sheet.
    pub ad: Option<String>,
    /// Allele balance, fraction of alternate reads.
    pub ab: Option<f64>,
    /// Variant UID.
    pub uid: Option<String>,
    /// Validation status (1 = confirmed, 2 = not confirmed, 0 = not done).
    pub validation: Option<i64>,
    /// Clinical classification.
    pub classification: Option<Classification>,
    /// Damage rank score, higher is more damaging.
    pub score: Option<f64>,
    /// Gene symbol.
    pub symbol: Option<String>,
    /// Combined HGVS description.
    pub hgvs: Option<String>,
    /// Chromosome name.
    pub chrom: Option<String>,
    /// 1-based position.
    pub pos: Option<u64>,
    /// Reference allele.
    pub ref_allele: Option<String>,
    /// Alternate allele.
    pub alt_allele: Option<String>,
    /// Consequence / effect.
    pub consequence: Option<String>,
    /// HGVS coding notation.
    pub hgvs_c: Option<String>,
    /// HGVS protein notation.
    pub hgvs_p: Option<String>,
    /// Exon label, e.g., "1/7".
    pub exon: Option<String>,
    /// Intron label.
    pub intron: Option<String>,
}

impl VariantRecord {
    /// Whether the record carries any variant information at all.
    ///
    /// Rows of samples without any call have symbol, exon and allele
    /// balance all empty.
    pub fn has_data(&self) -> bool {
        self.symbol.is_some() || self.exon.is_some() || self.ab.is_some()
    }

    /// Whether the call was confirmed by Sanger sequencing.
    pub fn is_validated(&self) -> bool {
        self.validation == Some(1)
    }
}

/// Clinical attributes of one patient.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhenotypeRecord {
    /// Sample identifier.
    pub sample: String,
    pub gender: Option<Gender>,
    pub age_at_diagnosis: Option<f64>,
    pub age_at_surgery: Option<f64>,
    pub primary_diagnosis: Option<String>,
    pub location: Option<String>,
    pub aortic_size_at_diagnosis: Option<f64>,
    pub maximal_aortic_size: Option<f64>,
    /// Raw proven family history, e.g., "yes", "no", "unknown".
    pub proven_family_history: Option<String>,
    /// Raw probable family history.
    pub probable_family_history: Option<String>,
    pub known_syndrome: Option<String>,
    pub extra_aortic_disease: Option<String>,
    pub operations_endovascular: Option<f64>,
    pub operations_open: Option<f64>,
    pub operations_hybrid: Option<f64>,
}

/// Fill `dst` from `src` if `dst` is missing.
fn fill<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
    if dst.is_none() {
        dst.clone_from(src);
    }
}

fn render<T: ToString>(value: &Option<T>) -> Option<String> {
    value.as_ref().map(|v| v.to_string())
}

impl PhenotypeRecord {
    /// Fill missing phenotype fields from `other`, never overwriting values.
    pub fn fill_missing_from(&mut self, other: &PhenotypeRecord) {
        fill(&mut self.gender, &other.gender);
        fill(&mut self.age_at_diagnosis, &other.age_at_diagnosis);
        fill(&mut self.age_at_surgery, &other.age_at_surgery);
        fill(&mut self.primary_diagnosis, &other.primary_diagnosis);
        fill(&mut self.location, &other.location);
        fill(
            &mut self.aortic_size_at_diagnosis,
            &other.aortic_size_at_diagnosis,
        );
        fill(&mut self.maximal_aortic_size, &other.maximal_aortic_size);
        fill(&mut self.proven_family_history, &other.proven_family_history);
        fill(
            &mut self.probable_family_history,
            &other.probable_family_history,
        );
        fill(&mut self.known_syndrome, &other.known_syndrome);
        fill(&mut self.extra_aortic_disease, &other.extra_aortic_disease);
        fill(
            &mut self.operations_endovascular,
            &other.operations_endovascular,
        );
        fill(&mut self.operations_open, &other.operations_open);
        fill(&mut self.operations_hybrid, &other.operations_hybrid);
    }

    /// The designated phenotype fields as `(column, rendered value)` pairs.
    pub fn field_values(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("Gender", render(&self.gender)),
            ("age at diagnosis", render(&self.age_at_diagnosis)),
            ("age_at_surgery", render(&self.age_at_surgery)),
            ("primary diagnosis", self.primary_diagnosis.clone()),
            ("location of primary diagnosis", self.location.clone()),
            (
                "aortic size at diagnosis (cm)",
                render(&self.aortic_size_at_diagnosis),
            ),
            ("maximal aortic size (cm)", render(&self.maximal_aortic_size)),
            ("proven family_history", self.proven_family_history.clone()),
            (
                "probable family_history",
                self.probable_family_history.clone(),
            ),
            ("Known Syndrome", self.known_syndrome.clone()),
            (
                "extra-aortic aneurysmal disease",
                self.extra_aortic_disease.clone(),
            ),
            (
                "No.of Aortic Operations - Endovascular",
                render(&self.operations_endovascular),
            ),
            (
                "No.of Aortic Operations - Open",
                render(&self.operations_open),
            ),
            (
                "No.of Aortic Operations - Hybrid",
                render(&self.operations_hybrid),
            ),
        ]
    }

    /// Whether none of the designated phenotype fields carries a value.
    pub fn is_empty(&self) -> bool {
        self.field_values().iter().all(|(_, value)| value.is_none())
    }
}

/// Survival / outcome data of one patient.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurvivalRecord {
    /// Sample identifier.
    pub sample: String,
    /// Long-term mortality (0 = no, 1 = yes).
    pub long_term_mortality: Option<i64>,
    /// Type of surgery (0 = elective, 1 = urgent/emergent).
    pub surgery_type: Option<i64>,
    /// Peri-operative mortality (0 = no, 1 = yes).
    pub perioperative_mortality: Option<i64>,
}

/// One row of the "all variants" view.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantCall {
    /// Cohort label.
    pub cohort: String,
    /// The called variant.
    pub variant: VariantRecord,
    /// Phenotype of the sample.
    pub phenotype: PhenotypeRecord,
    /// Derived family history.
    pub family_history: Option<FamilyHistory>,
}

impl VariantCall {
    pub fn sample(&self) -> &str {
        &self.variant.sample
    }
}

/// One patient with its selected ("most damaging") variant.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientSample {
    /// Cohort label.
    pub cohort: String,
    /// Sample ID with any duplicate suffix stripped.
    pub canonical_id: String,
    /// Phenotype of the patient, carries the raw sample ID.
    pub phenotype: PhenotypeRecord,
    /// The selected variant, `None` once genotype fields were nulled.
    pub variant: Option<VariantRecord>,
    /// Whether `variant` is a next-most-damaging replacement.
    pub is_replacement: bool,
    /// Survival data, if available for the cohort.
    pub survival: Option<SurvivalRecord>,
    /// Derived family history.
    pub family_history: Option<FamilyHistory>,
    /// Depth status.
    pub depth: DepthStatus,
}

impl PatientSample {
    pub fn sample(&self) -> &str {
        &self.phenotype.sample
    }
}

impl From<VariantCall> for PatientSample {
    fn from(call: VariantCall) -> Self {
        Self {
            cohort: call.cohort,
            canonical_id: call.phenotype.sample.clone(),
            phenotype: call.phenotype,
            variant: Some(call.variant),
            is_replacement: false,
            survival: None,
            family_history: call.family_history,
            depth: DepthStatus::High,
        }
    }
}

/// Combined coverage statistics of one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthRecord {
    /// Sample identifier.
    pub sample_id: String,
    /// Total number of reads over all assays.
    #[serde(rename = "ABS_Total")]
    pub abs_total: f64,
    /// Read-weighted percentage of bases with depth above 49.
    #[serde(rename = "%_bases_above_49")]
    pub pct_above_49: f64,
    /// Read-weighted percentage of bases with depth above 99.
    #[serde(rename = "%_bases_above_99")]
    pub pct_above_99: f64,
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;

    use super::*;

    #[rstest::rstest]
    #[case("Pathogenic", Classification::Pathogenic)]
    #[case("Likely Pathogenic", Classification::LikelyPathogenic)]
    #[case("likely pathogenic", Classification::LikelyPathogenic)]
    #[case("Uncertain Significance", Classification::UncertainSignificance)]
    #[case("Not Classified", Classification::NotClassified)]
    #[case("Benign", Classification::Benign)]
    #[case("No Variant", Classification::NoVariant)]
    fn classification_from_str(#[case] raw: &str, #[case] expected: Classification) {
        assert_eq!(expected, Classification::from_str(raw).unwrap());
    }

    #[rstest::rstest]
    #[case(Some(Classification::Pathogenic), Category::PathogenicLikelyPathogenic, 3)]
    #[case(Some(Classification::LikelyPathogenic), Category::PathogenicLikelyPathogenic, 3)]
    #[case(Some(Classification::UncertainSignificance), Category::Vus, 2)]
    #[case(Some(Classification::NotClassified), Category::LikelyBenignNoVariant, 1)]
    #[case(Some(Classification::Benign), Category::LikelyBenignNoVariant, 1)]
    #[case(None, Category::LikelyBenignNoVariant, 1)]
    fn category_from_classification(
        #[case] classification: Option<Classification>,
        #[case] expected: Category,
        #[case] code: u8,
    ) {
        let category = Category::from(classification);

        assert_eq!(expected, category);
        assert_eq!(code, category.code());
    }

    #[test]
    fn display_matches_sheet_labels() {
        assert_eq!(
            "Likely Benign / No Variant",
            Category::LikelyBenignNoVariant.to_string()
        );
        assert_eq!(
            "Pathogenic/Likely Pathogenic",
            Category::PathogenicLikelyPathogenic.to_string()
        );
        assert_eq!("unknown", FamilyHistory::Unknown.to_string());
        assert_eq!("Under 50", AgeGroup::Under50.to_string());
        assert_eq!("LOW", DepthStatus::Low.to_string());
        assert_eq!("Not Ascending", SimpleLocation::NotAscending.to_string());
    }

    #[rstest::rstest]
    #[case(Some(49.9), Some(AgeGroup::Under50))]
    #[case(Some(50.0), Some(AgeGroup::Over50))]
    #[case(None, None)]
    fn age_group(#[case] age: Option<f64>, #[case] expected: Option<AgeGroup>) {
        assert_eq!(expected, AgeGroup::from_age(age));
    }

    #[test]
    fn phenotype_fill_never_overwrites() {
        let mut left = PhenotypeRecord {
            sample: "S1".into(),
            gender: Some(Gender::Male),
            ..Default::default()
        };
        let right = PhenotypeRecord {
            sample: "S1_2".into(),
            gender: Some(Gender::Female),
            age_at_diagnosis: Some(42.0),
            ..Default::default()
        };

        left.fill_missing_from(&right);

        assert_eq!(Some(Gender::Male), left.gender);
        assert_eq!(Some(42.0), left.age_at_diagnosis);
        assert_eq!("S1", left.sample);
    }

    #[test]
    fn phenotype_is_empty() {
        let mut record = PhenotypeRecord {
            sample: "S1".into(),
            ..Default::default()
        };
        assert!(record.is_empty());

        record.known_syndrome = Some("Marfan".into());
        assert!(!record.is_empty());
    }

    #[test]
    fn variant_has_data() {
        let mut record = VariantRecord {
            sample: "S1".into(),
            classification: Some(Classification::Pathogenic),
            ..Default::default()
        };
        assert!(!record.has_data());

        record.ab = Some(0.45);
        assert!(record.has_data());
    }
}
