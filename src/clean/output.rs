//! Flat output rows of the cleaned tables.

use serde::{Deserialize, Serialize};

use super::quality::QualityFilter;
use crate::schema::{
    AgeGroup, Category, Classification, DepthStatus, FamilyHistory, Gender, PatientSample,
    PhenotypeRecord, SimpleLocation, VariantCall, VariantRecord,
};

/// One row of `All_Variants.csv`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AllVariantsRow {
    #[serde(rename = "Sample")]
    pub sample: String,
    pub validation: Option<i64>,
    #[serde(rename = "AD")]
    pub ad: Option<String>,
    #[serde(rename = "AB")]
    pub ab: Option<f64>,
    #[serde(rename = "UID")]
    pub uid: Option<String>,
    #[serde(rename = "Category")]
    pub classification: Option<Classification>,
    #[serde(rename = "Score")]
    pub score: Option<f64>,
    #[serde(rename = "Symbol")]
    pub symbol: Option<String>,
    #[serde(rename = "HGVS")]
    pub hgvs: Option<String>,
    #[serde(rename = "Chrom")]
    pub chrom: Option<String>,
    #[serde(rename = "Pos")]
    pub pos: Option<u64>,
    #[serde(rename = "Ref")]
    pub ref_allele: Option<String>,
    #[serde(rename = "Alt")]
    pub alt_allele: Option<String>,
    #[serde(rename = "Consequence")]
    pub consequence: Option<String>,
    #[serde(rename = "HGVSc")]
    pub hgvs_c: Option<String>,
    #[serde(rename = "HGVSp")]
    pub hgvs_p: Option<String>,
    #[serde(rename = "Exon")]
    pub exon: Option<String>,
    #[serde(rename = "Intron")]
    pub intron: Option<String>,
    #[serde(rename = "Gender")]
    pub gender: Option<Gender>,
    #[serde(rename = "age at diagnosis")]
    pub age_at_diagnosis: Option<f64>,
    pub age_at_surgery: Option<f64>,
    #[serde(rename = "primary diagnosis")]
    pub primary_diagnosis: Option<String>,
    #[serde(rename = "location of primary diagnosis")]
    pub location: Option<String>,
    #[serde(rename = "aortic size at diagnosis (cm)")]
    pub aortic_size_at_diagnosis: Option<f64>,
    #[serde(rename = "maximal aortic size (cm)")]
    pub maximal_aortic_size: Option<f64>,
    #[serde(rename = "proven family_history")]
    pub proven_family_history: Option<String>,
    #[serde(rename = "probable family_history")]
    pub probable_family_history: Option<String>,
    #[serde(rename = "Known Syndrome")]
    pub known_syndrome: Option<String>,
    #[serde(rename = "extra-aortic aneurysmal disease")]
    pub extra_aortic_disease: Option<String>,
    #[serde(rename = "No.of Aortic Operations - Endovascular")]
    pub operations_endovascular: Option<f64>,
    #[serde(rename = "No.of Aortic Operations - Open")]
    pub operations_open: Option<f64>,
    #[serde(rename = "No.of Aortic Operations - Hybrid")]
    pub operations_hybrid: Option<f64>,
    pub family_history: Option<FamilyHistory>,
    #[serde(rename = "Age Group")]
    pub age_group: Option<AgeGroup>,
    #[serde(rename = "simple location of primary diagnosis")]
    pub simple_location: Option<SimpleLocation>,
    #[serde(rename = "New Category")]
    pub new_category: Category,
    #[serde(rename = "New Category code")]
    pub new_category_code: u8,
    pub cohort: String,
}

impl AllVariantsRow {
    /// Build row for `sample` from the optional variant and the phenotype.
    fn build(
        sample: &str,
        variant: Option<&VariantRecord>,
        phenotype: &PhenotypeRecord,
        family_history: Option<FamilyHistory>,
        cohort: &str,
        filter: &QualityFilter,
    ) -> Self {
        let new_category = filter.category(variant);
        let field = |f: fn(&VariantRecord) -> Option<String>| variant.and_then(f);
        Self {
            sample: sample.to_string(),
            validation: variant.and_then(|v| v.validation),
            ad: field(|v| v.ad.clone()),
            ab: variant.and_then(|v| v.ab),
            uid: field(|v| v.uid.clone()),
            classification: variant.and_then(|v| v.classification),
            score: variant.and_then(|v| v.score),
            symbol: field(|v| v.symbol.clone()),
            hgvs: field(|v| v.hgvs.clone()),
            chrom: field(|v| v.chrom.clone()),
            pos: variant.and_then(|v| v.pos),
            ref_allele: field(|v| v.ref_allele.clone()),
            alt_allele: field(|v| v.alt_allele.clone()),
            consequence: field(|v| v.consequence.clone()),
            hgvs_c: field(|v| v.hgvs_c.clone()),
            hgvs_p: field(|v| v.hgvs_p.clone()),
            exon: field(|v| v.exon.clone()),
            intron: field(|v| v.intron.clone()),
            gender: phenotype.gender,
            age_at_diagnosis: phenotype.age_at_diagnosis,
            age_at_surgery: phenotype.age_at_surgery,
            primary_diagnosis: phenotype.primary_diagnosis.clone(),
            location: phenotype.location.clone(),
            aortic_size_at_diagnosis: phenotype.aortic_size_at_diagnosis,
            maximal_aortic_size: phenotype.maximal_aortic_size,
            proven_family_history: phenotype.proven_family_history.clone(),
            probable_family_history: phenotype.probable_family_history.clone(),
            known_syndrome: phenotype.known_syndrome.clone(),
            extra_aortic_disease: phenotype.extra_aortic_disease.clone(),
            operations_endovascular: phenotype.operations_endovascular,
            operations_open: phenotype.operations_open,
            operations_hybrid: phenotype.operations_hybrid,
            family_history,
            age_group: AgeGroup::from_age(phenotype.age_at_diagnosis),
            simple_location: SimpleLocation::from_location(phenotype.location.as_deref()),
            new_category_code: new_category.code(),
            new_category,
            cohort: cohort.to_string(),
        }
    }

    /// Build row from a variant call.
    pub fn from_call(call: &VariantCall, filter: &QualityFilter) -> Self {
        Self::build(
            call.sample(),
            Some(&call.variant),
            &call.phenotype,
            call.family_history,
            &call.cohort,
            filter,
        )
    }
}

/// One row of `Most_Damaging.csv`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MostDamagingRow {
    #[serde(rename = "Sample")]
    pub sample: String,
    pub validation: Option<i64>,
    #[serde(rename = "AD")]
    pub ad: Option<String>,
    #[serde(rename = "AB")]
    pub ab: Option<f64>,
    #[serde(rename = "UID")]
    pub uid: Option<String>,
    #[serde(rename = "Category")]
    pub classification: Option<Classification>,
    #[serde(rename = "Score")]
    pub score: Option<f64>,
    #[serde(rename = "Symbol")]
    pub symbol: Option<String>,
    #[serde(rename = "HGVS")]
    pub hgvs: Option<String>,
    #[serde(rename = "Chrom")]
    pub chrom: Option<String>,
    #[serde(rename = "Pos")]
    pub pos: Option<u64>,
    #[serde(rename = "Ref")]
    pub ref_allele: Option<String>,
    #[serde(rename = "Alt")]
    pub alt_allele: Option<String>,
    #[serde(rename = "Consequence")]
    pub consequence: Option<String>,
    #[serde(rename = "HGVSc")]
    pub hgvs_c: Option<String>,
    #[serde(rename = "HGVSp")]
    pub hgvs_p: Option<String>,
    #[serde(rename = "Exon")]
    pub exon: Option<String>,
    #[serde(rename = "Intron")]
    pub intron: Option<String>,
    #[serde(rename = "Gender")]
    pub gender: Option<Gender>,
    #[serde(rename = "age at diagnosis")]
    pub age_at_diagnosis: Option<f64>,
    pub age_at_surgery: Option<f64>,
    #[serde(rename = "primary diagnosis")]
    pub primary_diagnosis: Option<String>,
    #[serde(rename = "location of primary diagnosis")]
    pub location: Option<String>,
    #[serde(rename = "aortic size at diagnosis (cm)")]
    pub aortic_size_at_diagnosis: Option<f64>,
    #[serde(rename = "maximal aortic size (cm)")]
    pub maximal_aortic_size: Option<f64>,
    #[serde(rename = "proven family_history")]
    pub proven_family_history: Option<String>,
    #[serde(rename = "probable family_history")]
    pub probable_family_history: Option<String>,
    #[serde(rename = "Known Syndrome")]
    pub known_syndrome: Option<String>,
    #[serde(rename = "extra-aortic aneurysmal disease")]
    pub extra_aortic_disease: Option<String>,
    #[serde(rename = "No.of Aortic Operations - Endovascular")]
    pub operations_endovascular: Option<f64>,
    #[serde(rename = "No.of Aortic Operations - Open")]
    pub operations_open: Option<f64>,
    #[serde(rename = "No.of Aortic Operations - Hybrid")]
    pub operations_hybrid: Option<f64>,
    pub family_history: Option<FamilyHistory>,
    #[serde(rename = "Age Group")]
    pub age_group: Option<AgeGroup>,
    #[serde(rename = "simple location of primary diagnosis")]
    pub simple_location: Option<SimpleLocation>,
    #[serde(rename = "New Category")]
    pub new_category: Category,
    #[serde(rename = "New Category code")]
    pub new_category_code: u8,
    pub cohort: String,
    #[serde(rename = "Long-term mortality (0=no, 1=yes)")]
    pub long_term_mortality: Option<i64>,
    #[serde(rename = "Type of surgery (0=elective, 1=urgent/emergent)")]
    pub surgery_type: Option<i64>,
    #[serde(rename = "Peri-operative morality (0=no, 1=yes)")]
    pub perioperative_mortality: Option<i64>,
    #[serde(rename = "Depth")]
    pub depth: DepthStatus,
    /// Canonical sample ID.
    pub same: String,
    /// "Y" for next-most-damaging replacements.
    pub new_md: Option<String>,
}

impl MostDamagingRow {
    /// Build row from a resolved patient sample.
    ///
    /// Samples without variant get the classification "No Variant".
    pub fn from_sample(sample: &PatientSample, filter: &QualityFilter) -> Self {
        let base = AllVariantsRow::build(
            sample.sample(),
            sample.variant.as_ref(),
            &sample.phenotype,
            sample.family_history,
            &sample.cohort,
            filter,
        );
        let survival = sample.survival.as_ref();
        Self {
            sample: base.sample,
            validation: base.validation,
            ad: base.ad,
            ab: base.ab,
            uid: base.uid,
            classification: base.classification.or(Some(Classification::NoVariant)),
            score: base.score,
            symbol: base.symbol,
            hgvs: base.hgvs,
            chrom: base.chrom,
            pos: base.pos,
            ref_allele: base.ref_allele,
            alt_allele: base.alt_allele,
            consequence: base.consequence,
            hgvs_c: base.hgvs_c,
            hgvs_p: base.hgvs_p,
            exon: base.exon,
            intron: base.intron,
            gender: base.gender,
            age_at_diagnosis: base.age_at_diagnosis,
            age_at_surgery: base.age_at_surgery,
            primary_diagnosis: base.primary_diagnosis,
            location: base.location,
            aortic_size_at_diagnosis: base.aortic_size_at_diagnosis,
            maximal_aortic_size: base.maximal_aortic_size,
            proven_family_history: base.proven_family_history,
            probable_family_history: base.probable_family_history,
            known_syndrome: base.known_syndrome,
            extra_aortic_disease: base.extra_aortic_disease,
            operations_endovascular: base.operations_endovascular,
            operations_open: base.operations_open,
            operations_hybrid: base.operations_hybrid,
            family_history: base.family_history,
            age_group: base.age_group,
            simple_location: base.simple_location,
            new_category: base.new_category,
            new_category_code: base.new_category_code,
            cohort: base.cohort,
            long_term_mortality: survival.and_then(|s| s.long_term_mortality),
            surgery_type: survival.and_then(|s| s.surgery_type),
            perioperative_mortality: survival.and_then(|s| s.perioperative_mortality),
            depth: sample.depth,
            same: sample.canonical_id.clone(),
            new_md: sample.is_replacement.then(|| "Y".to_string()),
        }
    }

    /// Whether the patient carries a validated pathogenic / likely pathogenic
    /// variant.
    pub fn is_validated_plp(&self) -> bool {
        self.new_category == Category::PathogenicLikelyPathogenic && self.validation == Some(1)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{conf::Conf, schema::SurvivalRecord};

    fn sample() -> PatientSample {
        PatientSample {
            cohort: "Yale".into(),
            canonical_id: "Y1000".into(),
            phenotype: PhenotypeRecord {
                sample: "Y1000_2".into(),
                age_at_diagnosis: Some(49.0),
                location: Some("Ascending/Arch".into()),
                ..Default::default()
            },
            variant: Some(VariantRecord {
                sample: "Y1000_2".into(),
                symbol: Some("FBN1".into()),
                classification: Some(Classification::LikelyPathogenic),
                validation: Some(1),
                ..Default::default()
            }),
            is_replacement: true,
            survival: Some(SurvivalRecord {
                sample: "Y1000_2".into(),
                long_term_mortality: Some(0),
                surgery_type: Some(1),
                perioperative_mortality: None,
            }),
            family_history: None,
            depth: DepthStatus::High,
        }
    }

    #[test]
    fn most_damaging_row() {
        let filter = QualityFilter::from_conf(&Conf::default());

        let row = MostDamagingRow::from_sample(&sample(), &filter);

        assert_eq!("Y1000_2", row.sample);
        assert_eq!("Y1000", row.same);
        assert_eq!(Some("Y".to_string()), row.new_md);
        assert_eq!(None, row.family_history);
        assert_eq!(Some(AgeGroup::Under50), row.age_group);
        assert_eq!(Some(SimpleLocation::Ascending), row.simple_location);
        assert_eq!(Category::PathogenicLikelyPathogenic, row.new_category);
        assert_eq!(3, row.new_category_code);
        assert_eq!(Some(1), row.surgery_type);
        assert!(row.is_validated_plp());
    }

    #[test]
    fn nulled_sample_has_no_variant() {
        let filter = QualityFilter::from_conf(&Conf::default());
        let mut sample = sample();
        sample.variant = None;
        sample.depth = DepthStatus::Low;

        let row = MostDamagingRow::from_sample(&sample, &filter);

        assert_eq!(Some(Classification::NoVariant), row.classification);
        assert_eq!(None, row.symbol);
        assert_eq!(Category::LikelyBenignNoVariant, row.new_category);
        assert_eq!(1, row.new_category_code);
        assert_eq!(Some(0), row.long_term_mortality);
        assert!(!row.is_validated_plp());
    }

    #[test]
    fn undecidable_family_history_is_empty_cell() -> Result<(), anyhow::Error> {
        let filter = QualityFilter::from_conf(&Conf::default());
        let call = VariantCall {
            cohort: "UK".into(),
            variant: VariantRecord {
                sample: "S1".into(),
                symbol: Some("FBN1".into()),
                ..Default::default()
            },
            phenotype: PhenotypeRecord {
                sample: "S1".into(),
                proven_family_history: Some("maybe".into()),
                probable_family_history: Some("other".into()),
                ..Default::default()
            },
            family_history: crate::clean::merge::determine_family_history(
                "S1",
                Some("maybe"),
                Some("other"),
            ),
        };

        let row = AllVariantsRow::from_call(&call, &filter);
        assert_eq!(None, row.family_history);

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(&row)?;
        let data = String::from_utf8(writer.into_inner()?)?;
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let idx = reader
            .headers()?
            .iter()
            .position(|name| name == "family_history");
        let record = reader.records().next().transpose()?;
        assert_eq!(
            Some(""),
            idx.and_then(|idx| record.as_ref().and_then(|r| r.get(idx)))
        );

        Ok(())
    }

    #[test]
    fn csv_header() -> Result<(), anyhow::Error> {
        let filter = QualityFilter::from_conf(&Conf::default());
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(MostDamagingRow::from_sample(&sample(), &filter))?;
        let data = String::from_utf8(writer.into_inner()?)?;

        let header = data.lines().next().unwrap_or_default();
        assert!(header.starts_with("Sample,validation,AD,AB,UID,Category,Score,Symbol,"));
        assert!(header.ends_with(
            "\"Peri-operative morality (0=no, 1=yes)\",Depth,same,new_md"
        ));

        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let rows = reader
            .deserialize()
            .collect::<Result<Vec<MostDamagingRow>, _>>()?;
        assert_eq!(1, rows.len());
        assert_eq!("Y1000", rows[0].same);
        assert_eq!(Some(Classification::LikelyPathogenic), rows[0].classification);

        Ok(())
    }
}
