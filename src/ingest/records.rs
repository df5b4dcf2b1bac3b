//! Construction of typed records from normalized tables.

use std::{path::Path, str::FromStr};

use thousands::Separable;

use super::{
    normalize::{col, Normalizer, SampleIdRules},
    Table,
};
use crate::{
    common::{parse_integral, parse_numeric},
    err::IngestError,
    schema::{Classification, Gender, PhenotypeRecord, SurvivalRecord, VariantRecord},
};

/// Typed access to the cells of a table.
struct Columns<'a> {
    table: &'a Table,
}

impl<'a> Columns<'a> {
    fn text(&self, row: usize, name: &str) -> Option<String> {
        self.table
            .cell(row, self.table.column(name))
            .map(str::to_string)
    }

    fn numeric(&self, row: usize, name: &str) -> Option<f64> {
        self.table
            .cell(row, self.table.column(name))
            .and_then(parse_numeric)
    }

    fn integral(&self, row: usize, name: &str) -> Option<i64> {
        self.table
            .cell(row, self.table.column(name))
            .and_then(parse_integral)
    }
}

/// Iterate over the rows that have a sample ID, logging the skipped ones.
fn rows_with_sample(table: &Table) -> Result<Vec<(usize, String)>, IngestError> {
    let sample_col = table.require(col::SAMPLE)?;
    let mut result = Vec::with_capacity(table.rows.len());
    for row in 0..table.rows.len() {
        match table.cell(row, Some(sample_col)) {
            Some(sample) => result.push((row, sample.to_string())),
            None => tracing::debug!(
                "skipping row {} of {} without sample ID",
                row + 2,
                &table.label
            ),
        }
    }
    Ok(result)
}

/// Build phenotype records from a normalized phenotype table.
pub fn phenotypes_from_table(
    table: &Table,
    rules: &SampleIdRules,
) -> Result<Vec<PhenotypeRecord>, IngestError> {
    let cols = Columns { table };
    Ok(rows_with_sample(table)?
        .into_iter()
        .map(|(row, sample)| PhenotypeRecord {
            sample: rules.apply(&sample),
            gender: cols
                .text(row, col::GENDER)
                .and_then(|gender| Gender::from_str(&gender).ok()),
            age_at_diagnosis: cols.numeric(row, col::AGE_AT_DIAGNOSIS),
            age_at_surgery: cols.numeric(row, col::AGE_AT_SURGERY),
            primary_diagnosis: cols.text(row, col::PRIMARY_DIAGNOSIS),
            location: cols.text(row, col::LOCATION),
            aortic_size_at_diagnosis: cols.numeric(row, col::AORTIC_SIZE_AT_DIAGNOSIS),
            maximal_aortic_size: cols.numeric(row, col::MAXIMAL_AORTIC_SIZE),
            proven_family_history: cols.text(row, col::PROVEN_FAMILY_HISTORY),
            probable_family_history: cols.text(row, col::PROBABLE_FAMILY_HISTORY),
            known_syndrome: cols.text(row, col::KNOWN_SYNDROME),
            extra_aortic_disease: cols.text(row, col::EXTRA_AORTIC_DISEASE),
            operations_endovascular: cols.numeric(row, col::OPERATIONS_ENDOVASCULAR),
            operations_open: cols.numeric(row, col::OPERATIONS_OPEN),
            operations_hybrid: cols.numeric(row, col::OPERATIONS_HYBRID),
        })
        .collect())
}

/// Build variant records from a normalized genotype table.
pub fn variants_from_table(table: &Table) -> Result<Vec<VariantRecord>, IngestError> {
    let cols = Columns { table };
    Ok(rows_with_sample(table)?
        .into_iter()
        .map(|(row, sample)| {
            let classification = cols.text(row, col::CATEGORY).and_then(|raw| {
                Classification::from_str(&raw)
                    .map_err(|_| {
                        tracing::warn!(
                            "unknown classification {:?} for sample {} in {}",
                            &raw,
                            &sample,
                            &table.label
                        )
                    })
                    .ok()
            });
            VariantRecord {
                ad: cols.text(row, col::AD),
                ab: cols.numeric(row, col::AB),
                uid: cols.text(row, col::UID),
                validation: cols.integral(row, col::VALIDATION),
                classification,
                score: cols.numeric(row, col::SCORE),
                symbol: cols.text(row, col::SYMBOL),
                hgvs: cols.text(row, col::HGVS),
                chrom: cols.text(row, col::CHROM),
                pos: cols
                    .integral(row, col::POS)
                    .and_then(|pos| u64::try_from(pos).ok()),
                ref_allele: cols.text(row, col::REF),
                alt_allele: cols.text(row, col::ALT),
                consequence: cols.text(row, col::CONSEQUENCE),
                hgvs_c: cols.text(row, col::HGVS_C),
                hgvs_p: cols.text(row, col::HGVS_P),
                exon: cols.text(row, col::EXON),
                intron: cols.text(row, col::INTRON),
                sample,
            }
        })
        .collect())
}

/// Build survival records from a normalized survival table.
pub fn survival_from_table(table: &Table) -> Result<Vec<SurvivalRecord>, IngestError> {
    let cols = Columns { table };
    Ok(rows_with_sample(table)?
        .into_iter()
        .map(|(row, sample)| SurvivalRecord {
            long_term_mortality: cols.integral(row, col::LONG_TERM_MORTALITY),
            surgery_type: cols.integral(row, col::SURGERY_TYPE),
            perioperative_mortality: cols.integral(row, col::PERIOPERATIVE_MORTALITY),
            sample,
        })
        .collect())
}

/// Read and normalize the table at `path`.
fn load_table<P: AsRef<Path>>(path: P, normalizer: &Normalizer) -> Result<Table, anyhow::Error> {
    Ok(normalizer.normalize(Table::read_path(path)?))
}

/// Load phenotype records from `path`.
pub fn load_phenotypes<P: AsRef<Path>>(
    path: P,
    normalizer: &Normalizer,
    rules: &SampleIdRules,
) -> Result<Vec<PhenotypeRecord>, anyhow::Error> {
    let records = phenotypes_from_table(&load_table(path.as_ref(), normalizer)?, rules)?;
    tracing::info!(
        "loaded {} phenotype records from {:?}",
        records.len().separate_with_commas(),
        path.as_ref()
    );
    Ok(records)
}

/// Load variant records from `path`.
pub fn load_variants<P: AsRef<Path>>(
    path: P,
    normalizer: &Normalizer,
) -> Result<Vec<VariantRecord>, anyhow::Error> {
    let records = variants_from_table(&load_table(path.as_ref(), normalizer)?)?;
    tracing::info!(
        "loaded {} variant records from {:?}",
        records.len().separate_with_commas(),
        path.as_ref()
    );
    Ok(records)
}

/// Load survival records from `path`.
pub fn load_survival<P: AsRef<Path>>(
    path: P,
    normalizer: &Normalizer,
) -> Result<Vec<SurvivalRecord>, anyhow::Error> {
    let records = survival_from_table(&load_table(path.as_ref(), normalizer)?)?;
    tracing::info!(
        "loaded {} survival records from {:?}",
        records.len().separate_with_commas(),
        path.as_ref()
    );
    Ok(records)
}

#[cfg(test)]
mod test {
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    use super::*;

    fn table(data: &str) -> Result<Table, anyhow::Error> {
        Ok(Normalizer::default().normalize(Table::from_reader("test", data.as_bytes(), b',')?))
    }

    #[test]
    fn phenotypes() -> Result<(), anyhow::Error> {
        let table = table(
            "YALE Coding,Gender (Male/Female),Age at Diagnosis (any aortic disease),\
             Proven Family History of Aortic Disease (Yes/No),Known Syndrome\n\
             24DW 932,M,45,Y,-\n\
             ,F,60,N,\n\
             21SA1565,X,unknown,n,Marfan\n",
        )?;
        let rules = SampleIdRules::new(
            &[" ".to_string()],
            &IndexMap::from([("24DW932".to_string(), "24DW0932".to_string())]),
        );

        let records = phenotypes_from_table(&table, &rules)?;

        assert_eq!(2, records.len());
        assert_eq!(
            PhenotypeRecord {
                sample: "24DW0932".into(),
                gender: Some(Gender::Male),
                age_at_diagnosis: Some(45.0),
                proven_family_history: Some("yes".into()),
                ..Default::default()
            },
            records[0]
        );
        assert_eq!(None, records[1].gender);
        assert_eq!(None, records[1].age_at_diagnosis);
        assert_eq!(Some("Marfan".to_string()), records[1].known_syndrome);

        Ok(())
    }

    #[test]
    fn variants() -> Result<(), anyhow::Error> {
        let table = table(
            "Sample,\"validated?(1=yes,2=no,0=not_done)\",AB,Category,Score,Symbol,Chrom,Pos,Exon\n\
             S1,1,0.45,Likely Pathogenic,12.5,TGFBR2,3,30713842,4/7\n\
             S2,x,abc,Whatever,,SKI,1,2160305,01-Jul\n",
        )?;

        let records = variants_from_table(&table)?;

        assert_eq!(2, records.len());
        assert_eq!(Some(1), records[0].validation);
        assert_eq!(Some(0.45), records[0].ab);
        assert_eq!(
            Some(Classification::LikelyPathogenic),
            records[0].classification
        );
        assert_eq!(Some(30713842), records[0].pos);
        assert_eq!(None, records[1].validation);
        assert_eq!(None, records[1].ab);
        assert_eq!(None, records[1].classification);
        assert_eq!(Some("1/7".to_string()), records[1].exon);

        Ok(())
    }

    #[test]
    fn survival() -> Result<(), anyhow::Error> {
        let table = table(
            "Sample,\"Long-term mortality (0=no, 1=yes)\",\
             \"Type of surgery (0=elective, 1=urgent/emergent)\"\n\
             S1,1,0\n",
        )?;

        let records = survival_from_table(&table)?;

        assert_eq!(
            vec![SurvivalRecord {
                sample: "S1".into(),
                long_term_mortality: Some(1),
                surgery_type: Some(0),
                perioperative_mortality: None,
            }],
            records
        );

        Ok(())
    }

    #[test]
    fn missing_sample_column() -> Result<(), anyhow::Error> {
        let table = table("AB\n0.5\n")?;

        assert!(matches!(
            variants_from_table(&table),
            Err(IngestError::MissingColumn { .. })
        ));

        Ok(())
    }
}
