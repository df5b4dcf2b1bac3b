//! Code for supporting the pipeline configuration file.
//!
//! The configuration is a TOML file.  All settings except for the cohort list
//! have defaults matching the TAAD study so a minimal configuration only lists
//! the cohorts and their input files.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::err::ConfError;

/// Quality thresholds.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
#[serde(default)]
pub struct Thresholds {
    /// Calls with an allele balance below this value are considered artifacts.
    pub min_allele_balance: f64,
    /// Samples with `%_bases_above_49` at or below this value have LOW depth.
    pub min_depth_pct: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_allele_balance: 0.3,
            min_depth_pct: 80.0,
        }
    }
}

/// A gene/exon combination known to produce false positive calls.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct FalsePositiveLocus {
    /// Gene symbol, e.g., "SKI".
    pub gene: String,
    /// Exon labels in `<exon>/<total>` notation, e.g., "1/7".
    pub exons: Vec<String>,
}

/// A genomic locus given by chromosome and 1-based position.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct Locus {
    /// Chromosome name (without `chr` prefix).
    pub chrom: String,
    /// 1-based position.
    pub pos: u64,
}

/// Input files for one cohort.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
#[serde(default)]
pub struct CohortConf {
    /// Cohort label written into the `cohort` column, e.g., "UK".
    pub name: String,
    /// Path to the phenotype sheet.
    pub path_phenotype: String,
    /// Path to the sheet with all variant calls.
    pub path_all_variants: String,
    /// Path to the sheet with the most damaging variant per sample.
    pub path_most_damaging: String,
    /// Optional path to survival/outcome data.
    pub path_survival: Option<String>,
    /// Directories with per-assay coverage summaries (e.g., TAADX and TAADZ).
    pub depth_assay_dirs: Vec<String>,
    /// Exact corrections of phenotype sample IDs to genotype sample IDs.
    pub sample_corrections: IndexMap<String, String>,
}

/// Top-level configuration.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
#[serde(default)]
pub struct Conf {
    /// Quality thresholds.
    pub thresholds: Thresholds,
    /// Known false positive gene/exon combinations.
    pub false_positives: Vec<FalsePositiveLocus>,
    /// Loci whose calls are reclassified to "Uncertain Significance".
    pub vus_overrides: Vec<Locus>,
    /// Sample ID suffixes that mark duplicate samples.
    pub duplicate_suffixes: Vec<String>,
    /// Genes whose calls are ignored.
    pub excluded_genes: Vec<String>,
    /// Case-insensitive patterns for blank / water control sample IDs.
    pub control_sample_patterns: Vec<String>,
    /// Substrings removed from phenotype sample IDs.
    pub sample_id_strip_chars: Vec<String>,
    /// Additional column aliases (raw header to canonical column name).
    pub column_aliases: IndexMap<String, String>,
    /// File name suffix of the coverage summary files.
    pub depth_file_suffix: String,
    /// The cohorts to process.
    pub cohorts: Vec<CohortConf>,
}

impl Default for Conf {
    fn default() -> Self {
        let vus_overrides = [
            ("2", 189851842),
            ("3", 123401086),
            ("9", 101908876),
            ("15", 48760242),
            ("15", 48776056),
            ("15", 48644711),
            ("16", 15844048),
            ("15", 48782270),
            ("15", 48800841),
            ("15", 48829865),
        ]
        .into_iter()
        .map(|(chrom, pos)| Locus {
            chrom: chrom.to_string(),
            pos,
        })
        .collect();

        Self {
            thresholds: Thresholds::default(),
            false_positives: vec![FalsePositiveLocus {
                gene: "SKI".to_string(),
                exons: vec!["1/7".to_string()],
            }],
            vus_overrides,
            duplicate_suffixes: ["_2", "_3", "_pool7A", "_pool10A"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            excluded_genes: vec!["SMAD4".to_string()],
            control_sample_patterns: ["blank", "ddh20", "dh2o", "h2o"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            sample_id_strip_chars: [" ", "-", "'"].iter().map(|s| s.to_string()).collect(),
            column_aliases: IndexMap::new(),
            depth_file_suffix: "sample_summary".to_string(),
            cohorts: Vec::new(),
        }
    }
}

impl Conf {
    /// Load configuration from TOML file at `path`.
    ///
    /// Paths of the cohort inputs are expanded (`~`, environment variables)
    /// and interpreted relative to the directory containing the file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let toml_str = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            anyhow::anyhow!("could not read configuration {:?}: {}", path.as_ref(), e)
        })?;
        let mut conf: Conf = toml::from_str(&toml_str).map_err(|e| {
            anyhow::anyhow!("could not parse configuration {:?}: {}", path.as_ref(), e)
        })?;
        let base_dir = path.as_ref().parent().unwrap_or_else(|| Path::new(""));
        for cohort in conf.cohorts.iter_mut() {
            cohort.path_phenotype = resolve_path(base_dir, &cohort.path_phenotype)?;
            cohort.path_all_variants = resolve_path(base_dir, &cohort.path_all_variants)?;
            cohort.path_most_damaging = resolve_path(base_dir, &cohort.path_most_damaging)?;
            if let Some(path_survival) = cohort.path_survival.as_mut() {
                *path_survival = resolve_path(base_dir, path_survival)?;
            }
            for dir in cohort.depth_assay_dirs.iter_mut() {
                *dir = resolve_path(base_dir, dir)?;
            }
        }
        conf.validate()?;
        Ok(conf)
    }

    /// Check the configuration for consistency.
    pub fn validate(&self) -> Result<(), ConfError> {
        if self.cohorts.is_empty() {
            return Err(ConfError::NoCohorts);
        }
        let mut seen = std::collections::HashSet::new();
        for cohort in &self.cohorts {
            if !seen.insert(cohort.name.as_str()) {
                return Err(ConfError::DuplicateCohort(cohort.name.clone()));
            }
        }
        let ab = self.thresholds.min_allele_balance;
        if !(0.0..=1.0).contains(&ab) {
            return Err(ConfError::InvalidAlleleBalance(ab));
        }
        self.control_sample_regex()?;
        Ok(())
    }

    /// Build the case-insensitive regular expression for control samples.
    pub fn control_sample_regex(&self) -> Result<regex::Regex, ConfError> {
        let alternatives = self
            .control_sample_patterns
            .iter()
            .map(|pattern| regex::escape(pattern))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = if alternatives.is_empty() {
            // matches nothing
            String::from("[^\\s\\S]")
        } else {
            format!("(?i){}", alternatives)
        };
        Ok(regex::Regex::new(&pattern)?)
    }
}

/// Expand `~` and environment variables, then resolve against `base_dir`.
fn resolve_path(base_dir: &Path, raw: &str) -> Result<String, anyhow::Error> {
    if raw.is_empty() {
        return Ok(String::new());
    }
    let expanded = shellexpand::full(raw)
        .map_err(|e| anyhow::anyhow!("could not expand path {:?}: {}", raw, e))?;
    let path = Path::new(expanded.as_ref());
    let resolved = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    };
    Ok(resolved.to_string_lossy().into_owned())
}
