//! Normalization of column names and categorical cell values.
//!
//! All functions here are idempotent: normalizing an already normalized
//! table yields the same table.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use super::Table;

/// Canonical column names.
pub mod col {
    pub const SAMPLE: &str = "Sample";
    pub const VALIDATION: &str = "validation";
    pub const AD: &str = "AD";
    pub const AB: &str = "AB";
    pub const UID: &str = "UID";
    pub const CATEGORY: &str = "Category";
    pub const SCORE: &str = "Score";
    pub const SYMBOL: &str = "Symbol";
    pub const HGVS: &str = "HGVS";
    pub const CHROM: &str = "Chrom";
    pub const POS: &str = "Pos";
    pub const REF: &str = "Ref";
    pub const ALT: &str = "Alt";
    pub const CONSEQUENCE: &str = "Consequence";
    pub const HGVS_C: &str = "HGVSc";
    pub const HGVS_P: &str = "HGVSp";
    pub const EXON: &str = "Exon";
    pub const INTRON: &str = "Intron";

    pub const GENDER: &str = "Gender";
    pub const AGE_AT_DIAGNOSIS: &str = "age at diagnosis";
    pub const AGE_AT_SURGERY: &str = "age_at_surgery";
    pub const PRIMARY_DIAGNOSIS: &str = "primary diagnosis";
    pub const LOCATION: &str = "location of primary diagnosis";
    pub const AORTIC_SIZE_AT_DIAGNOSIS: &str = "aortic size at diagnosis (cm)";
    pub const MAXIMAL_AORTIC_SIZE: &str = "maximal aortic size (cm)";
    pub const PROVEN_FAMILY_HISTORY: &str = "proven family_history";
    pub const PROBABLE_FAMILY_HISTORY: &str = "probable family_history";
    pub const KNOWN_SYNDROME: &str = "Known Syndrome";
    pub const EXTRA_AORTIC_DISEASE: &str = "extra-aortic aneurysmal disease";
    pub const OPERATIONS_ENDOVASCULAR: &str = "No.of Aortic Operations - Endovascular";
    pub const OPERATIONS_OPEN: &str = "No.of Aortic Operations - Open";
    pub const OPERATIONS_HYBRID: &str = "No.of Aortic Operations - Hybrid";

    pub const LONG_TERM_MORTALITY: &str = "Long-term mortality (0=no, 1=yes)";
    pub const SURGERY_TYPE: &str = "Type of surgery (0=elective, 1=urgent/emergent)";
    pub const PERIOPERATIVE_MORTALITY: &str = "Peri-operative morality (0=no, 1=yes)";

    /// All canonical names.
    pub const ALL: &[&str] = &[
        SAMPLE,
        VALIDATION,
        AD,
        AB,
        UID,
        CATEGORY,
        SCORE,
        SYMBOL,
        HGVS,
        CHROM,
        POS,
        REF,
        ALT,
        CONSEQUENCE,
        HGVS_C,
        HGVS_P,
        EXON,
        INTRON,
        GENDER,
        AGE_AT_DIAGNOSIS,
        AGE_AT_SURGERY,
        PRIMARY_DIAGNOSIS,
        LOCATION,
        AORTIC_SIZE_AT_DIAGNOSIS,
        MAXIMAL_AORTIC_SIZE,
        PROVEN_FAMILY_HISTORY,
        PROBABLE_FAMILY_HISTORY,
        KNOWN_SYNDROME,
        EXTRA_AORTIC_DISEASE,
        OPERATIONS_ENDOVASCULAR,
        OPERATIONS_OPEN,
        OPERATIONS_HYBRID,
        LONG_TERM_MORTALITY,
        SURGERY_TYPE,
        PERIOPERATIVE_MORTALITY,
    ];
}

/// Spreadsheet header variants seen in the cohort sheets.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("validated?(1=yes,2=no,0=not_done)", col::VALIDATION),
    (
        "Proven Family History of Aortic Disease (Yes/No)",
        col::PROVEN_FAMILY_HISTORY,
    ),
    (
        "Probable Family History of Aortic Disease (Yes/No)",
        col::PROBABLE_FAMILY_HISTORY,
    ),
    ("gender (m/f)", col::GENDER),
    ("Gender (Male/Female)", col::GENDER),
    (
        "Primary Diagnosis – indication for surgery: Aneurysm / Dissection / Rupture / \
         Transection / IMH / PAU",
        col::PRIMARY_DIAGNOSIS,
    ),
    (
        "Primary Diagnosis – Presenting Indication (for surgery): Aneurysm / Dissection / \
         Transection / IMH / PAU",
        col::PRIMARY_DIAGNOSIS,
    ),
    ("Age at Diagnosis (any aortic disease)", col::AGE_AT_DIAGNOSIS),
    (
        "location of primary diagnosis – ascending/arch/descending/thoracoabdominal",
        col::LOCATION,
    ),
    (
        "Location of Primary Diagnosis – Ascending, Arch, Descending, Thoracoabdominal, \
         Infrarenal",
        col::LOCATION,
    ),
    (
        "aortic size at diagnosis (primary location/earliest measurement) (cm)",
        col::AORTIC_SIZE_AT_DIAGNOSIS,
    ),
    (
        "Aortic Size at Diagnosis (primary location, earliest measurement) (cm)",
        col::AORTIC_SIZE_AT_DIAGNOSIS,
    ),
    (
        "\"aortic size at diagnosis (primary location",
        col::AORTIC_SIZE_AT_DIAGNOSIS,
    ),
    ("aortic size at diagnosis", col::AORTIC_SIZE_AT_DIAGNOSIS),
    ("Age at Time of Surgery", col::AGE_AT_SURGERY),
    ("Maximal Aortic Size (cm)", col::MAXIMAL_AORTIC_SIZE),
    ("known syndrome - Marfan / LDS / EDS", col::KNOWN_SYNDROME),
    ("Mendelian ID", col::SAMPLE),
    ("YALE Coding", col::SAMPLE),
];

/// Fold a column name for alias lookup.
///
/// Case, whitespace, quotes, underscores and dash variants are ignored.
pub fn fold_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| {
            !c.is_whitespace() && !matches!(c, '"' | '\'' | '_' | '-' | '\u{2013}' | '\u{2014}')
        })
        .flat_map(char::to_lowercase)
        .collect()
}

/// Maps raw column names and cell values to their canonical forms.
#[derive(Debug, Clone)]
pub struct Normalizer {
    /// Folded alias to canonical column name.
    aliases: HashMap<String, String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&IndexMap::new())
    }
}

impl Normalizer {
    /// Construct with the built-in alias table extended by `extra_aliases`.
    pub fn new(extra_aliases: &IndexMap<String, String>) -> Self {
        let mut aliases = HashMap::new();
        for canonical in col::ALL {
            aliases.insert(fold_key(canonical), canonical.to_string());
        }
        for (raw, canonical) in BUILTIN_ALIASES {
            aliases.insert(fold_key(raw), canonical.to_string());
        }
        for (raw, canonical) in extra_aliases {
            // canonical names map to themselves so that extra aliases keep
            // the mapping idempotent
            aliases
                .entry(fold_key(canonical))
                .or_insert_with(|| canonical.clone());
            aliases.insert(fold_key(raw), canonical.clone());
        }
        Self { aliases }
    }

    /// Canonical name for the raw column name `raw`.
    pub fn canonical_column(&self, raw: &str) -> String {
        self.aliases
            .get(&fold_key(raw))
            .cloned()
            .unwrap_or_else(|| raw.trim().to_string())
    }

    /// Rename the columns of `table` and canonicalize its categorical cells.
    pub fn normalize(&self, mut table: Table) -> Table {
        let mut seen = HashSet::new();
        for name in table.header.iter_mut() {
            *name = self.canonical_column(name);
            if !seen.insert(name.clone()) {
                tracing::warn!(
                    "column {:?} occurs more than once in {}, using the first one",
                    name,
                    &table.label
                );
            }
        }

        let header = table.header.clone();
        for row in table.rows.iter_mut() {
            for (name, cell) in header.iter().zip(row.iter_mut()) {
                if let Some(value) = cell.take() {
                    *cell = canonical_value(name, &value);
                }
            }
        }

        table
    }
}

/// Canonical form of the cell `raw` in column `column`.
///
/// Returns `None` if the value denotes a missing value after normalization.
pub fn canonical_value(column: &str, raw: &str) -> Option<String> {
    let value = raw.trim();
    if super::is_missing(value) {
        return None;
    }
    match column {
        col::GENDER => Some(canonical_gender(value)),
        col::PROVEN_FAMILY_HISTORY | col::PROBABLE_FAMILY_HISTORY => {
            Some(canonical_family_history(value))
        }
        col::PRIMARY_DIAGNOSIS => Some(
            value
                .replace("aneurysm", "Aneurysm")
                .replace("dissection", "Dissection"),
        ),
        col::LOCATION => canonical_location(value),
        col::EXON | col::INTRON => Some(undo_date_artifact(value)),
        _ => Some(value.to_string()),
    }
}

fn canonical_gender(value: &str) -> String {
    match value.to_ascii_lowercase().as_str() {
        "m" | "male" => "Male".to_string(),
        "f" | "female" => "Female".to_string(),
        _ => value.to_string(),
    }
}

fn canonical_family_history(value: &str) -> String {
    match value.to_ascii_lowercase().as_str() {
        "y" | "yes" => "yes".to_string(),
        "n" | "no" => "no".to_string(),
        other => other.to_string(),
    }
}

/// Free text repairs of the location of primary diagnosis, in order.
const LOCATION_REPAIRS: &[(&str, &str)] = &[
    ("hemi", "Arch"),
    ("Hemi", "Arch"),
    ("thoracoabdominal", "Thoracoabdominal"),
    ("+", "/"),
    (" ", ""),
    ("ascending", "Ascending"),
    ("descending", "Descending"),
    ("arch", "Arch"),
    ("Thoracoabdomen", "Thoracoabdominal"),
    ("Descending/PAU", "Descending"),
    ("Arch-stageI", "Arch"),
    ("aneurysm", "-"),
    ("Descendingthoracic", "Descending"),
    ("AorticValveReplacement", "-"),
];

fn canonical_location(value: &str) -> Option<String> {
    let mut current = value.to_string();
    loop {
        let next = LOCATION_REPAIRS
            .iter()
            .fold(current.clone(), |acc, (from, to)| acc.replace(from, to));
        if next == current {
            break;
        }
        current = next;
    }
    if current == "?" || super::is_missing(&current) {
        None
    } else {
        Some(current)
    }
}

const MONTHS: &[&str] = &[
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Turn spreadsheet date artifacts such as "01-Jul" back into "1/7".
pub fn undo_date_artifact(value: &str) -> String {
    if let Some((day, month)) = value.split_once('-') {
        let month_no = MONTHS
            .iter()
            .position(|m| m.eq_ignore_ascii_case(month))
            .map(|idx| idx + 1);
        if let (Ok(day), Some(month_no)) = (day.parse::<u32>(), month_no) {
            return format!("{}/{}", day, month_no);
        }
    }
    value.to_string()
}

/// Clean-up rules for sample identifiers of phenotype sheets.
#[derive(Debug, Clone, Default)]
pub struct SampleIdRules {
    /// Substrings removed from the identifier.
    strip: Vec<String>,
    /// Exact corrections with chains already resolved.
    corrections: HashMap<String, String>,
}

impl SampleIdRules {
    /// Construct rules; chains of corrections are resolved up front.
    pub fn new(strip: &[String], corrections: &IndexMap<String, String>) -> Self {
        let strip = strip
            .iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect::<Vec<_>>();
        let strip_all = |raw: &str| {
            strip
                .iter()
                .fold(raw.trim().to_string(), |acc, s| acc.replace(s.as_str(), ""))
        };
        let stripped = corrections
            .iter()
            .map(|(from, to)| (strip_all(from), strip_all(to)))
            .filter(|(from, to)| from != to)
            .collect::<HashMap<_, _>>();

        let mut resolved = HashMap::new();
        for (from, to) in &stripped {
            let mut current = to.clone();
            let mut seen = HashSet::from([from.clone()]);
            while let Some(next) = stripped.get(&current) {
                if !seen.insert(current.clone()) {
                    tracing::warn!("cycle in sample ID corrections involving {:?}", from);
                    break;
                }
                current = next.clone();
            }
            if &current != from {
                resolved.insert(from.clone(), current);
            }
        }

        Self {
            strip,
            corrections: resolved,
        }
    }

    /// Apply the rules to the raw sample ID.
    pub fn apply(&self, raw: &str) -> String {
        let stripped = self
            .strip
            .iter()
            .fold(raw.trim().to_string(), |acc, s| acc.replace(s.as_str(), ""));
        match self.corrections.get(&stripped) {
            Some(corrected) => corrected.clone(),
            None => stripped,
        }
    }
}
