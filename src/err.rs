/// Errors raised while turning input sheets into typed records.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    #[error("table {path} has no header row")]
    EmptyTable { path: String },
    #[error("required column {column:?} not found in {path}")]
    MissingColumn { path: String, column: String },
}

/// Errors raised while validating the configuration.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ConfError {
    #[error("no cohorts configured")]
    NoCohorts,
    #[error("cohort {0:?} configured more than once")]
    DuplicateCohort(String),
    #[error("invalid control sample pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("allele balance threshold {0} is outside of [0, 1]")]
    InvalidAlleleBalance(f64),
}
