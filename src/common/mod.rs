//! Common functionality.

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

pub mod io;

/// Commonly used command line arguments.
#[derive(Parser, Debug)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            verbose: Verbosity::new(0, 0),
        }
    }
}

/// Definition of canonical chromosome names.
pub const CHROMS: &[&str] = &[
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16", "17",
    "18", "19", "20", "21", "22", "X", "Y", "M",
];

/// Canonicalize a chromosome name as found in the genotype sheets.
///
/// Strips a `chr` prefix, maps `MT` to `M` and turns spreadsheet floats such
/// as `"15.0"` back into `"15"`.  Unknown names are returned trimmed.
pub fn canonical_chrom(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    let stripped = lower.strip_prefix("chr").unwrap_or(&lower);
    let stripped = match stripped.parse::<f64>() {
        Ok(num) if num.fract() == 0.0 && num > 0.0 => format!("{}", num as u64),
        _ => stripped.to_ascii_uppercase(),
    };
    let name = if stripped == "MT" { "M".to_string() } else { stripped };
    if CHROMS.contains(&name.as_str()) {
        name
    } else {
        trimmed.to_string()
    }
}

/// Parse a numeric cell value, returning `None` on failure.
///
/// Mirrors "coerce" semantics: anything that is not a finite number is
/// treated as missing.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => None,
    }
}

/// Like [`parse_numeric`] but only accepts integral values.
pub fn parse_integral(raw: &str) -> Option<i64> {
    parse_numeric(raw).and_then(|value| {
        if value.fract() == 0.0 {
            Some(value as i64)
        } else {
            None
        }
    })
}
