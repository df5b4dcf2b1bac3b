//! Reading of the cohort sheets into typed records.

pub mod normalize;
pub mod records;

use std::{io::Read, path::Path, time::Instant};

use thousands::Separable;

use crate::{common::io::decode_cell, err::IngestError};

/// Whether a raw cell denotes a missing value.
pub fn is_missing(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed == "-" || trimmed.eq_ignore_ascii_case("nan")
}

/// A raw table with header and string cells, missing cells are `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// Label for error messages, usually the path.
    pub label: String,
    /// Column names.
    pub header: Vec<String>,
    /// Rows, all of the same length as `header`.
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    /// Read comma-separated table from `path`.
    pub fn read_path<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        Self::read_path_with_delimiter(path, b',')
    }

    /// Read table with the given delimiter from `path`.
    pub fn read_path_with_delimiter<P: AsRef<Path>>(
        path: P,
        delimiter: u8,
    ) -> Result<Self, anyhow::Error> {
        let before_reading = Instant::now();
        let reader = crate::common::io::open_read_maybe_gz(path.as_ref())
            .map_err(|e| anyhow::anyhow!("could not open {:?}: {}", path.as_ref(), e))?;
        let table = Self::from_reader(
            &format!("{}", path.as_ref().display()),
            reader,
            delimiter,
        )?;
        tracing::debug!(
            "read {} rows from {:?} in {:?}",
            table.rows.len().separate_with_commas(),
            path.as_ref(),
            before_reading.elapsed()
        );
        Ok(table)
    }

    /// Read table from `reader`.
    pub fn from_reader<R: Read>(
        label: &str,
        reader: R,
        delimiter: u8,
    ) -> Result<Self, anyhow::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(reader);

        let mut records = reader.byte_records();
        let header = match records.next() {
            Some(record) => record
                .map_err(|e| anyhow::anyhow!("could not read header of {}: {}", label, e))?
                .iter()
                .map(|cell| {
                    decode_cell(cell)
                        .trim_start_matches('\u{feff}')
                        .trim()
                        .to_string()
                })
                .collect::<Vec<_>>(),
            None => {
                return Err(IngestError::EmptyTable {
                    path: label.to_string(),
                }
                .into())
            }
        };

        let mut rows = Vec::new();
        for record in records {
            let record =
                record.map_err(|e| anyhow::anyhow!("could not read row of {}: {}", label, e))?;
            let mut row = record
                .iter()
                .take(header.len())
                .map(|cell| {
                    let value = decode_cell(cell);
                    if is_missing(&value) {
                        None
                    } else {
                        Some(value.trim().to_string())
                    }
                })
                .collect::<Vec<_>>();
            if row.iter().all(Option::is_none) {
                continue;
            }
            row.resize(header.len(), None);
            rows.push(row);
        }

        Ok(Self {
            label: label.to_string(),
            header,
            rows,
        })
    }

    /// Index of the column named `name`, if any.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|column| column == name)
    }

    /// Index of the column named `name`, fails if absent.
    pub fn require(&self, name: &str) -> Result<usize, IngestError> {
        self.column(name).ok_or_else(|| IngestError::MissingColumn {
            path: self.label.clone(),
            column: name.to_string(),
        })
    }

    /// The cell in `row` of the (optional) column `col`.
    pub fn cell(&self, row: usize, col: Option<usize>) -> Option<&str> {
        col.and_then(|col| self.rows.get(row).and_then(|r| r.get(col)))
            .and_then(|cell| cell.as_deref())
    }
}
