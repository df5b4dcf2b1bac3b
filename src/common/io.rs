//! Common, IO-related code.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use flate2::{bufread::MultiGzDecoder, write::GzEncoder, Compression};

/// Transparently open a file with gzip decoder.
pub fn open_read_maybe_gz<P>(path: P) -> Result<Box<dyn BufRead>, anyhow::Error>
where
    P: AsRef<Path>,
{
    if path.as_ref().extension().map(|s| s.to_str()) == Some(Some("gz")) {
        tracing::trace!("Opening {:?} as gzip for reading", path.as_ref());
        let file = File::open(path)?;
        let bufreader = BufReader::new(file);
        let decoder = MultiGzDecoder::new(bufreader);
        Ok(Box::new(BufReader::new(decoder)))
    } else {
        tracing::trace!("Opening {:?} as plain text for reading", path.as_ref());
        let file = File::open(path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Transparently open a file with gzip encoder.
pub fn open_write_maybe_gz<P>(path: P) -> Result<Box<dyn Write>, anyhow::Error>
where
    P: AsRef<Path>,
{
    if path.as_ref().extension().map(|s| s.to_str()) == Some(Some("gz")) {
        tracing::trace!("Opening {:?} as gzip for writing", path.as_ref());
        let file = File::create(path)?;
        let bufwriter = BufWriter::new(file);
        let encoder = GzEncoder::new(bufwriter, Compression::default());
        Ok(Box::new(encoder))
    } else {
        tracing::trace!("Opening {:?} as plain text for writing", path.as_ref());
        let file = File::create(path)?;
        Ok(Box::new(BufWriter::new(file)))
    }
}

/// Decode a raw cell from the phenotype/genotype sheets.
///
/// The sheets are exported from spreadsheets either as UTF-8 or as
/// ISO-8859-1.  Every byte sequence is valid ISO-8859-1, so this never fails.
pub fn decode_cell(raw: &[u8]) -> String {
    match std::str::from_utf8(raw) {
        Ok(s) => s.to_string(),
        Err(_) => raw.iter().map(|&b| b as char).collect(),
    }
}

/// Deserialize all records of the CSV file at `path` (maybe gzip-compressed).
pub fn read_csv<P, T>(path: P) -> Result<Vec<T>, anyhow::Error>
where
    P: AsRef<Path>,
    T: serde::de::DeserializeOwned,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(open_read_maybe_gz(path.as_ref()).map_err(|e| {
            anyhow::anyhow!("could not open {:?} for reading: {}", path.as_ref(), e)
        })?);
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| anyhow::anyhow!("problem reading {:?}: {}", path.as_ref(), e))
}

/// Serialize `records` as CSV to `path` (gzip-compressed if ending in `.gz`).
pub fn write_csv<P, T>(path: P, records: &[T]) -> Result<(), anyhow::Error>
where
    P: AsRef<Path>,
    T: serde::Serialize,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(open_write_maybe_gz(path.as_ref()).map_err(|e| {
            anyhow::anyhow!("could not open {:?} for writing: {}", path.as_ref(), e)
        })?);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use std::io::{Read, Write};

    use pretty_assertions::assert_eq;

    #[rstest::rstest]
    #[case(true)]
    #[case(false)]
    fn open_write_then_read_maybe_gz(#[case] is_gzip: bool) -> Result<(), anyhow::Error> {
        let filename = if is_gzip { "test.txt.gz" } else { "test.txt" };
        let tmp_dir = temp_testdir::TempDir::default();

        {
            let mut f = super::open_write_maybe_gz(tmp_dir.join(filename))?;
            f.write_all(b"Sample,AB\nS1,0.5\n")?;
            f.flush()?;
        }

        let mut raw = Vec::new();
        std::fs::File::open(tmp_dir.join(filename))?.read_to_end(&mut raw)?;
        // gzip magic bytes
        assert_eq!(is_gzip, raw.starts_with(&[0x1f, 0x8b]));

        let mut buf = String::new();
        super::open_read_maybe_gz(tmp_dir.join(filename))?.read_to_string(&mut buf)?;
        assert_eq!("Sample,AB\nS1,0.5\n", buf);

        Ok(())
    }

    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct Row {
        #[serde(rename = "Sample")]
        sample: String,
        #[serde(rename = "AB")]
        ab: Option<f64>,
    }

    #[test]
    fn read_csv_gz() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = tmp_dir.join("rows.csv.gz");
        {
            let mut f = super::open_write_maybe_gz(&path)?;
            f.write_all(b"Sample,AB\nS1,0.5\nS2,\n")?;
            f.flush()?;
        }

        let rows: Vec<Row> = super::read_csv(&path)?;

        assert_eq!(
            vec![
                Row {
                    sample: "S1".into(),
                    ab: Some(0.5)
                },
                Row {
                    sample: "S2".into(),
                    ab: None
                },
            ],
            rows
        );
        Ok(())
    }

    #[test]
    fn read_csv_missing_file() {
        let result: Result<Vec<Row>, _> = super::read_csv("/nonexistent/rows.csv");

        assert!(result.is_err());
    }

    #[test]
    fn decode_cell_latin1_fallback() {
        assert_eq!("Gender (Male/Female)", super::decode_cell(b"Gender (Male/Female)"));
        assert_eq!("caf\u{e9}", super::decode_cell("café".as_bytes()));
        assert_eq!("caf\u{e9}", super::decode_cell(&[b'c', b'a', b'f', 0xe9]));
    }
}
