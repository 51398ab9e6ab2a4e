//! CSV and TSV reader.

use super::{decode_text, unique_headers, ParseOptions, TableReader};
use crate::error::{Error, Result};
use crate::model::{Row, Table};

/// Delimited text reader. The first record is the header.
///
/// All values stay strings. Short records are padded with empty strings,
/// fields past the header are dropped and blank lines are skipped.
#[derive(Debug, Clone)]
pub struct CsvReader {
    delimiter: u8,
    name: &'static str,
    extensions: &'static [&'static str],
}

impl CsvReader {
    /// Comma-separated reader.
    pub fn csv() -> Self {
        Self {
            delimiter: b',',
            name: "csv",
            extensions: &["csv"],
        }
    }

    /// Tab-separated reader.
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            name: "tsv",
            extensions: &["tsv", "tab"],
        }
    }
}

impl TableReader for CsvReader {
    fn name(&self) -> &str {
        self.name
    }

    fn supported_extensions(&self) -> &[&str] {
        self.extensions
    }

    fn read(&self, bytes: &[u8], options: &ParseOptions) -> Result<Table> {
        read_delimited(&decode_text(bytes), self.delimiter, self.name, options)
    }
}

pub(crate) fn read_delimited(
    text: &str,
    delimiter: u8,
    format: &'static str,
    options: &ParseOptions,
) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = unique_headers(
        reader
            .headers()
            .map_err(|e| Error::parse(format, e))?
            .iter(),
    );

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::parse(format, e))?;
        if record.len() <= 1 && record.get(0).map_or(true, str::is_empty) {
            continue;
        }
        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), options.cell(record.get(i).unwrap_or(""))))
            .collect();
        rows.push(row);
    }

    Ok(Table::from_rows(rows))
}
