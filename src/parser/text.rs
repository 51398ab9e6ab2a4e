//! Plain-text reader.

use super::csv::read_delimited;
use super::{decode_text, ParseOptions, TableReader};
use crate::error::Result;
use crate::model::{Row, Table, Value};

/// Sniffs the first line: a tab means TSV, otherwise a comma means CSV.
/// Anything else is read line by line into `{line, content}` rows, where
/// `line` is the 1-based line number in the file. Empty lines are skipped.
#[derive(Debug, Clone, Default)]
pub struct TextReader;

impl TextReader {
    pub fn new() -> Self {
        Self
    }
}

impl TableReader for TextReader {
    fn name(&self) -> &str {
        "txt"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt", "text"]
    }

    fn read(&self, bytes: &[u8], options: &ParseOptions) -> Result<Table> {
        let text = decode_text(bytes);
        let first_line = text.lines().next().unwrap_or("");

        if first_line.contains('\t') {
            log::debug!("plain text looks tab-separated");
            return read_delimited(&text, b'\t', "txt", options);
        }
        if first_line.contains(',') {
            log::debug!("plain text looks comma-separated");
            return read_delimited(&text, b',', "txt", options);
        }

        let rows = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                Row::new()
                    .with("line", Value::from(index + 1))
                    .with("content", options.cell(line))
            })
            .collect();
        Ok(Table::from_rows(rows))
    }
}
