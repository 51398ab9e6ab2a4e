//! Tables: ordered rows plus the authoritative column header.

use super::Row;
use serde::Serialize;

/// A parsed table.
///
/// `columns` is the union of row keys in order of first appearance, so the
/// first row's keys always form its prefix. It is empty when there are no
/// rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    /// Column names in first-seen order
    pub columns: Vec<String>,

    /// Data rows
    pub rows: Vec<Row>,
}

impl Table {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from rows, deriving the column union.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.to_string());
                }
            }
        }
        Self { columns, rows }
    }

    /// Append a row, extending `columns` with any new keys.
    pub fn push(&mut self, row: Row) {
        for key in row.keys() {
            if !self.columns.iter().any(|c| c == key) {
                self.columns.push(key.to_string());
            }
        }
        self.rows.push(row);
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Restrict the table to a column subset.
    ///
    /// Columns keep the selection order; names that do not exist are
    /// ignored. Each row keeps only the selected keys it actually has.
    pub fn project(&self, selection: &[String]) -> Table {
        let columns: Vec<String> = selection
            .iter()
            .filter(|s| self.columns.contains(s))
            .fold(Vec::new(), |mut acc, s| {
                if !acc.contains(s) {
                    acc.push(s.clone());
                }
                acc
            });
        let rows = self.rows.iter().map(|r| r.project(&columns)).collect();
        Table { columns, rows }
    }

    /// Size of the compact JSON rendering of the rows, in KiB.
    pub fn estimate_kb(&self) -> f64 {
        serde_json::to_vec(&self.rows)
            .map(|bytes| bytes.len() as f64 / 1024.0)
            .unwrap_or(0.0)
    }
}
