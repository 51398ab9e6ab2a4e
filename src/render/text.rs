//! Plain-text writer.

use super::{RenderOptions, TableWriter};
use crate::detect::Format;
use crate::error::Result;
use crate::model::Table;

/// Tab-joined header line followed by tab-joined value lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextWriter;

impl TableWriter for TextWriter {
    fn format(&self) -> Format {
        Format::Text
    }

    fn write(&self, table: &Table, _options: &RenderOptions) -> Result<Vec<u8>> {
        if table.columns.is_empty() {
            return Ok(Vec::new());
        }

        let mut lines = Vec::with_capacity(table.rows.len() + 1);
        lines.push(table.columns.join("\t"));
        for row in &table.rows {
            let cells: Vec<String> = table.columns.iter().map(|c| row.text(c)).collect();
            lines.push(cells.join("\t"));
        }
        Ok(lines.join("\n").into_bytes())
    }
}
