//! Markdown writer.

use super::{RenderOptions, TableWriter};
use crate::detect::Format;
use crate::error::Result;
use crate::model::Table;

/// GitHub-style pipe table. Pipes in cells are escaped as `\|` and line
/// breaks are folded into spaces. An empty table renders as nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownWriter;

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace("\r\n", " ").replace(['\n', '\r'], " ")
}

impl TableWriter for MarkdownWriter {
    fn format(&self) -> Format {
        Format::Markdown
    }

    fn write(&self, table: &Table, _options: &RenderOptions) -> Result<Vec<u8>> {
        if table.is_empty() {
            return Ok(Vec::new());
        }

        let line = |cells: Vec<String>| format!("| {} |\n", cells.join(" | "));

        let mut md = line(table.columns.iter().map(|c| escape_cell(c)).collect());
        md.push_str(&line(table.columns.iter().map(|_| "---".to_string()).collect()));
        for row in &table.rows {
            md.push_str(&line(
                table
                    .columns
                    .iter()
                    .map(|c| escape_cell(&row.text(c)))
                    .collect(),
            ));
        }
        Ok(md.into_bytes())
    }
}
