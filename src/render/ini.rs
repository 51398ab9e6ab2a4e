//! INI writer.

use super::{RenderOptions, TableWriter};
use crate::detect::Format;
use crate::error::Result;
use crate::model::{Row, Table};
use crate::parser::ROOT_SECTION;
use std::fmt::Write;

const TRIPLE: [&str; 3] = ["section", "key", "value"];

/// Tables shaped exactly like INI reader output (`section`, `key`,
/// `value`) are regrouped into sections; keys of the `root` section are
/// written first without a header. Any other table is flattened into a
/// single `[data]` section of `row{N}_{column}` keys, `N` starting at 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct IniWriter;

fn is_triple(row: &Row) -> bool {
    row.len() == TRIPLE.len() && TRIPLE.iter().all(|k| row.contains_key(k))
}

fn flatten(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

impl TableWriter for IniWriter {
    fn format(&self) -> Format {
        Format::Ini
    }

    fn write(&self, table: &Table, _options: &RenderOptions) -> Result<Vec<u8>> {
        if table.is_empty() {
            return Ok(Vec::new());
        }

        let mut out = String::new();

        if table.rows.iter().all(is_triple) {
            let mut sections: Vec<(String, Vec<(String, String)>)> = Vec::new();
            for row in &table.rows {
                let name = row.text("section");
                let entry = (flatten(&row.text("key")), flatten(&row.text("value")));
                match sections.iter_mut().find(|(s, _)| *s == name) {
                    Some((_, entries)) => entries.push(entry),
                    None => sections.push((name, vec![entry])),
                }
            }
            sections.sort_by_key(|(name, _)| name != ROOT_SECTION);

            let mut first = true;
            for (name, entries) in &sections {
                if name != ROOT_SECTION {
                    if !first {
                        out.push('\n');
                    }
                    let _ = writeln!(out, "[{name}]");
                }
                for (key, value) in entries {
                    let _ = writeln!(out, "{key}={value}");
                }
                first = false;
            }
        } else {
            out.push_str("[data]\n");
            for (index, row) in table.rows.iter().enumerate() {
                for (column, value) in row.iter() {
                    let _ = writeln!(
                        out,
                        "row{}_{}={}",
                        index + 1,
                        flatten(column),
                        flatten(&value.to_text())
                    );
                }
            }
        }
        Ok(out.into_bytes())
    }
}
