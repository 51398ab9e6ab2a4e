//! INI reader.

use super::{decode_text, ParseOptions, TableReader};
use crate::error::Result;
use crate::model::{Row, Table};

/// Section used for keys that appear before any `[section]` header.
pub const ROOT_SECTION: &str = "root";

/// Each `key=value` line becomes a `{section, key, value}` row.
///
/// Lines starting with `;` or `#` are comments. Values are split at the
/// first `=`, trimmed, and one pair of matching surrounding quotes is
/// removed. Lines that are neither headers nor assignments are skipped.
#[derive(Debug, Clone, Default)]
pub struct IniReader;

impl IniReader {
    pub fn new() -> Self {
        Self
    }
}

impl TableReader for IniReader {
    fn name(&self) -> &str {
        "ini"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["ini"]
    }

    fn read(&self, bytes: &[u8], _options: &ParseOptions) -> Result<Table> {
        let text = decode_text(bytes);
        let mut section = ROOT_SECTION.to_string();
        let mut rows = Vec::new();

        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = name.trim().to_string();
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::warn!("ini line {}: not a key=value pair, skipped", number + 1);
                continue;
            };
            rows.push(
                Row::new()
                    .with("section", section.clone())
                    .with("key", key.trim())
                    .with("value", unquote(value.trim())),
            );
        }
        Ok(Table::from_rows(rows))
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
