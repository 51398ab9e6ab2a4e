//! YAML reader. Same array/object handling as JSON.

use super::locator::table_from_tree;
use super::{decode_text, ParseOptions, TableReader};
use crate::error::{Error, Result};
use crate::model::Table;

#[derive(Debug, Clone, Default)]
pub struct YamlReader;

impl YamlReader {
    pub fn new() -> Self {
        Self
    }
}

impl TableReader for YamlReader {
    fn name(&self) -> &str {
        "yaml"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }

    fn read(&self, bytes: &[u8], _options: &ParseOptions) -> Result<Table> {
        let text = decode_text(bytes);
        if text.trim().is_empty() {
            return Ok(Table::new());
        }
        let tree: serde_json::Value =
            serde_yaml::from_str(&text).map_err(|e| Error::parse("yaml", e))?;
        Ok(table_from_tree(&tree))
    }
}
