//! JSON reader.

use super::locator::table_from_tree;
use super::{decode_text, ParseOptions, TableReader};
use crate::error::{Error, Result};
use crate::model::Table;

/// A top-level array becomes the rows; a top-level object becomes a
/// single-row table. Scalar types are kept; nested values are stored as
/// compact JSON text.
#[derive(Debug, Clone, Default)]
pub struct JsonReader;

impl JsonReader {
    pub fn new() -> Self {
        Self
    }
}

impl TableReader for JsonReader {
    fn name(&self) -> &str {
        "json"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json"]
    }

    fn read(&self, bytes: &[u8], _options: &ParseOptions) -> Result<Table> {
        let text = decode_text(bytes);
        let tree: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| Error::parse("json", e))?;
        Ok(table_from_tree(&tree))
    }
}
