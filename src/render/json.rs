//! JSON writer.

use super::{JsonFormat, RenderOptions, TableWriter};
use crate::detect::Format;
use crate::error::{Error, Result};
use crate::model::Table;

/// An array of row objects, pretty-printed with 2-space indent unless
/// [`JsonFormat::Compact`] is requested.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonWriter;

impl TableWriter for JsonWriter {
    fn format(&self) -> Format {
        Format::Json
    }

    fn write(&self, table: &Table, options: &RenderOptions) -> Result<Vec<u8>> {
        let result = match options.json_format {
            JsonFormat::Pretty => serde_json::to_vec_pretty(&table.rows),
            JsonFormat::Compact => serde_json::to_vec(&table.rows),
        };
        result.map_err(|e| Error::serialization("json", e))
    }
}
