//! CSV and TSV writer.

use super::{RenderOptions, TableWriter};
use crate::detect::Format;
use crate::error::{Error, Result};
use crate::model::Table;

/// Header line from `table.columns`, then one record per row. Null and
/// missing cells are empty. Lines end with `\n`.
#[derive(Debug, Clone)]
pub struct DelimitedWriter {
    delimiter: u8,
    format: Format,
}

impl DelimitedWriter {
    pub fn csv() -> Self {
        Self {
            delimiter: b',',
            format: Format::Csv,
        }
    }

    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            format: Format::Tsv,
        }
    }
}

impl TableWriter for DelimitedWriter {
    fn format(&self) -> Format {
        self.format
    }

    fn write(&self, table: &Table, _options: &RenderOptions) -> Result<Vec<u8>> {
        let name = self.format.name();
        let err = |e: csv::Error| Error::serialization(name, e);

        if table.columns.is_empty() {
            return Ok(Vec::new());
        }

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(&table.columns).map_err(err)?;
        for row in &table.rows {
            writer
                .write_record(table.columns.iter().map(|c| row.text(c)))
                .map_err(err)?;
        }
        writer
            .into_inner()
            .map_err(|e| Error::serialization(name, e.error()))
    }
}
