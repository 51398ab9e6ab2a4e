//! YAML writer: a block-style sequence of mappings.

use super::{RenderOptions, TableWriter};
use crate::detect::Format;
use crate::error::{Error, Result};
use crate::model::Table;

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlWriter;

impl TableWriter for YamlWriter {
    fn format(&self) -> Format {
        Format::Yaml
    }

    fn write(&self, table: &Table, _options: &RenderOptions) -> Result<Vec<u8>> {
        serde_yaml::to_string(&table.rows)
            .map(String::into_bytes)
            .map_err(|e| Error::serialization("yaml", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Row;
    use crate::parser::{ParseOptions, TableReader, YamlReader};

    #[test]
    fn test_block_style() {
        let table = Table::from_rows(vec![
            Row::new().with("name", "Alice").with("age", 30i64),
            Row::new().with("name", "Bob").with("age", 25i64),
        ]);
        let out = String::from_utf8(YamlWriter.write(&table, &RenderOptions::default()).unwrap())
            .unwrap();
        assert_eq!(out, "- name: Alice\n  age: 30\n- name: Bob\n  age: 25\n");

        let back = YamlReader::new()
            .read(out.as_bytes(), &ParseOptions::default())
            .unwrap();
        assert_eq!(back, table);
    }
}
