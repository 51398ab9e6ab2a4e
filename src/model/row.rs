//! Ordered rows.

use super::Value;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// An ordered mapping from column name to [`Value`].
///
/// Keys keep their first insertion position; inserting an existing key
/// replaces its value in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a cell.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.cells.push((key, value)),
        }
    }

    /// Builder form of [`Row::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up a cell by column name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.cells.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Cell text for a column; missing and null cells are empty.
    pub fn text(&self, key: &str) -> String {
        self.get(key).map(Value::to_text).unwrap_or_default()
    }

    /// Whether the row has a cell for this column.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Column names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(k, _)| k.as_str())
    }

    /// Cells in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Keep only the selected columns, in selection order.
    pub fn project(&self, columns: &[String]) -> Row {
        let cells = columns
            .iter()
            .filter_map(|c| self.get(c).map(|v| (c.clone(), v.clone())))
            .collect();
        Row { cells }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (k, v) in &self.cells {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
