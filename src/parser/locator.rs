//! Strategies for finding the row array inside a nested document tree.
//!
//! XML has no native notion of "a list of records", so after the generic
//! tree conversion the parser asks an [`ArrayLocator`] where the rows are.
//! The default [`FirstArrayLocator`] takes the first array met in a
//! depth-first walk; [`PathLocator`] follows an explicit key path for
//! callers that know their schema.

use crate::model::{Row, Table, Value};
use serde_json::Value as Tree;

/// Finds the array of records inside a parsed document tree.
pub trait ArrayLocator: Send + Sync + std::fmt::Debug {
    /// Return the record array, or `None` when the tree has none.
    fn locate<'a>(&self, tree: &'a Tree) -> Option<&'a Vec<Tree>>;
}

/// Depth-first search for the first array value, visiting object keys in
/// document order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstArrayLocator;

impl ArrayLocator for FirstArrayLocator {
    fn locate<'a>(&self, tree: &'a Tree) -> Option<&'a Vec<Tree>> {
        match tree {
            Tree::Array(items) => Some(items),
            Tree::Object(map) => map.values().find_map(|v| self.locate(v)),
            _ => None,
        }
    }
}

/// Follows a fixed key path (e.g. `["catalog", "book"]`).
///
/// A single object at the end of the path is not an array; it yields
/// `None` so the caller's fallback applies.
#[derive(Debug, Clone, Default)]
pub struct PathLocator {
    path: Vec<String>,
}

impl PathLocator {
    /// Create a locator from path segments.
    pub fn new<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a dotted path such as `catalog.book`.
    pub fn parse(dotted: &str) -> Self {
        Self::new(dotted.split('.').filter(|s| !s.is_empty()))
    }
}

impl ArrayLocator for PathLocator {
    fn locate<'a>(&self, tree: &'a Tree) -> Option<&'a Vec<Tree>> {
        let mut node = tree;
        for key in &self.path {
            node = node.as_object()?.get(key)?;
        }
        node.as_array()
    }
}

/// Turn one record into a row.
///
/// Objects map key-to-cell; anything else becomes a single `value` cell.
pub(crate) fn row_from_tree(item: &Tree) -> Row {
    match item {
        Tree::Object(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.clone())))
            .collect(),
        other => Row::new().with("value", Value::from(other.clone())),
    }
}

/// Table for a JSON-shaped document: an array becomes rows, an object
/// becomes a single row, a bare scalar a single `value` row.
pub(crate) fn table_from_tree(tree: &Tree) -> Table {
    match tree {
        Tree::Array(items) => Table::from_rows(items.iter().map(row_from_tree).collect()),
        Tree::Null => Table::new(),
        other => Table::from_rows(vec![row_from_tree(other)]),
    }
}
