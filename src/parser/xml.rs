//! XML reader.
//!
//! The document is first converted into a generic tree: attributes become
//! `@_name` keys, repeated child elements become arrays, text-only
//! elements become strings and text mixed with child elements is kept
//! under `#text`. An [`ArrayLocator`] then picks the record array.

use super::locator::{row_from_tree, ArrayLocator, FirstArrayLocator};
use super::{decode_text, LocatorMode, ParseOptions, TableReader};
use crate::error::{Error, Result};
use crate::model::{Row, Table};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value as Tree};
use std::sync::Arc;

const FORMAT: &str = "xml";

/// Prefix for attribute keys.
pub const ATTRIBUTE_PREFIX: &str = "@_";
/// Key for text content of elements that also have children or attributes.
pub const TEXT_KEY: &str = "#text";

/// Reader for XML documents.
#[derive(Debug, Clone)]
pub struct XmlReader {
    locator: Arc<dyn ArrayLocator>,
}

impl XmlReader {
    /// Reader using depth-first array search.
    pub fn new() -> Self {
        Self {
            locator: Arc::new(FirstArrayLocator),
        }
    }

    /// Use a custom strategy to find the record array.
    pub fn with_locator(mut self, locator: Arc<dyn ArrayLocator>) -> Self {
        self.locator = locator;
        self
    }
}

impl Default for XmlReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TableReader for XmlReader {
    fn name(&self) -> &str {
        FORMAT
    }

    fn supported_extensions(&self) -> &[&str] {
        &["xml"]
    }

    fn read(&self, bytes: &[u8], options: &ParseOptions) -> Result<Table> {
        let text = decode_text(bytes);
        let Some((root_name, root)) = parse_tree(&text)? else {
            return Ok(Table::new());
        };

        let mut document = Map::new();
        document.insert(root_name.clone(), root);
        let document = Tree::Object(document);

        if let Some(items) = self.locator.locate(&document) {
            return Ok(Table::from_rows(items.iter().map(row_from_tree).collect()));
        }

        match options.locator {
            LocatorMode::Strict => Err(Error::parse(
                FORMAT,
                format!("no repeated element found under <{root_name}>"),
            )),
            LocatorMode::FirstArray => {
                log::info!("no repeated element under <{root_name}>, reading it as one row");
                let row = match &document[&root_name] {
                    Tree::Object(_) => row_from_tree(&document[&root_name]),
                    other => Row::new().with(root_name.clone(), other.clone()),
                };
                Ok(Table::from_rows(vec![row]))
            }
        }
    }
}

struct Frame {
    name: String,
    children: Map<String, Tree>,
    text: String,
}

impl Frame {
    fn open(element: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
        let mut children = Map::new();
        for attribute in element.attributes() {
            let attribute = attribute.map_err(|e| Error::parse(FORMAT, e))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref());
            let value = attribute
                .unescape_value()
                .map_err(|e| Error::parse(FORMAT, e))?;
            children.insert(
                format!("{ATTRIBUTE_PREFIX}{key}"),
                Tree::String(value.into_owned()),
            );
        }
        Ok(Self {
            name,
            children,
            text: String::new(),
        })
    }

    fn close(mut self) -> (String, Tree) {
        let value = if self.children.is_empty() {
            Tree::String(self.text)
        } else {
            if !self.text.is_empty() {
                self.children.insert(TEXT_KEY.to_string(), Tree::String(self.text));
            }
            Tree::Object(self.children)
        };
        (self.name, value)
    }
}

fn attach(parent: &mut Map<String, Tree>, name: String, value: Tree) {
    match parent.get_mut(&name) {
        Some(Tree::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Tree::Array(vec![first, value]);
        }
        None => {
            parent.insert(name, value);
        }
    }
}

/// Convert a document into `(root name, root value)`, or `None` when the
/// input has no root element.
fn parse_tree(text: &str) -> Result<Option<(String, Tree)>> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root = None;

    let mut finish = |stack: &mut Vec<Frame>, frame: Frame| {
        let (name, value) = frame.close();
        match stack.last_mut() {
            Some(parent) => attach(&mut parent.children, name, value),
            None => root = Some((name, value)),
        }
    };

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::parse(FORMAT, format!("at byte {}: {e}", reader.buffer_position())))?;
        match event {
            Event::Start(e) => stack.push(Frame::open(&e)?),
            Event::Empty(e) => {
                let frame = Frame::open(&e)?;
                finish(&mut stack, frame);
            }
            Event::End(_) => {
                if let Some(frame) = stack.pop() {
                    finish(&mut stack, frame);
                }
            }
            Event::Text(t) => {
                if let Some(frame) = stack.last_mut() {
                    frame
                        .text
                        .push_str(&t.unescape().map_err(|e| Error::parse(FORMAT, e))?);
                }
            }
            Event::CData(t) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::parse(FORMAT, format!("unclosed element <{}>", open.name)));
    }
    Ok(root)
}
