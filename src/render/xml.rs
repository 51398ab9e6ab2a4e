//! XML writer.

use super::{RenderOptions, TableWriter};
use crate::detect::Format;
use crate::error::{Error, Result};
use crate::model::{Table, Value};
use crate::ooxml::strip_invalid_chars;
use crate::parser::{ATTRIBUTE_PREFIX, TEXT_KEY};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::borrow::Cow;
use std::io::Cursor;

/// Writes `<root><item>...</item>...</root>` with 2-space indentation.
///
/// Keys read from XML attributes (`@_name`) go back to attributes and
/// `#text` goes back to element text, so tables read from XML keep their
/// shape. Other keys become child elements with sanitized names.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlWriter;

fn err(e: impl std::fmt::Display) -> Error {
    Error::serialization("xml", e)
}

/// Make a string usable as an element or attribute name.
pub(crate) fn element_name(key: &str) -> Cow<'_, str> {
    let valid_start = |c: char| c.is_alphabetic() || c == '_';
    let valid = |c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.');

    let mut chars = key.chars();
    let ok = match chars.next() {
        Some(first) => valid_start(first) && chars.all(valid),
        None => false,
    };
    if ok {
        return Cow::Borrowed(key);
    }

    let mut name: String = key.chars().map(|c| if valid(c) { c } else { '_' }).collect();
    if !name.starts_with(valid_start) {
        name.insert(0, '_');
    }
    Cow::Owned(name)
}

impl TableWriter for XmlWriter {
    fn format(&self) -> Format {
        Format::Xml
    }

    fn write(&self, table: &Table, _options: &RenderOptions) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(err)?;

        if table.rows.is_empty() {
            writer
                .write_event(Event::Empty(BytesStart::new("root")))
                .map_err(err)?;
            return Ok(writer.into_inner().into_inner());
        }

        writer
            .write_event(Event::Start(BytesStart::new("root")))
            .map_err(err)?;

        for row in &table.rows {
            let mut item = BytesStart::new("item");
            let mut text = None;
            let mut children = Vec::new();
            for (key, value) in row.iter() {
                if let Some(attribute) = key.strip_prefix(ATTRIBUTE_PREFIX) {
                    let value = value.to_text();
                    item.push_attribute((
                        element_name(attribute).as_ref(),
                        strip_invalid_chars(&value).as_ref(),
                    ));
                } else if key == TEXT_KEY {
                    text = Some(value.to_text());
                } else {
                    children.push((element_name(key), value));
                }
            }

            if children.is_empty() && text.is_none() {
                writer.write_event(Event::Empty(item)).map_err(err)?;
                continue;
            }

            writer.write_event(Event::Start(item)).map_err(err)?;
            if let Some(text) = text {
                writer
                    .write_event(Event::Text(BytesText::new(&strip_invalid_chars(&text))))
                    .map_err(err)?;
            }
            for (name, value) in children {
                match value {
                    Value::Null => writer
                        .write_event(Event::Empty(BytesStart::new(name.as_ref())))
                        .map_err(err)?,
                    other => {
                        let content = other.to_text();
                        writer
                            .create_element(name.as_ref())
                            .write_text_content(BytesText::new(&strip_invalid_chars(&content)))
                            .map_err(err)?;
                    }
                }
            }
            writer
                .write_event(Event::End(BytesEnd::new("item")))
                .map_err(err)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("root")))
            .map_err(err)?;
        Ok(writer.into_inner().into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Row;
    use crate::parser::{ParseOptions, TableReader, XmlReader};

    fn write(table: &Table) -> String {
        String::from_utf8(XmlWriter.write(table, &RenderOptions::default()).unwrap()).unwrap()
    }

    #[test]
    fn test_element_name() {
        assert_eq!(element_name("name"), "name");
        assert_eq!(element_name("first name"), "first_name");
        assert_eq!(element_name("2024"), "_2024");
        assert_eq!(element_name(""), "_");
    }

    #[test]
    fn test_layout() {
        let table = Table::from_rows(vec![
            Row::new().with("name", "Alice").with("age", 30i64),
            Row::new().with("name", "B & B").with("age", Value::Null),
        ]);
        let xml = write(&table);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("\n<root>\n  <item>\n    <name>Alice</name>"));
        assert!(xml.contains("<name>B &amp; B</name>"));
        assert!(xml.contains("<age/>"));
    }

    #[test]
    fn test_attributes_round_trip() {
        let source = r#"<catalog><book id="1"><title>Dune</title></book><book id="2"><title>Emma</title></book></catalog>"#;
        let table = XmlReader::new()
            .read(source.as_bytes(), &ParseOptions::default())
            .unwrap();
        let xml = write(&table);
        assert!(xml.contains(r#"<item id="1">"#));

        let back = XmlReader::new()
            .read(xml.as_bytes(), &ParseOptions::default())
            .unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_empty_table() {
        assert!(write(&Table::new()).ends_with("<root/>"));
    }
}
