//! DOCX reader: paragraph text only.

use super::{ParseOptions, TableReader};
use crate::error::{Error, Result};
use crate::model::{Row, Table, Value};
use crate::ooxml::Package;
use quick_xml::events::Event;
use quick_xml::Reader;

const FORMAT: &str = "docx";

/// Extracts the raw text of `word/document.xml` paragraph by paragraph.
/// Each non-empty paragraph becomes `{paragraph, content}` with a 1-based
/// count over non-empty paragraphs. Tables and formatting are flattened.
#[derive(Debug, Clone, Default)]
pub struct DocxReader;

impl DocxReader {
    pub fn new() -> Self {
        Self
    }
}

impl TableReader for DocxReader {
    fn name(&self) -> &str {
        FORMAT
    }

    fn supported_extensions(&self) -> &[&str] {
        &["docx"]
    }

    fn read(&self, bytes: &[u8], options: &ParseOptions) -> Result<Table> {
        let mut package = Package::open(bytes, FORMAT)?;
        let document = package.required_part("word/document.xml")?;

        let rows = paragraphs(&document)?
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .enumerate()
            .map(|(index, content)| {
                Row::new()
                    .with("paragraph", Value::from(index + 1))
                    .with("content", options.cell(&content))
            })
            .collect();
        Ok(Table::from_rows(rows))
    }
}

fn paragraphs(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader
            .read_event()
            .map_err(|e| Error::parse(FORMAT, e))?
        {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => current.clear(),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" | b"cr" => current.push('\n'),
                b"p" => out.push(String::new()),
                _ => {}
            },
            Event::Text(t) if in_text => {
                current.push_str(&t.unescape().map_err(|e| Error::parse(FORMAT, e))?)
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::PackageWriter;

    fn docx(body: &str) -> Vec<u8> {
        let mut pkg = PackageWriter::new(FORMAT);
        pkg.add(
            "word/document.xml",
            &format!(
                r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
            ),
        )
        .unwrap();
        pkg.finish().unwrap()
    }

    #[test]
    fn test_paragraphs() {
        let bytes = docx(
            r#"<w:p><w:r><w:t>Hello </w:t></w:r><w:r><w:t>world</w:t></w:r></w:p>
               <w:p/>
               <w:p><w:r><w:t xml:space="preserve">   </w:t></w:r></w:p>
               <w:p><w:r><w:t>a</w:t><w:tab/><w:t>b &amp; c</w:t></w:r></w:p>"#,
        );
        let table = DocxReader::new()
            .read(&bytes, &ParseOptions::default())
            .unwrap();
        assert_eq!(table.columns, vec!["paragraph", "content"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0].text("content"), "Hello world");
        assert_eq!(table.rows[1].get("paragraph"), Some(&Value::from(2usize)));
        assert_eq!(table.rows[1].text("content"), "a\tb & c");
    }

    #[test]
    fn test_missing_document_part() {
        let mut pkg = PackageWriter::new(FORMAT);
        pkg.add("other.xml", "<x/>").unwrap();
        let bytes = pkg.finish().unwrap();
        let err = DocxReader::new()
            .read(&bytes, &ParseOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Parse { format: "docx", .. }));
    }
}
