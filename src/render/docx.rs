//! DOCX writer.

use super::{RenderOptions, TableWriter};
use crate::detect::Format;
use crate::error::Result;
use crate::model::Table;
use crate::ooxml::{escape, strip_invalid_chars, PackageWriter};
use std::fmt::Write;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const BORDERS: &str = r#"<w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders>"#;

/// Usable text width of a Letter/A4 page with 1" margins, in twentieths
/// of a point.
const TEXT_WIDTH_TWIPS: usize = 9360;

/// A heading followed by a bordered table whose first row holds the
/// column names in bold.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxWriter;

impl TableWriter for DocxWriter {
    fn format(&self) -> Format {
        Format::Docx
    }

    fn write(&self, table: &Table, options: &RenderOptions) -> Result<Vec<u8>> {
        let mut pkg = PackageWriter::new("docx");
        pkg.add("[Content_Types].xml", CONTENT_TYPES)?;
        pkg.add("_rels/.rels", ROOT_RELS)?;
        pkg.add("word/document.xml", &document_xml(table, &options.document_title))?;
        pkg.finish()
    }
}

fn run(out: &mut String, text: &str, bold: bool, size: Option<u32>) {
    out.push_str("<w:r>");
    if bold || size.is_some() {
        out.push_str("<w:rPr>");
        if bold {
            out.push_str("<w:b/>");
        }
        if let Some(size) = size {
            let _ = write!(out, r#"<w:sz w:val="{size}"/>"#);
        }
        out.push_str("</w:rPr>");
    }
    let text = strip_invalid_chars(text);
    let _ = write!(out, r#"<w:t xml:space="preserve">{}</w:t></w:r>"#, escape(&text));
}

fn cell(out: &mut String, text: &str, bold: bool, width: usize) {
    let _ = write!(
        out,
        r#"<w:tc><w:tcPr><w:tcW w:w="{width}" w:type="dxa"/></w:tcPr><w:p>"#
    );
    if !text.is_empty() {
        run(out, text, bold, None);
    }
    out.push_str("</w:p></w:tc>");
}

fn document_xml(table: &Table, title: &str) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
    );

    out.push_str("<w:p>");
    run(&mut out, title, true, Some(32));
    out.push_str("</w:p>");

    if !table.columns.is_empty() {
        let width = TEXT_WIDTH_TWIPS / table.columns.len();
        let _ = write!(
            out,
            r#"<w:tbl><w:tblPr><w:tblW w:w="{TEXT_WIDTH_TWIPS}" w:type="dxa"/>{BORDERS}</w:tblPr><w:tblGrid>"#
        );
        for _ in &table.columns {
            let _ = write!(out, r#"<w:gridCol w:w="{width}"/>"#);
        }
        out.push_str("</w:tblGrid><w:tr>");
        for name in &table.columns {
            cell(&mut out, name, true, width);
        }
        out.push_str("</w:tr>");
        for row in &table.rows {
            out.push_str("<w:tr>");
            for name in &table.columns {
                cell(&mut out, &row.text(name), false, width);
            }
            out.push_str("</w:tr>");
        }
        // A document may not end with a table.
        out.push_str("</w:tbl><w:p/>");
    }

    out.push_str("</w:body></w:document>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Row;
    use crate::parser::{DocxReader, ParseOptions, TableReader};

    #[test]
    fn test_heading_and_bold_header() {
        let table = Table::from_rows(vec![Row::new().with("name", "Alice & Bob").with("age", "30")]);
        let xml = document_xml(&table, "Report");
        assert!(xml.contains(r#"<w:b/><w:sz w:val="32"/></w:rPr><w:t xml:space="preserve">Report</w:t>"#));
        assert!(xml.contains(r#"<w:rPr><w:b/></w:rPr><w:t xml:space="preserve">name</w:t>"#));
        assert!(xml.contains("Alice &amp; Bob"));
        assert_eq!(xml.matches("<w:tr>").count(), 2);
    }

    #[test]
    fn test_reads_back_as_paragraphs() {
        let table = Table::from_rows(vec![Row::new().with("name", "Alice").with("age", "30")]);
        let options = RenderOptions::new().with_document_title("People");
        let bytes = DocxWriter.write(&table, &options).unwrap();
        let back = DocxReader::new()
            .read(&bytes, &ParseOptions::default())
            .unwrap();
        let contents: Vec<String> = back.rows.iter().map(|r| r.text("content")).collect();
        assert_eq!(contents, vec!["People", "name", "age", "Alice", "30"]);
    }

    #[test]
    fn test_empty_table_has_heading_only() {
        let xml = document_xml(&Table::new(), "Converted Data");
        assert!(xml.contains("Converted Data"));
        assert!(!xml.contains("<w:tbl>"));
    }
}
