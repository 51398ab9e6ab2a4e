//! XLSX writer.

use super::{RenderOptions, TableWriter};
use crate::detect::Format;
use crate::error::Result;
use crate::model::{Table, Value};
use crate::ooxml::{escape, strip_invalid_chars, PackageWriter};
use crate::parser::column_name;
use std::fmt::Write;

const SHEET_NAME: &str = "Data";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

/// Single worksheet named `Data`: a header row from `table.columns`, then
/// one row per record. Strings are written inline, numbers and booleans
/// keep their type, null cells are left out.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxWriter;

impl TableWriter for XlsxWriter {
    fn format(&self) -> Format {
        Format::Xlsx
    }

    fn write(&self, table: &Table, _options: &RenderOptions) -> Result<Vec<u8>> {
        let mut pkg = PackageWriter::new("xlsx");
        pkg.add("[Content_Types].xml", CONTENT_TYPES)?;
        pkg.add("_rels/.rels", ROOT_RELS)?;
        pkg.add("xl/workbook.xml", &workbook_xml())?;
        pkg.add("xl/_rels/workbook.xml.rels", WORKBOOK_RELS)?;
        pkg.add("xl/worksheets/sheet1.xml", &sheet_xml(table))?;
        pkg.finish()
    }
}

fn workbook_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{SHEET_NAME}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
    )
}

fn string_cell(out: &mut String, reference: &str, text: &str) {
    let text = strip_invalid_chars(text);
    let space = if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        r#" xml:space="preserve""#
    } else {
        ""
    };
    let _ = write!(
        out,
        r#"<c r="{reference}" t="inlineStr"><is><t{space}>{}</t></is></c>"#,
        escape(&text)
    );
}

fn sheet_xml(table: &Table) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    if !table.columns.is_empty() {
        out.push_str(r#"<row r="1">"#);
        for (col, name) in table.columns.iter().enumerate() {
            string_cell(&mut out, &format!("{}1", column_name(col)), name);
        }
        out.push_str("</row>");
    }

    for (index, row) in table.rows.iter().enumerate() {
        let r = index + 2;
        let _ = write!(out, r#"<row r="{r}">"#);
        for (col, name) in table.columns.iter().enumerate() {
            let reference = format!("{}{r}", column_name(col));
            match row.get(name) {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) => string_cell(&mut out, &reference, s),
                Some(Value::Number(n)) => {
                    let _ = write!(out, r#"<c r="{reference}"><v>{n}</v></c>"#);
                }
                Some(Value::Bool(b)) => {
                    let _ = write!(out, r#"<c r="{reference}" t="b"><v>{}</v></c>"#, u8::from(*b));
                }
            }
        }
        out.push_str("</row>");
    }

    out.push_str("</sheetData></worksheet>");
    out
}
