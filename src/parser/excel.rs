//! XLSX reader.
//!
//! Reads the first worksheet of a SpreadsheetML package. The first row is
//! the header; cells past the header (or under a blank header cell) are
//! keyed `column_{index}`. Missing cells default to an empty string and
//! rows without any cell content are skipped.

use super::{unique_headers, ParseOptions, TableReader};
use crate::error::{Error, Result};
use crate::model::{Row, Table, Value};
use crate::ooxml::{attr, Package};
use quick_xml::events::Event;
use quick_xml::Reader;

const FORMAT: &str = "xlsx";
const FALLBACK_SHEET: &str = "xl/worksheets/sheet1.xml";

/// Reader for `.xlsx` workbooks (the `xls` alias is accepted when the
/// content is an OOXML package).
#[derive(Debug, Clone, Default)]
pub struct XlsxReader;

impl XlsxReader {
    pub fn new() -> Self {
        Self
    }
}

impl TableReader for XlsxReader {
    fn name(&self) -> &str {
        FORMAT
    }

    fn supported_extensions(&self) -> &[&str] {
        &["xlsx", "xls"]
    }

    fn read(&self, bytes: &[u8], options: &ParseOptions) -> Result<Table> {
        let mut package = Package::open(bytes, FORMAT)?;

        let shared = match package.part("xl/sharedStrings.xml")? {
            Some(xml) => shared_strings(&xml)?,
            None => Vec::new(),
        };
        let sheet_path = first_sheet_path(&mut package)?;
        log::debug!("reading worksheet {sheet_path}");
        let sheet = package.required_part(&sheet_path)?;
        let grid = sheet_cells(&sheet, &shared)?;

        Ok(grid_to_table(grid, options))
    }
}

/// Zero-based column index of a cell reference such as `AB12`.
pub(crate) fn column_index(reference: &str) -> Option<usize> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .collect();
    if letters.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for b in letters {
        index = index * 26 + (b.to_ascii_uppercase() - b'A' + 1) as usize;
    }
    Some(index - 1)
}

/// Column letters for a zero-based index (`0` is `A`, `26` is `AA`).
pub(crate) fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

fn xml_error(e: impl std::fmt::Display) -> Error {
    Error::parse(FORMAT, e)
}

fn shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_t = false;
    let mut phonetic_depth = 0usize;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"rPh" => phonetic_depth += 1,
                b"t" => in_t = phonetic_depth == 0,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.push(std::mem::take(&mut current)),
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"t" => in_t = false,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(t) if in_t => current.push_str(&t.unescape().map_err(xml_error)?),
            Event::CData(t) if in_t => current.push_str(&String::from_utf8_lossy(&t)),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
}

/// Resolve the first sheet through the workbook relationships.
fn first_sheet_path(package: &mut Package<'_>) -> Result<String> {
    let Some(workbook) = package.part("xl/workbook.xml")? else {
        return Ok(FALLBACK_SHEET.to_string());
    };

    let mut rel_id = None;
    let mut reader = Reader::from_str(&workbook);
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                rel_id = attr(&e, b"id");
                break;
            }
            Event::Eof => break,
            _ => {}
        }
    }
    let Some(rel_id) = rel_id else {
        return Ok(FALLBACK_SHEET.to_string());
    };

    let Some(rels) = package.part("xl/_rels/workbook.xml.rels")? else {
        return Ok(FALLBACK_SHEET.to_string());
    };
    let mut reader = Reader::from_str(&rels);
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e)
                if e.local_name().as_ref() == b"Relationship"
                    && attr(&e, b"Id").as_deref() == Some(rel_id.as_str()) =>
            {
                if let Some(target) = attr(&e, b"Target") {
                    return Ok(match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("xl/{target}"),
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(FALLBACK_SHEET.to_string())
}

type Grid = Vec<Vec<(usize, Value)>>;

fn cell_value(kind: &str, raw: String, shared: &[String]) -> Value {
    match kind {
        "s" => raw
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| shared.get(i))
            .map(|s| Value::String(s.clone()))
            .unwrap_or_else(|| Value::String(String::new())),
        "b" => Value::Bool(raw.trim() == "1"),
        "str" | "inlineStr" | "e" => Value::String(raw),
        _ => number_value(&raw),
    }
}

fn number_value(raw: &str) -> Value {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Value::from(n);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Value::from(f as i64),
        Ok(f) => Value::from(f),
        Err(_) => Value::String(raw.to_string()),
    }
}

fn sheet_cells(xml: &str, shared: &[String]) -> Result<Grid> {
    let mut reader = Reader::from_str(xml);
    let mut grid: Grid = Vec::new();
    let mut row: Vec<(usize, Value)> = Vec::new();
    let mut next_col = 0usize;

    let mut cell_col = 0usize;
    let mut cell_kind = String::new();
    let mut text = String::new();
    let mut capture = false;
    let mut has_value = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    row.clear();
                    next_col = 0;
                }
                b"c" => {
                    cell_col = attr(&e, b"r")
                        .and_then(|r| column_index(&r))
                        .unwrap_or(next_col);
                    cell_kind = attr(&e, b"t").unwrap_or_default();
                    text.clear();
                    has_value = false;
                }
                b"v" | b"t" => {
                    capture = true;
                    has_value = true;
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"c" => {
                    let col = attr(&e, b"r")
                        .and_then(|r| column_index(&r))
                        .unwrap_or(next_col);
                    next_col = col + 1;
                }
                b"row" => grid.push(Vec::new()),
                _ => {}
            },
            Event::Text(t) if capture => text.push_str(&t.unescape().map_err(xml_error)?),
            Event::CData(t) if capture => text.push_str(&String::from_utf8_lossy(&t)),
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => capture = false,
                b"c" => {
                    if has_value {
                        let value = cell_value(&cell_kind, std::mem::take(&mut text), shared);
                        row.push((cell_col, value));
                    }
                    next_col = cell_col + 1;
                }
                b"row" => grid.push(std::mem::take(&mut row)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(grid)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn grid_to_table(grid: Grid, options: &ParseOptions) -> Table {
    let mut rows_iter = grid
        .into_iter()
        .filter(|cells| cells.iter().any(|(_, v)| !is_blank(v)));

    let Some(header_cells) = rows_iter.next() else {
        return Table::new();
    };
    let width = header_cells.iter().map(|(c, _)| c + 1).max().unwrap_or(0);
    let mut names = vec![String::new(); width];
    for (col, value) in header_cells {
        names[col] = value.to_text();
    }
    let mut headers = unique_headers(&names);

    let mut rows = Vec::new();
    for cells in rows_iter {
        let row_width = cells.iter().map(|(c, _)| c + 1).max().unwrap_or(0);
        while headers.len() < row_width {
            let extra = format!("column_{}", headers.len());
            headers.push(extra);
        }
        let mut row = Row::new();
        for header in &headers {
            row.insert(header.clone(), Value::String(String::new()));
        }
        for (col, value) in cells {
            let value = match value {
                Value::String(s) => Value::String(options.cell(&s)),
                other => other,
            };
            row.insert(headers[col].clone(), value);
        }
        rows.push(row);
    }
    Table::from_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::PackageWriter;

    fn workbook(sheet_xml: &str, shared: Option<&str>) -> Vec<u8> {
        let mut pkg = PackageWriter::new(FORMAT);
        pkg.add(
            "xl/workbook.xml",
            r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="First" sheetId="1" r:id="rId7"/></sheets></workbook>"#,
        )
        .unwrap();
        pkg.add(
            "xl/_rels/workbook.xml.rels",
            r#"<Relationships><Relationship Id="rId7" Type="worksheet" Target="worksheets/data.xml"/></Relationships>"#,
        )
        .unwrap();
        pkg.add("xl/worksheets/data.xml", sheet_xml).unwrap();
        if let Some(shared) = shared {
            pkg.add("xl/sharedStrings.xml", shared).unwrap();
        }
        pkg.finish().unwrap()
    }

    #[test]
    fn test_column_index_and_name() {
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("Z9"), Some(25));
        assert_eq!(column_index("AA1"), Some(26));
        assert_eq!(column_index("AB3"), Some(27));
        assert_eq!(column_index("12"), None);
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_read_shared_and_typed_cells() {
        let shared = r#"<sst><si><t>name</t></si><si><t>age</t></si><si><r><t>Al</t></r><r><t>ice</t></r><rPh><t>ignored</t></rPh></si></sst>"#;
        let sheet = r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
            <row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2"><v>30</v></c><c r="C2" t="b"><v>1</v></c></row>
            <row r="3"><c r="B3"><v>2.5</v></c></row>
        </sheetData></worksheet>"#;
        let table = XlsxReader::new()
            .read(&workbook(sheet, Some(shared)), &ParseOptions::default())
            .unwrap();

        assert_eq!(table.columns, vec!["name", "age", "column_2"]);
        assert_eq!(table.rows[0].get("name"), Some(&Value::from("Alice")));
        assert_eq!(table.rows[0].get("age"), Some(&Value::from(30i64)));
        assert_eq!(table.rows[0].get("column_2"), Some(&Value::Bool(true)));
        assert_eq!(table.rows[1].get("name"), Some(&Value::from("")));
        assert_eq!(table.rows[1].get("age"), Some(&Value::from(2.5)));
    }

    #[test]
    fn test_inline_strings_and_blank_rows() {
        let sheet = r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="inlineStr"><is><t>city</t></is></c></row>
            <row r="2"><c r="A2" t="inlineStr"><is><t></t></is></c></row>
            <row r="3"><c r="A3" t="inlineStr"><is><t>Oslo &amp; Bergen</t></is></c></row>
        </sheetData></worksheet>"#;
        let table = XlsxReader::new()
            .read(&workbook(sheet, None), &ParseOptions::default())
            .unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.rows[0].text("city"), "Oslo & Bergen");
    }

    #[test]
    fn test_not_a_zip() {
        let err = XlsxReader::new()
            .read(b"name,age", &ParseOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Parse { format: "xlsx", .. }));
    }
}
