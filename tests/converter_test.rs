//! Integration tests for the conversion pipeline.

use std::fs;
use std::sync::Arc;

use filekit::convert::{convert, output_filename, ConvertOptions, ConverterRegistry};
use filekit::error::Result;
use filekit::{Error, ErrorKind, Format, ParseOptions, Row, Table, TableReader};

const PEOPLE_CSV: &[u8] = b"name,age\nAlice,30\nBob,25\n";

/// Mock reader for testing registration.
struct MockReader;

impl TableReader for MockReader {
    fn name(&self) -> &str {
        "mock"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["mock", "mck"]
    }

    fn read(&self, bytes: &[u8], _options: &ParseOptions) -> Result<Table> {
        Ok(Table::from_rows(vec![Row::new()
            .with("length", bytes.len().to_string())]))
    }
}

fn sample() -> Table {
    Table::from_rows(vec![
        Row::new().with("id", "1").with("name", "Alice").with("city", "Oslo"),
        Row::new().with("id", "2").with("name", "Bob").with("city", "Lima"),
        Row::new().with("id", "3").with("name", "Chen").with("city", "Pune"),
    ])
}

fn texts(table: &Table) -> Vec<Vec<String>> {
    table
        .rows
        .iter()
        .map(|row| table.columns.iter().map(|c| row.text(c)).collect())
        .collect()
}

#[test]
fn test_scenario_csv_to_json() {
    let registry = ConverterRegistry::with_defaults();
    let table = registry
        .parse(PEOPLE_CSV, "people.csv", &ParseOptions::default())
        .unwrap();
    assert_eq!(table.columns, vec!["name", "age"]);
    assert_eq!(table.rows[0].text("name"), "Alice");
    assert_eq!(table.rows[1].text("age"), "25");

    let result = registry
        .convert(&table, None, Format::Json, "people.csv", &Default::default())
        .unwrap();
    assert_eq!(result.filename, "people.json");
    assert_eq!(result.mime_type, "application/json");

    let json: serde_json::Value = serde_json::from_slice(&result.bytes).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"name": "Alice", "age": "30"},
            {"name": "Bob", "age": "25"}
        ])
    );
    let text = String::from_utf8(result.bytes).unwrap();
    assert!(text.contains("\n  {\n    \"name\": \"Alice\""));
}

#[test]
fn test_scenario_ini_round_trip() {
    let registry = ConverterRegistry::with_defaults();
    let result = registry
        .convert_bytes(
            b"[server]\nport=8080",
            "app.ini",
            Format::Ini,
            &ConvertOptions::default(),
        )
        .unwrap();

    assert_eq!(result.row_count, 1);
    assert_eq!(result.column_count, 3);
    assert_eq!(String::from_utf8(result.bytes).unwrap(), "[server]\nport=8080\n");
}

#[test]
fn test_csv_round_trip() {
    let registry = ConverterRegistry::with_defaults();
    let result = registry
        .convert_bytes(PEOPLE_CSV, "people.csv", Format::Csv, &ConvertOptions::default())
        .unwrap();
    assert_eq!(result.bytes, PEOPLE_CSV);
}

#[test]
fn test_readable_formats_read_back_what_they_write() {
    let registry = ConverterRegistry::with_defaults();
    let table = sample();
    let formats = [
        Format::Csv,
        Format::Tsv,
        Format::Xlsx,
        Format::Json,
        Format::Xml,
        Format::Yaml,
        Format::Html,
        Format::Text,
    ];

    for format in formats {
        let written = registry
            .convert(&table, None, format, "sample.csv", &Default::default())
            .unwrap();
        let back = registry
            .parse(&written.bytes, &written.filename, &ParseOptions::default())
            .unwrap_or_else(|e| panic!("{format}: {e}"));

        assert_eq!(back.columns, table.columns, "{format}");
        assert_eq!(texts(&back), texts(&table), "{format}");
    }
}

#[test]
fn test_docx_reads_back_as_paragraphs() {
    let registry = ConverterRegistry::with_defaults();
    let written = registry
        .convert(&sample(), None, Format::Docx, "sample.csv", &Default::default())
        .unwrap();
    let back = registry
        .parse(&written.bytes, "sample.docx", &ParseOptions::default())
        .unwrap();

    assert_eq!(back.columns, vec!["paragraph", "content"]);
    assert!(back.rows.iter().any(|r| r.text("content").contains("Alice")));
}

#[test]
fn test_projection_keeps_only_selected_keys() {
    let table = sample();
    let columns = vec!["city".to_string(), "missing".to_string(), "id".to_string()];

    for format in [Format::Json, Format::Yaml, Format::Csv, Format::Html] {
        let result = convert(&table, Some(columns.as_slice()), format, "sample.csv").unwrap();
        assert_eq!(result.column_count, 2, "{format}");

        let back = ConverterRegistry::with_defaults()
            .parse(&result.bytes, &result.filename, &ParseOptions::default())
            .unwrap();
        assert_eq!(back.columns, vec!["city", "id"], "{format}");
        for row in &back.rows {
            assert!(!row.contains_key("name"), "{format}");
        }
    }
}

#[test]
fn test_projection_applies_to_every_writer() {
    let table = Table::from_rows(vec![Row::new()
        .with("keep", "visible")
        .with("drop", "SECRETVALUE")]);
    let columns = vec!["keep".to_string()];

    for format in Format::ALL {
        let result = convert(&table, Some(columns.as_slice()), format, "t.csv").unwrap();
        assert_eq!(result.column_count, 1, "{format}");
        let haystack = String::from_utf8_lossy(&result.bytes);
        assert!(!haystack.contains("SECRETVALUE"), "{format}");
    }
}

#[test]
fn test_yaml_output_extension_is_normalized() {
    let registry = ConverterRegistry::with_defaults();
    let result = registry
        .convert_bytes(
            b"- a: 1\n- a: 2\n",
            "list.yml",
            Format::Yaml,
            &ConvertOptions::default(),
        )
        .unwrap();
    assert_eq!(result.filename, "list.yaml");
    assert_eq!(output_filename("list.yml", Format::Yaml), "list.yaml");
}

#[test]
fn test_write_only_formats_are_rejected_as_input() {
    let registry = ConverterRegistry::with_defaults();
    for name in ["notes.md", "report.pdf"] {
        let err = registry
            .convert_bytes(b"data", name, Format::Csv, &ConvertOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat, "{name}");
    }
}

#[test]
fn test_parse_errors_carry_format() {
    let registry = ConverterRegistry::with_defaults();
    let err = registry
        .convert_bytes(b"<a><b></a>", "bad.xml", Format::Json, &ConvertOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::Parse { format: "xml", .. }));
}

#[test]
fn test_strict_locator_from_options() {
    let registry = ConverterRegistry::with_defaults();
    let lenient = registry
        .convert_bytes(
            br#"{"host": "localhost"}"#,
            "c.json",
            Format::Csv,
            &ConvertOptions::default(),
        )
        .unwrap();
    assert_eq!(lenient.row_count, 1);

    let strict = ConvertOptions::new().with_parse_options(ParseOptions::new().strict());
    let err = registry
        .convert_bytes(b"<config><host>x</host></config>", "c.xml", Format::Csv, &strict)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn test_register_custom_reader() {
    let mut registry = ConverterRegistry::with_defaults();
    assert!(!registry.supports("mock"));

    registry.register_reader(Arc::new(MockReader));
    assert!(registry.supports("MOCK"));
    assert!(registry.supports("mck"));
    assert!(registry.supported_extensions().contains(&"mck"));

    let result = registry
        .convert_bytes(b"12345", "x.mock", Format::Csv, &ConvertOptions::default())
        .unwrap();
    assert_eq!(String::from_utf8(result.bytes).unwrap(), "length\n5\n");
}

#[test]
fn test_empty_registry() {
    let registry = ConverterRegistry::new();
    assert!(registry.supported_extensions().is_empty());
    let err = registry
        .convert(&sample(), None, Format::Csv, "x.csv", &Default::default())
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)));
}

#[test]
fn test_convert_file_and_parse_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("people.csv");
    fs::write(&input, PEOPLE_CSV).unwrap();

    let table = filekit::parse_file(&input).unwrap();
    assert_eq!(table.row_count(), 2);

    let options = ConvertOptions::new().with_columns(["age"]);
    let result = filekit::convert_file(&input, Format::Tsv, &options).unwrap();
    assert_eq!(result.filename, "people.tsv");
    assert_eq!(String::from_utf8(result.bytes).unwrap(), "age\n30\n25\n");
}

#[test]
fn test_convert_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let err = filekit::convert_file(
        dir.path().join("absent.csv"),
        Format::Json,
        &ConvertOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_batch_partial_failure() {
    let registry = ConverterRegistry::with_defaults();
    let inputs: Vec<(&str, &[u8])> = vec![
        ("good.csv", PEOPLE_CSV),
        ("broken.json", b"[{"),
        ("unknown.bin", b"\x00\x01"),
        ("also_good.ini", b"[s]\nk=v\n"),
    ];

    let report = registry.convert_batch(inputs, Format::Html, &ConvertOptions::default());
    assert_eq!(report.items.len(), 4);
    assert_eq!(report.failure_count(), 2);

    let kinds: Vec<ErrorKind> = report.failed().map(|(_, e)| e.kind()).collect();
    assert_eq!(kinds, [ErrorKind::Parse, ErrorKind::UnsupportedFormat]);

    let outputs: Vec<&str> = report.succeeded().map(|(_, r)| r.filename.as_str()).collect();
    assert_eq!(outputs, ["good.html", "also_good.html"]);
}

#[test]
fn test_estimate_kb() {
    let table = sample();
    let kb = table.estimate_kb();
    assert!(kb > 0.0 && kb < 1.0);
    assert_eq!(Table::new().estimate_kb(), 2.0 / 1024.0);
}
