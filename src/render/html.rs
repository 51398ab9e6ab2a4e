//! HTML writer.

use super::{RenderOptions, TableWriter};
use crate::detect::Format;
use crate::error::Result;
use crate::model::Table;
use html_escape::encode_safe;
use std::fmt::Write;

const STYLE: &str = "    body { font-family: Arial, sans-serif; padding: 20px; }
    table { border-collapse: collapse; width: 100%; }
    th, td { border: 1px solid #ddd; padding: 12px; text-align: left; }
    th { background-color: #6366f1; color: white; }
    tr:nth-child(even) { background-color: #f2f2f2; }
    tr:hover { background-color: #ddd; }";

/// A standalone HTML page holding one styled table. An empty table
/// renders as a bare `<table></table>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlWriter;

impl TableWriter for HtmlWriter {
    fn format(&self) -> Format {
        Format::Html
    }

    fn write(&self, table: &Table, options: &RenderOptions) -> Result<Vec<u8>> {
        if table.is_empty() {
            return Ok(b"<table></table>".to_vec());
        }

        let header: String = table
            .columns
            .iter()
            .map(|c| format!("<th>{}</th>", encode_safe(c)))
            .collect();

        let body: Vec<String> = table
            .rows
            .iter()
            .map(|row| {
                let cells: String = table
                    .columns
                    .iter()
                    .map(|c| format!("<td>{}</td>", encode_safe(&row.text(c))))
                    .collect();
                format!("<tr>{cells}</tr>")
            })
            .collect();

        let mut html = String::new();
        let _ = write!(
            html,
            "<!DOCTYPE html>
<html lang=\"en\">
<head>
  <meta charset=\"UTF-8\">
  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">
  <title>{title}</title>
  <style>
{STYLE}
  </style>
</head>
<body>
  <table>
    <thead>
      <tr>{header}</tr>
    </thead>
    <tbody>
      {body}
    </tbody>
  </table>
</body>
</html>",
            title = encode_safe(&options.html_title),
            body = body.join("\n      "),
        );
        Ok(html.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Row;
    use crate::parser::{HtmlReader, ParseOptions, TableReader};

    #[test]
    fn test_document_and_escaping() {
        let table = Table::from_rows(vec![Row::new().with("a<b", "x & y").with("c", "<script>")]);
        let out = HtmlWriter.write(&table, &RenderOptions::default()).unwrap();
        let html = String::from_utf8(out).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Converted Data</title>"));
        assert!(html.contains("<th>a&lt;b</th>"));
        assert!(html.contains("<td>x &amp; y</td>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_custom_title() {
        let table = Table::from_rows(vec![Row::new().with("a", "1")]);
        let options = RenderOptions::new().with_html_title("Q3 Sales");
        let html = String::from_utf8(HtmlWriter.write(&table, &options).unwrap()).unwrap();
        assert!(html.contains("<title>Q3 Sales</title>"));
    }

    #[test]
    fn test_round_trip_through_reader() {
        let table = Table::from_rows(vec![
            Row::new().with("name", "Alice").with("note", "a & b"),
            Row::new().with("name", "Bob").with("note", "\"quoted\""),
        ]);
        let out = HtmlWriter.write(&table, &RenderOptions::default()).unwrap();
        let back = HtmlReader::new()
            .read(&out, &ParseOptions::default())
            .unwrap();
        assert_eq!(back, table);
    }
}
