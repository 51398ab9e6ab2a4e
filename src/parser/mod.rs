//! Readers: raw bytes in, [`Table`] out.
//!
//! One module per readable format. Each reader implements [`TableReader`];
//! [`parse`] dispatches on a [`Format`].

mod csv;
mod docx;
mod excel;
mod html;
mod ini;
mod json;
pub mod locator;
mod options;
mod text;
mod xml;
mod yaml;

pub use self::csv::CsvReader;
pub use docx::DocxReader;
pub(crate) use excel::column_name;
pub use excel::XlsxReader;
pub use html::HtmlReader;
pub use ini::{IniReader, ROOT_SECTION};
pub use json::JsonReader;
pub use locator::{ArrayLocator, FirstArrayLocator, PathLocator};
pub use options::{LocatorMode, ParseOptions};
pub use text::TextReader;
pub use xml::{XmlReader, ATTRIBUTE_PREFIX, TEXT_KEY};
pub use yaml::YamlReader;

use crate::detect::Format;
use crate::error::{Error, Result};
use crate::model::Table;
use std::borrow::Cow;
use std::sync::Arc;

/// A parser for one tabular format.
///
/// Implement this trait to add support for a new input format.
pub trait TableReader: Send + Sync {
    /// Reader name (e.g. `"csv"`).
    fn name(&self) -> &str;

    /// Lowercase extensions without the leading dot.
    fn supported_extensions(&self) -> &[&str];

    /// Parse a complete document.
    fn read(&self, bytes: &[u8], options: &ParseOptions) -> Result<Table>;

    /// Check if this reader handles the given extension.
    fn supports_extension(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext_lower)
    }
}

/// The built-in reader for a format.
pub fn reader_for(format: Format) -> Result<Arc<dyn TableReader>> {
    let reader: Arc<dyn TableReader> = match format {
        Format::Csv => Arc::new(CsvReader::csv()),
        Format::Tsv => Arc::new(CsvReader::tsv()),
        Format::Xlsx => Arc::new(XlsxReader::new()),
        Format::Json => Arc::new(JsonReader::new()),
        Format::Xml => Arc::new(XmlReader::new()),
        Format::Yaml => Arc::new(YamlReader::new()),
        Format::Html => Arc::new(HtmlReader::new()),
        Format::Text => Arc::new(TextReader::new()),
        Format::Docx => Arc::new(DocxReader::new()),
        Format::Ini => Arc::new(IniReader::new()),
        Format::Markdown | Format::Pdf => {
            return Err(Error::UnsupportedFormat(format!(
                "{format} is write-only"
            )))
        }
    };
    Ok(reader)
}

/// Parse bytes as the given format.
pub fn parse(bytes: &[u8], format: Format, options: &ParseOptions) -> Result<Table> {
    let table = reader_for(format)?.read(bytes, options)?;
    log::debug!(
        "parsed {} rows x {} columns as {}",
        table.row_count(),
        table.column_count(),
        format
    );
    Ok(table)
}

/// Decode text input as UTF-8, dropping a leading byte-order mark.
/// Invalid sequences are replaced rather than rejected.
pub(crate) fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes)
}

/// Make header names unique: repeats get `_1`, `_2`, ... suffixes and
/// blank names become `column_{index}`.
pub(crate) fn unique_headers<I, S>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for (index, header) in headers.into_iter().enumerate() {
        let base = match header.as_ref().trim() {
            "" => format!("column_{index}"),
            name => name.to_string(),
        };
        let mut name = base.clone();
        let mut n = 1;
        while out.contains(&name) {
            name = format!("{base}_{n}");
            n += 1;
        }
        out.push(name);
    }
    out
}
