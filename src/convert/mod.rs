//! Conversion orchestrator: pick a reader by extension, project columns,
//! pick a writer by target format.
//!
//! Readers and writers are trait objects held in a [`ConverterRegistry`],
//! so callers can register their own formats next to the built-in ones.
//!
//! # Example
//!
//! ```no_run
//! use filekit::convert::{ConverterRegistry, ConvertOptions};
//! use filekit::Format;
//!
//! fn main() -> filekit::Result<()> {
//!     let registry = ConverterRegistry::with_defaults();
//!     let bytes = std::fs::read("people.csv")?;
//!     let options = ConvertOptions::new().with_columns(["name"]);
//!     let result = registry.convert_bytes(&bytes, "people.csv", Format::Json, &options)?;
//!     std::fs::write(&result.filename, &result.bytes)?;
//!     Ok(())
//! }
//! ```

use crate::detect::Format;
use crate::error::{Error, Result};
use crate::model::Table;
use crate::parser::{self, ParseOptions, TableReader};
use crate::render::{self, RenderOptions, TableWriter};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Options for one conversion.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Column subset to keep; `None` or empty keeps every column
    pub columns: Option<Vec<String>>,

    /// Reader options
    pub parse: ParseOptions,

    /// Writer options
    pub render: RenderOptions,
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only these columns, in this order.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set reader options.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse = options;
        self
    }

    /// Set writer options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render = options;
        self
    }
}

/// Output of a conversion.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    /// Serialized output
    pub bytes: Vec<u8>,
    /// MIME type of the output
    pub mime_type: &'static str,
    /// Input name with its extension replaced by the target's
    pub filename: String,
    /// Output size in bytes
    pub size: usize,
    /// Rows written
    pub row_count: usize,
    /// Columns written
    pub column_count: usize,
    /// Target format
    pub format: Format,
}

/// Registry of readers (by extension) and writers (by format).
pub struct ConverterRegistry {
    readers: HashMap<String, Arc<dyn TableReader>>,
    writers: HashMap<Format, Arc<dyn TableWriter>>,
}

impl ConverterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            readers: HashMap::new(),
            writers: HashMap::new(),
        }
    }

    /// Create a registry with every built-in reader and writer.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for format in Format::ALL {
            if let Ok(reader) = parser::reader_for(format) {
                registry.register_reader(reader);
            }
            registry.register_writer(render::writer_for(format));
        }
        registry
    }

    /// Register a reader for all its supported extensions.
    pub fn register_reader(&mut self, reader: Arc<dyn TableReader>) {
        for ext in reader.supported_extensions() {
            self.readers.insert(ext.to_lowercase(), reader.clone());
        }
    }

    /// Register a writer, replacing any writer for the same format.
    pub fn register_writer(&mut self, writer: Arc<dyn TableWriter>) {
        self.writers.insert(writer.format(), writer);
    }

    /// Get a reader by file extension.
    pub fn reader(&self, ext: &str) -> Option<Arc<dyn TableReader>> {
        self.readers
            .get(&ext.trim_start_matches('.').to_lowercase())
            .cloned()
    }

    /// Get the writer for a format.
    pub fn writer(&self, format: Format) -> Option<Arc<dyn TableWriter>> {
        self.writers.get(&format).cloned()
    }

    /// Check if an input extension can be read.
    pub fn supports(&self, ext: &str) -> bool {
        self.reader(ext).is_some()
    }

    /// All readable extensions, sorted.
    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.readers.keys().map(|s| s.as_str()).collect();
        exts.sort_unstable();
        exts
    }

    /// Parse bytes, choosing the reader from `filename`'s extension.
    pub fn parse(&self, bytes: &[u8], filename: &str, options: &ParseOptions) -> Result<Table> {
        let ext = extension_of(filename)?;
        let reader = self
            .reader(ext)
            .ok_or_else(|| Error::UnsupportedFormat(format!("cannot read .{ext} files")))?;
        let table = reader.read(bytes, options)?;
        log::debug!(
            "{filename}: {} rows x {} columns via {}",
            table.row_count(),
            table.column_count(),
            reader.name()
        );
        Ok(table)
    }

    /// Project `table` to `columns` (if given and non-empty) and serialize it.
    pub fn convert(
        &self,
        table: &Table,
        columns: Option<&[String]>,
        target: Format,
        filename: &str,
        options: &RenderOptions,
    ) -> Result<ConversionResult> {
        let writer = self
            .writer(target)
            .ok_or_else(|| Error::UnsupportedFormat(format!("cannot write {target}")))?;

        let projected;
        let table = match columns {
            Some(columns) if !columns.is_empty() => {
                projected = table.project(columns);
                &projected
            }
            _ => table,
        };

        let rendered = render::render_with(writer.as_ref(), table, options)?;
        Ok(ConversionResult {
            size: rendered.len(),
            filename: output_filename(filename, target),
            mime_type: rendered.mime_type,
            row_count: rendered.row_count,
            column_count: rendered.column_count,
            format: target,
            bytes: rendered.bytes,
        })
    }

    /// Parse then convert in one step.
    pub fn convert_bytes(
        &self,
        bytes: &[u8],
        filename: &str,
        target: Format,
        options: &ConvertOptions,
    ) -> Result<ConversionResult> {
        let table = self.parse(bytes, filename, &options.parse)?;
        self.convert(
            &table,
            options.columns.as_deref(),
            target,
            filename,
            &options.render,
        )
    }

    /// Read a file and convert it.
    pub fn convert_file<P: AsRef<Path>>(
        &self,
        path: P,
        target: Format,
        options: &ConvertOptions,
    ) -> Result<ConversionResult> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        self.convert_bytes(&bytes, name, target, options)
    }

    /// Convert many inputs one after another.
    ///
    /// A failing item is recorded in the report; the rest still run.
    pub fn convert_batch<'a, I>(
        &self,
        inputs: I,
        target: Format,
        options: &ConvertOptions,
    ) -> BatchReport
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        self.convert_batch_with(inputs, target, options, |_| {})
    }

    /// [`convert_batch`](Self::convert_batch), calling `on_item` after each item.
    pub fn convert_batch_with<'a, I, F>(
        &self,
        inputs: I,
        target: Format,
        options: &ConvertOptions,
        mut on_item: F,
    ) -> BatchReport
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
        F: FnMut(&BatchItem),
    {
        let mut report = BatchReport::default();
        for (name, bytes) in inputs {
            let outcome = self.convert_bytes(bytes, name, target, options);
            if let Err(e) = &outcome {
                log::warn!("{name}: conversion to {target} failed: {e}");
            }
            let item = BatchItem {
                name: name.to_string(),
                outcome,
            };
            on_item(&item);
            report.items.push(item);
        }
        report
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Result of one batch input.
#[derive(Debug)]
pub struct BatchItem {
    /// Input file name
    pub name: String,
    /// Conversion output or the error that stopped it
    pub outcome: Result<ConversionResult>,
}

/// Results of [`ConverterRegistry::convert_batch`], in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per input
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    /// Successful conversions.
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &ConversionResult)> {
        self.items
            .iter()
            .filter_map(|item| item.outcome.as_ref().ok().map(|r| (item.name.as_str(), r)))
    }

    /// Failed conversions.
    pub fn failed(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.items
            .iter()
            .filter_map(|item| item.outcome.as_ref().err().map(|e| (item.name.as_str(), e)))
    }

    /// Number of failed items.
    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }
}

/// Serialize a table with the built-in writers.
pub fn convert(
    table: &Table,
    columns: Option<&[String]>,
    target: Format,
    filename: &str,
) -> Result<ConversionResult> {
    ConverterRegistry::with_defaults().convert(
        table,
        columns,
        target,
        filename,
        &RenderOptions::default(),
    )
}

/// Replace the extension of `filename` with `target`'s canonical one.
pub fn output_filename(filename: &str, target: Format) -> String {
    static EXTENSION: OnceLock<Regex> = OnceLock::new();
    let re = EXTENSION.get_or_init(|| Regex::new(r"\.[^/.]+$").unwrap());
    let stem = re.replace(filename, "");
    let stem = if stem.is_empty() { "converted" } else { stem.as_ref() };
    format!("{stem}.{}", target.extension())
}

fn extension_of(filename: &str) -> Result<&str> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| Error::UnsupportedFormat(format!("{filename} has no extension")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Row;

    #[test]
    fn test_convert_options_builder() {
        let options = ConvertOptions::new()
            .with_columns(["name", "age"])
            .with_parse_options(ParseOptions::new().strict());

        assert_eq!(
            options.columns,
            Some(vec!["name".to_string(), "age".to_string()])
        );
        assert_eq!(options.parse.locator, parser::LocatorMode::Strict);
    }

    #[test]
    fn test_registry_with_defaults() {
        let registry = ConverterRegistry::with_defaults();
        assert!(registry.supports("csv"));
        assert!(registry.supports("YML"));
        assert!(registry.supports(".xls"));
        assert!(!registry.supports("md"));
        assert!(!registry.supports("pdf"));
        assert!(registry.writer(Format::Pdf).is_some());
    }

    #[test]
    fn test_output_filename() {
        assert_eq!(output_filename("data.csv", Format::Json), "data.json");
        assert_eq!(output_filename("config.yml", Format::Yaml), "config.yaml");
        assert_eq!(output_filename("archive.tar.gz", Format::Csv), "archive.tar.csv");
        assert_eq!(output_filename("README", Format::Markdown), "README.md");
        assert_eq!(output_filename("dir.v2/notes", Format::Text), "dir.v2/notes.txt");
        assert_eq!(output_filename("", Format::Pdf), "converted.pdf");
    }

    #[test]
    fn test_convert_projects_columns() {
        let table = Table::from_rows(vec![
            Row::new().with("name", "Alice").with("age", "30").with("city", "Oslo"),
            Row::new().with("name", "Bob").with("age", "25"),
        ]);
        let columns = vec!["city".to_string(), "name".to_string()];
        let result = convert(&table, Some(columns.as_slice()), Format::Csv, "people.csv").unwrap();

        assert_eq!(result.column_count, 2);
        assert_eq!(result.row_count, 2);
        assert_eq!(result.size, result.bytes.len());
        assert_eq!(
            String::from_utf8(result.bytes).unwrap(),
            "city,name\nOslo,Alice\n,Bob\n"
        );
    }

    #[test]
    fn test_empty_column_list_keeps_table() {
        let table = Table::from_rows(vec![Row::new().with("a", "1").with("b", "2")]);
        let none: Vec<String> = Vec::new();
        let result = convert(&table, Some(none.as_slice()), Format::Json, "x.csv").unwrap();
        assert_eq!(result.column_count, 2);
    }

    #[test]
    fn test_unknown_input_extension() {
        let registry = ConverterRegistry::with_defaults();
        let err = registry
            .convert_bytes(b"x", "notes.rtf", Format::Json, &ConvertOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));

        let err = registry
            .convert_bytes(b"x", "notes", Format::Json, &ConvertOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_batch_keeps_going() {
        let registry = ConverterRegistry::with_defaults();
        let inputs: [(&str, &[u8]); 3] = [
            ("a.csv", b"x,y\n1,2\n"),
            ("b.json", b"{not json"),
            ("c.ini", b"[s]\nk=v\n"),
        ];
        let mut seen = Vec::new();
        let report = registry.convert_batch_with(
            inputs,
            Format::Yaml,
            &ConvertOptions::default(),
            |item| seen.push(item.name.clone()),
        );

        assert_eq!(seen, ["a.csv", "b.json", "c.ini"]);
        assert_eq!(report.items.len(), 3);
        assert_eq!(report.failure_count(), 1);
        let names: Vec<&str> = report.succeeded().map(|(n, _)| n).collect();
        assert_eq!(names, ["a.csv", "c.ini"]);
        let (_, err) = report.failed().next().unwrap();
        assert_eq!(err.kind(), crate::error::ErrorKind::Parse);
    }
}
