//! # filekit
//!
//! Tabular document conversion and PDF page tools.
//!
//! Every readable format is parsed into one canonical [`Table`] of ordered
//! rows, and every writable format is produced from it. A separate set of
//! PDF tools edits documents at the page and object level.
//!
//! ## Quick Start
//!
//! ```no_run
//! use filekit::{convert_file, ConvertOptions, Format};
//!
//! fn main() -> filekit::Result<()> {
//!     let options = ConvertOptions::new().with_columns(["name", "email"]);
//!     let result = convert_file("contacts.xlsx", Format::Csv, &options)?;
//!     std::fs::write(&result.filename, &result.bytes)?;
//!     println!("{} rows, {} bytes", result.row_count, result.size);
//!     Ok(())
//! }
//! ```
//!
//! ## Formats
//!
//! | Format | Read | Write |
//! |---|---|---|
//! | CSV, TSV, XLSX, JSON, XML, YAML, HTML, TXT, DOCX, INI | yes | yes |
//! | Markdown, PDF | no | yes |
//!
//! ## PDF tools
//!
//! Merge, split, extract, rotate, watermark, page numbers, images to PDF,
//! image compression, rasterisation and metadata live in [`pdf`].

pub mod convert;
pub mod detect;
pub mod error;
pub mod model;
mod ooxml;
pub mod parser;
pub mod pdf;
pub mod raster;
pub mod render;

// Re-export commonly used types
pub use convert::{
    convert, output_filename, BatchItem, BatchReport, ConversionResult, ConvertOptions,
    ConverterRegistry,
};
pub use detect::{detect_pdf_from_bytes, is_pdf_bytes, Format, PdfFormat};
pub use error::{Error, ErrorKind, Result};
pub use model::{Row, Table, Value};
pub use parser::{ArrayLocator, LocatorMode, ParseOptions, TableReader};
pub use render::{JsonFormat, PdfTableLayout, RenderOptions, Rendered, TableWriter};

use std::path::Path;

/// Parse a file into a table, choosing the reader from its extension.
///
/// # Example
///
/// ```no_run
/// let table = filekit::parse_file("people.csv").unwrap();
/// println!("{} rows", table.row_count());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let bytes = std::fs::read(path)?;
    parser::parse(&bytes, format, &ParseOptions::default())
}

/// Parse bytes as the given format.
pub fn parse_bytes(data: &[u8], format: Format) -> Result<Table> {
    parser::parse(data, format, &ParseOptions::default())
}

/// Read a file and convert it to `target`.
pub fn convert_file<P: AsRef<Path>>(
    path: P,
    target: Format,
    options: &ConvertOptions,
) -> Result<ConversionResult> {
    ConverterRegistry::with_defaults().convert_file(path, target, options)
}

/// Builder for parsing a document and converting it to other formats.
///
/// # Example
///
/// ```no_run
/// use filekit::{Filekit, Format};
///
/// let parsed = Filekit::new()
///     .strict()
///     .with_columns(["id", "total"])
///     .with_title("Orders")
///     .parse("orders.json")?;
/// let html = parsed.to(Format::Html)?;
/// let pdf = parsed.to(Format::Pdf)?;
/// # Ok::<(), filekit::Error>(())
/// ```
pub struct Filekit {
    options: ConvertOptions,
}

impl Filekit {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            options: ConvertOptions::default(),
        }
    }

    /// Fail when a nested document has no array of rows.
    pub fn strict(mut self) -> Self {
        self.options.parse = self.options.parse.strict();
        self
    }

    /// Trim whitespace around delimited and spreadsheet cells.
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.options.parse = self.options.parse.with_trim(trim);
        self
    }

    /// Keep only these columns in every output.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = self.options.with_columns(columns);
        self
    }

    /// Set the HTML title and the DOCX/PDF heading.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.options.render = self
            .options
            .render
            .with_html_title(title.clone())
            .with_document_title(title);
        self
    }

    /// Set JSON format.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.options.render = self.options.render.with_json_format(format);
        self
    }

    /// Parse a file.
    pub fn parse<P: AsRef<Path>>(self, path: P) -> Result<Parsed> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        self.parse_bytes(&bytes, name)
    }

    /// Parse bytes; `filename` selects the reader and names the outputs.
    pub fn parse_bytes(self, data: &[u8], filename: impl Into<String>) -> Result<Parsed> {
        let filename = filename.into();
        let registry = ConverterRegistry::with_defaults();
        let table = registry.parse(data, &filename, &self.options.parse)?;
        Ok(Parsed {
            table,
            filename,
            registry,
            options: self.options,
        })
    }
}

impl Default for Filekit {
    fn default() -> Self {
        Self::new()
    }
}

/// A parsed document, ready to be written in any format.
pub struct Parsed {
    /// The parsed table
    pub table: Table,
    filename: String,
    registry: ConverterRegistry,
    options: ConvertOptions,
}

impl Parsed {
    /// Convert to `target`, applying the builder's column selection.
    pub fn to(&self, target: Format) -> Result<ConversionResult> {
        self.registry.convert(
            &self.table,
            self.options.columns.as_deref(),
            target,
            &self.filename,
            &self.options.render,
        )
    }

    /// The parsed table.
    pub fn table(&self) -> &Table {
        &self.table
    }
}
