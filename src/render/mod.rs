//! Writers: [`Table`] in, complete output document out.
//!
//! Every writer either returns a whole, valid buffer or an error; nothing
//! is written partially. Writers only ever look at the table they are
//! given, so column projection happens before this layer.

mod delimited;
mod docx;
mod excel;
mod html;
mod ini;
mod json;
mod markdown;
mod options;
mod pdf;
mod text;
mod xml;
mod yaml;

pub use delimited::DelimitedWriter;
pub use docx::DocxWriter;
pub use excel::XlsxWriter;
pub use html::HtmlWriter;
pub use ini::IniWriter;
pub use json::JsonWriter;
pub use markdown::MarkdownWriter;
pub use options::{JsonFormat, PdfTableLayout, RenderOptions};
pub use pdf::PdfWriter;
pub use text::TextWriter;
pub use xml::XmlWriter;
pub use yaml::YamlWriter;

use crate::detect::Format;
use crate::error::Result;
use crate::model::Table;
use std::sync::Arc;

/// A serializer for one output format.
///
/// Implement this trait to add support for a new output format.
pub trait TableWriter: Send + Sync {
    /// The format this writer produces.
    fn format(&self) -> Format;

    /// Serialize the whole table.
    fn write(&self, table: &Table, options: &RenderOptions) -> Result<Vec<u8>>;
}

/// Serialized output plus the metadata callers report.
#[derive(Debug, Clone)]
pub struct Rendered {
    /// Output bytes
    pub bytes: Vec<u8>,
    /// MIME type of the output
    pub mime_type: &'static str,
    /// Canonical extension (no leading dot)
    pub extension: &'static str,
    /// Number of data rows written
    pub row_count: usize,
    /// Number of columns written
    pub column_count: usize,
}

impl Rendered {
    /// Output size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the output is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Output as UTF-8 text, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

/// The built-in writer for a format.
pub fn writer_for(format: Format) -> Arc<dyn TableWriter> {
    match format {
        Format::Csv => Arc::new(DelimitedWriter::csv()),
        Format::Tsv => Arc::new(DelimitedWriter::tsv()),
        Format::Xlsx => Arc::new(XlsxWriter),
        Format::Json => Arc::new(JsonWriter),
        Format::Xml => Arc::new(XmlWriter),
        Format::Yaml => Arc::new(YamlWriter),
        Format::Html => Arc::new(HtmlWriter),
        Format::Markdown => Arc::new(MarkdownWriter),
        Format::Text => Arc::new(TextWriter),
        Format::Docx => Arc::new(DocxWriter),
        Format::Ini => Arc::new(IniWriter),
        Format::Pdf => Arc::new(PdfWriter),
    }
}

/// Serialize a table with a specific writer.
pub fn render_with(
    writer: &dyn TableWriter,
    table: &Table,
    options: &RenderOptions,
) -> Result<Rendered> {
    let format = writer.format();
    let bytes = writer.write(table, options)?;
    log::debug!("wrote {} bytes of {}", bytes.len(), format);
    Ok(Rendered {
        bytes,
        mime_type: format.mime_type(),
        extension: format.extension(),
        row_count: table.row_count(),
        column_count: table.column_count(),
    })
}

/// Serialize a table as the given format.
pub fn serialize(table: &Table, format: Format, options: &RenderOptions) -> Result<Rendered> {
    render_with(writer_for(format).as_ref(), table, options)
}
