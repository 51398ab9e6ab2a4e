//! Format table and content detection.
//!
//! [`Format`] is the authoritative extension table: which formats can be
//! read, which can be written, their MIME types and canonical extensions.
//! PDF header sniffing lives here too; the PDF tools use it to reject
//! non-PDF input before handing bytes to the object loader.

use crate::error::{Error, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A document format known to filekit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Csv,
    Tsv,
    Xlsx,
    Json,
    Xml,
    Yaml,
    Html,
    Markdown,
    Text,
    Docx,
    Ini,
    Pdf,
}

impl Format {
    /// Every format, in display order.
    pub const ALL: [Format; 12] = [
        Format::Csv,
        Format::Xlsx,
        Format::Json,
        Format::Xml,
        Format::Tsv,
        Format::Yaml,
        Format::Html,
        Format::Markdown,
        Format::Text,
        Format::Docx,
        Format::Ini,
        Format::Pdf,
    ];

    /// Canonical output extension (no leading dot).
    pub fn extension(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Tsv => "tsv",
            Format::Xlsx => "xlsx",
            Format::Json => "json",
            Format::Xml => "xml",
            Format::Yaml => "yaml",
            Format::Html => "html",
            Format::Markdown => "md",
            Format::Text => "txt",
            Format::Docx => "docx",
            Format::Ini => "ini",
            Format::Pdf => "pdf",
        }
    }

    /// Resolve an extension (with or without leading dot, any case).
    pub fn from_extension(ext: &str) -> Option<Format> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        let format = match ext.as_str() {
            "csv" => Format::Csv,
            "tsv" | "tab" => Format::Tsv,
            "xlsx" | "xls" => Format::Xlsx,
            "json" => Format::Json,
            "xml" => Format::Xml,
            "yaml" | "yml" => Format::Yaml,
            "html" | "htm" => Format::Html,
            "md" | "markdown" => Format::Markdown,
            "txt" | "text" => Format::Text,
            "docx" => Format::Docx,
            "ini" => Format::Ini,
            "pdf" => Format::Pdf,
            _ => return None,
        };
        Some(format)
    }

    /// Resolve the format of a file name or path from its extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Format> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnsupportedFormat(format!("{} has no extension", path.display())))?;
        Format::from_extension(ext).ok_or_else(|| Error::UnsupportedFormat(ext.to_string()))
    }

    /// MIME type of serialized output.
    pub fn mime_type(self) -> &'static str {
        match self {
            Format::Csv => "text/csv",
            Format::Tsv => "text/tab-separated-values",
            Format::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Format::Json => "application/json",
            Format::Xml => "application/xml",
            Format::Yaml => "application/x-yaml",
            Format::Html => "text/html",
            Format::Markdown => "text/markdown",
            Format::Text => "text/plain",
            Format::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Format::Ini => "text/plain",
            Format::Pdf => "application/pdf",
        }
    }

    /// Whether a parser exists for this format.
    pub fn is_readable(self) -> bool {
        !matches!(self, Format::Markdown | Format::Pdf)
    }

    /// Whether a serializer exists for this format.
    pub fn is_writable(self) -> bool {
        true
    }

    /// Short lowercase name used in error messages.
    pub fn name(self) -> &'static str {
        self.extension()
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Format::from_extension(s).ok_or_else(|| Error::UnsupportedFormat(s.to_string()))
    }
}

/// PDF header information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
}

impl fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_MAGIC_LEN: usize = 5;
const VERSION_LEN: usize = 3; // e.g., "1.7"
/// Bytes scanned for the header before giving up.
pub const HEADER_SEARCH_LEN: usize = 1024;

/// Read the PDF header from the first bytes of a buffer.
///
/// The header may be preceded by up to [`HEADER_SEARCH_LEN`] bytes of
/// junk. Returns [`Error::PdfLoad`] when no `%PDF-x.y` is found there.
pub fn detect_pdf_from_bytes(data: &[u8]) -> Result<PdfFormat> {
    let window = &data[..data.len().min(HEADER_SEARCH_LEN + PDF_MAGIC_LEN)];
    let Some(start) = window.windows(PDF_MAGIC_LEN).position(|w| w == PDF_MAGIC) else {
        return Err(Error::PdfLoad("missing %PDF header".into()));
    };
    let Some(version_bytes) = data.get(start + PDF_MAGIC_LEN..start + PDF_MAGIC_LEN + VERSION_LEN) else {
        return Err(Error::PdfLoad("truncated %PDF header".into()));
    };
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::PdfLoad(format!("unsupported PDF version {version}")));
    }

    Ok(PdfFormat { version })
}

fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_digit() && bytes[1] == b'.' && bytes[2].is_ascii_digit()
}

/// Check if bytes carry a PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    detect_pdf_from_bytes(data).is_ok()
}
