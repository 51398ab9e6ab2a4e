//! Error types for filekit.

use std::io;
use thiserror::Error;

/// Result type alias for filekit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting tables or editing PDFs.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unknown extension, or a format used in a direction it does not support.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Input content does not match the grammar of its format.
    #[error("Failed to parse {format}: {message}")]
    Parse {
        /// Format name (e.g. "csv")
        format: &'static str,
        /// What went wrong
        message: String,
    },

    /// An encoder failed while producing output.
    #[error("Failed to write {format}: {message}")]
    Serialization {
        /// Format name (e.g. "xlsx")
        format: &'static str,
        /// What went wrong
        message: String,
    },

    /// The PDF is corrupt, encrypted or not a PDF at all.
    #[error("Failed to load PDF: {0}")]
    PdfLoad(String),

    /// A JPEG or PNG could not be embedded into a PDF.
    #[error("Failed to embed image: {0}")]
    ImageEmbed(String),

    /// Page rasterisation failed (pdfium missing or render error).
    #[error("Rasterization error: {0}")]
    Rasterize(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// A caller-supplied argument is not acceptable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Fieldless discriminant of [`Error`], for matching on the error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    UnsupportedFormat,
    Parse,
    Serialization,
    PdfLoad,
    ImageEmbed,
    Rasterize,
    PageOutOfRange,
    InvalidArgument,
}

impl Error {
    /// Shorthand for a [`Error::Parse`].
    pub fn parse(format: &'static str, message: impl std::fmt::Display) -> Self {
        Error::Parse {
            format,
            message: message.to_string(),
        }
    }

    /// Shorthand for a [`Error::Serialization`].
    pub fn serialization(format: &'static str, message: impl std::fmt::Display) -> Self {
        Error::Serialization {
            format,
            message: message.to_string(),
        }
    }

    /// The taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Error::Parse { .. } => ErrorKind::Parse,
            Error::Serialization { .. } => ErrorKind::Serialization,
            Error::PdfLoad(_) => ErrorKind::PdfLoad,
            Error::ImageEmbed(_) => ErrorKind::ImageEmbed,
            Error::Rasterize(_) => ErrorKind::Rasterize,
            Error::PageOutOfRange(_, _) => ErrorKind::PageOutOfRange,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::PdfLoad("document is encrypted".into()),
            _ => Error::PdfLoad(err.to_string()),
        }
    }
}
