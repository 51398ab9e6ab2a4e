//! Minimal Office Open XML package helpers shared by the XLSX and DOCX
//! reader and writer.

use crate::error::{Error, Result};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::BytesStart;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// A read-only OOXML package.
pub(crate) struct Package<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
    format: &'static str,
}

impl<'a> Package<'a> {
    /// Open a package; non-zip input is a parse error for `format`.
    pub fn open(bytes: &'a [u8], format: &'static str) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| Error::parse(format, format!("not an OOXML package: {e}")))?;
        Ok(Self { archive, format })
    }

    /// Read a part as UTF-8, or `None` when the part does not exist.
    pub fn part(&mut self, name: &str) -> Result<Option<String>> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(Error::parse(self.format, e)),
        };
        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::parse(self.format, format!("{name}: {e}")))?;
        Ok(Some(content))
    }

    /// Read a part that must exist.
    pub fn required_part(&mut self, name: &str) -> Result<String> {
        self.part(name)?
            .ok_or_else(|| Error::parse(self.format, format!("missing part {name}")))
    }
}

/// Builds an OOXML package in memory.
pub(crate) struct PackageWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    format: &'static str,
}

impl PackageWriter {
    pub fn new(format: &'static str) -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            format,
        }
    }

    /// Add a deflated part.
    pub fn add(&mut self, name: &str, content: &str) -> Result<()> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.zip
            .start_file(name, options)
            .map_err(|e| Error::serialization(self.format, e))?;
        self.zip
            .write_all(content.as_bytes())
            .map_err(|e| Error::serialization(self.format, e))
    }

    pub fn finish(self) -> Result<Vec<u8>> {
        let format = self.format;
        let cursor = self
            .zip
            .finish()
            .map_err(|e| Error::serialization(format, e))?;
        Ok(cursor.into_inner())
    }
}

/// Value of an attribute by local name, unescaped.
pub(crate) fn attr(element: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a: &Attribute<'_>| a.key.local_name().as_ref() == local)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Escape text for element content or attribute values.
pub(crate) fn escape(text: &str) -> std::borrow::Cow<'_, str> {
    quick_xml::escape::escape(text)
}

/// XML 1.0 forbids most C0 control characters even when escaped.
pub(crate) fn strip_invalid_chars(text: &str) -> std::borrow::Cow<'_, str> {
    let invalid = |c: char| c < ' ' && !matches!(c, '\t' | '\n' | '\r');
    if text.chars().any(invalid) {
        text.chars().filter(|c| !invalid(*c)).collect::<String>().into()
    } else {
        text.into()
    }
}
