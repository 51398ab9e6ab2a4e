//! Read-only document information.

use super::document::{load, media_box, page_ids, resolve, rotation};
use crate::error::Result;
use chrono::{DateTime, NaiveDate, Utc};
use lopdf::{Dictionary, Document, Object};
use serde::Serialize;

/// Document metadata and page geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentInfo {
    /// Number of pages
    pub page_count: u32,
    /// PDF version from the header
    pub version: String,
    /// Document title
    pub title: String,
    /// Author
    pub author: String,
    /// Subject
    pub subject: String,
    /// Keywords
    pub keywords: String,
    /// Application that created the original content
    pub creator: String,
    /// Application that wrote the PDF
    pub producer: String,
    /// Creation date
    pub created: Option<DateTime<Utc>>,
    /// Last modification date
    pub modified: Option<DateTime<Utc>>,
    /// Whether the file declares an encryption dictionary
    pub encrypted: bool,
    /// Per-page size and rotation
    pub pages: Vec<PageInfo>,
}

/// Size and rotation of one page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageInfo {
    /// Width in points
    pub width: f32,
    /// Height in points
    pub height: f32,
    /// Declared rotation in degrees, `0..360`
    pub rotation: i64,
}

/// Read metadata without modifying the document.
pub fn info(bytes: &[u8]) -> Result<DocumentInfo> {
    let doc = load(bytes)?;
    let mut info = DocumentInfo {
        version: doc.version.clone(),
        encrypted: doc.is_encrypted(),
        ..DocumentInfo::default()
    };

    if let Some(dict) = info_dictionary(&doc) {
        let text = |key: &[u8]| get_string_from_dict(dict, key).unwrap_or_default();
        info.title = text(b"Title");
        info.author = text(b"Author");
        info.subject = text(b"Subject");
        info.keywords = text(b"Keywords");
        info.creator = text(b"Creator");
        info.producer = text(b"Producer");
        info.created = get_string_from_dict(dict, b"CreationDate").and_then(|s| parse_pdf_date(&s));
        info.modified = get_string_from_dict(dict, b"ModDate").and_then(|s| parse_pdf_date(&s));
    }

    info.pages = page_ids(&doc)
        .into_iter()
        .map(|id| {
            let [x0, y0, x1, y1] = media_box(&doc, id);
            PageInfo {
                width: x1 - x0,
                height: y1 - y0,
                rotation: rotation(&doc, id).rem_euclid(360),
            }
        })
        .collect();
    info.page_count = info.pages.len() as u32;

    Ok(info)
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    let info = doc.trailer.get(b"Info").ok()?;
    resolve(doc, info).as_dict().ok()
}

/// Decode a text string: UTF-16BE with BOM, else UTF-8, else Latin-1.
fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => {
            if let Some(utf16) = bytes.strip_prefix(b"\xFE\xFF") {
                let units: Vec<u16> = utf16
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16(&units).ok()
            } else {
                String::from_utf8(bytes.clone())
                    .ok()
                    .or_else(|| Some(bytes.iter().map(|&b| b as char).collect()))
            }
        }
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Parse a PDF date (`D:YYYYMMDDHHmmSS...`). Only the year is required;
/// the timezone suffix is ignored.
fn parse_pdf_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let field = |range: std::ops::Range<usize>, default: u32| {
        s.get(range).and_then(|v| v.parse().ok()).unwrap_or(default)
    };

    NaiveDate::from_ymd_opt(year, field(4..6, 1), field(6..8, 1))
        .and_then(|date| date.and_hms_opt(field(8..10, 0), field(10..12, 0), field(12..14, 0)))
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
}
