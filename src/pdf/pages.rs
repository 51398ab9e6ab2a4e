//! Page-level restructuring: merge, split, extract and rotate.

use super::document::{check_page, load, page_ids, rotation, save, PageAssembler};
use super::options::{PageFilter, PageRange};
use crate::error::{Error, Result};
use lopdf::Document;

/// One output document of a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfPart {
    /// PDF bytes
    pub bytes: Vec<u8>,
    /// Suggested file name
    pub name: String,
}

/// Result of [`split`].
#[derive(Debug, Clone)]
pub struct SplitResult {
    /// One single-page document per source page
    pub pages: Vec<PdfPart>,
    /// Page count of the source document
    pub total_pages: u32,
}

/// Concatenate the pages of every input, in input order.
pub fn merge<B: AsRef<[u8]>>(files: &[B]) -> Result<Vec<u8>> {
    if files.is_empty() {
        return Err(Error::InvalidArgument("nothing to merge".into()));
    }

    let mut assembler = PageAssembler::new();
    for (index, file) in files.iter().enumerate() {
        let source = load(file.as_ref())?;
        let pages = assembler.import(source);
        log::debug!("Merging input {} ({} pages)", index + 1, pages.len());
        for page in pages {
            assembler.push_page(page)?;
        }
    }
    assembler.finish()
}

/// Copy the given 1-indexed pages of `doc`, in the given order.
fn copy_pages(doc: &Document, pages: &[u32]) -> Result<Vec<u8>> {
    let mut assembler = PageAssembler::new();
    let ids = assembler.import(doc.clone());
    let total = ids.len() as u32;
    for &page in pages {
        check_page(page, total)?;
        assembler.push_page(ids[page as usize - 1])?;
    }
    assembler.finish()
}

/// One single-page document per page, named `page_{n}.pdf`.
pub fn split(bytes: &[u8]) -> Result<SplitResult> {
    let doc = load(bytes)?;
    let total_pages = doc.get_pages().len() as u32;

    let pages = (1..=total_pages)
        .map(|n| {
            Ok(PdfPart {
                bytes: copy_pages(&doc, &[n])?,
                name: format!("page_{n}.pdf"),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SplitResult { pages, total_pages })
}

/// One document per named range, named `split_{name}.pdf`. Every page
/// number must exist in the source.
pub fn split_ranges(bytes: &[u8], ranges: &[PageRange]) -> Result<Vec<PdfPart>> {
    let doc = load(bytes)?;
    ranges
        .iter()
        .map(|range| {
            Ok(PdfPart {
                bytes: copy_pages(&doc, &range.pages)?,
                name: format!("split_{}.pdf", range.name),
            })
        })
        .collect()
}

/// Copy the given 1-indexed pages into a new document, in the order given.
/// Duplicates are kept. Out-of-range numbers are dropped under
/// [`PageFilter::Lenient`] and rejected under [`PageFilter::Strict`].
pub fn extract_pages(bytes: &[u8], pages: &[u32], filter: PageFilter) -> Result<Vec<u8>> {
    let doc = load(bytes)?;
    let total = doc.get_pages().len() as u32;

    let mut valid = Vec::with_capacity(pages.len());
    for &page in pages {
        match check_page(page, total) {
            Ok(()) => valid.push(page),
            Err(err) if filter == PageFilter::Strict => return Err(err),
            Err(_) => log::info!("Dropping page {page}: document has {total} pages"),
        }
    }
    copy_pages(&doc, &valid)
}

/// Add `degrees` to the rotation of the selected pages (all pages when
/// `pages` is `None`). Page numbers outside the document are ignored.
pub fn rotate(bytes: &[u8], degrees: i32, pages: Option<&[u32]>) -> Result<Vec<u8>> {
    if degrees % 90 != 0 {
        return Err(Error::InvalidArgument(format!(
            "rotation must be a multiple of 90, got {degrees}"
        )));
    }

    let mut doc = load(bytes)?;
    let ids = page_ids(&doc);

    let targets: Vec<usize> = match pages {
        Some(pages) => pages
            .iter()
            .filter(|&&p| p >= 1 && p as usize <= ids.len())
            .map(|&p| p as usize - 1)
            .collect(),
        None => (0..ids.len()).collect(),
    };

    for index in targets {
        let id = ids[index];
        let angle = (rotation(&doc, id) + i64::from(degrees)).rem_euclid(360);
        doc.get_dictionary_mut(id)?.set("Rotate", angle);
    }
    save(&mut doc)
}

/// Declared rotation of every page, normalised to `0..360`.
pub fn page_rotations(bytes: &[u8]) -> Result<Vec<i64>> {
    let doc = load(bytes)?;
    Ok(page_ids(&doc)
        .into_iter()
        .map(|id| rotation(&doc, id).rem_euclid(360))
        .collect())
}
