//! Object-graph helpers shared by the PDF tools.
//!
//! A loaded [`Document`] is an arena of indirect objects keyed by
//! [`ObjectId`]; everything here reads and rewrites entries of that arena.

use super::text::{to_win_ansi, Font};
use crate::detect::detect_pdf_from_bytes;
use crate::error::{Error, Result};
use lopdf::content::Operation;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"Resources", b"Rotate", b"CropBox"];

/// Guards against cyclic `/Parent` chains.
const MAX_TREE_DEPTH: usize = 64;

/// US Letter, used when a page declares no media box at all.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Load a document, checking the `%PDF-` header first.
pub(crate) fn load(bytes: &[u8]) -> Result<Document> {
    detect_pdf_from_bytes(bytes)?;
    let doc = Document::load_mem(bytes)?;
    log::debug!("Loaded PDF {} with {} pages", doc.version, doc.get_pages().len());
    Ok(doc)
}

/// Serialize a document.
pub(crate) fn save(doc: &mut Document) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

/// Serialize a document, packing non-stream objects into object streams
/// behind a cross-reference stream. Raises the version to 1.5 if lower.
pub(crate) fn save_packed(doc: &mut Document) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    doc.save_modern(&mut out)?;
    Ok(out)
}

/// Page ids in page order.
pub(crate) fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Follow one level of indirection.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

/// Numeric value of an integer or real object.
pub(crate) fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Look up `key` on the page, then on each `/Parent` in turn.
pub(crate) fn inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(resolve(doc, value).clone());
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Effective media box `[llx, lly, urx, ury]`.
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let values: Option<Vec<f32>> = match inherited(doc, page_id, b"MediaBox") {
        Some(Object::Array(items)) => items.iter().map(|o| number(resolve(doc, o))).collect(),
        _ => None,
    };
    match values.as_deref() {
        Some(&[a, b, c, d]) => [a.min(c), b.min(d), a.max(c), b.max(d)],
        _ => DEFAULT_MEDIA_BOX,
    }
}

/// Effective `/Rotate` in degrees, as declared.
pub(crate) fn rotation(doc: &Document, page_id: ObjectId) -> i64 {
    match inherited(doc, page_id, b"Rotate") {
        Some(Object::Integer(angle)) => angle,
        Some(Object::Real(angle)) => angle.round() as i64,
        _ => 0,
    }
}

/// Builds a new document out of pages copied from one or more sources.
///
/// Each imported source is renumbered above the objects already present,
/// so ids never collide. Every pushed page is a fresh page object carrying
/// its inherited attributes, which lets the same source page appear twice.
pub(crate) struct PageAssembler {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
}

impl PageAssembler {
    pub(crate) fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Move every object of `source` into the output. Returns the source's
    /// page ids, renumbered, in page order.
    pub(crate) fn import(&mut self, mut source: Document) -> Vec<ObjectId> {
        source.renumber_objects_with(self.doc.max_id + 1);
        let pages = page_ids(&source);
        self.doc.max_id = self.doc.max_id.max(source.max_id);
        self.doc.objects.extend(source.objects);
        pages
    }

    /// Append a copy of an imported page.
    pub(crate) fn push_page(&mut self, page_id: ObjectId) -> Result<ObjectId> {
        let mut page = self.doc.get_dictionary(page_id)?.clone();
        for key in INHERITABLE {
            if !page.has(key) {
                if let Some(value) = inherited(&self.doc, page_id, key) {
                    page.set(key, value);
                }
            }
        }

        let new_id = self.doc.new_object_id();
        page.set("Parent", self.pages_id);

        let annotations: Vec<ObjectId> = match page.get(b"Annots").map(|o| resolve(&self.doc, o)) {
            Ok(Object::Array(items)) => items.iter().filter_map(|o| o.as_reference().ok()).collect(),
            _ => Vec::new(),
        };
        for id in annotations {
            if let Ok(annotation) = self.doc.get_dictionary_mut(id) {
                if annotation.has(b"P") {
                    annotation.set("P", new_id);
                }
            }
        }

        self.doc.objects.insert(new_id, Object::Dictionary(page));
        self.kids.push(new_id);
        Ok(new_id)
    }

    /// Append a page built from scratch. `/Type` and `/Parent` are set here.
    pub(crate) fn push_new_page(&mut self, mut page: Dictionary) -> ObjectId {
        page.set("Type", "Page");
        page.set("Parent", self.pages_id);
        let id = self.doc.add_object(page);
        self.kids.push(id);
        id
    }

    /// The document under construction, for adding shared objects.
    pub(crate) fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Number of pages pushed so far.
    pub(crate) fn len(&self) -> usize {
        self.kids.len()
    }

    /// Write the page tree and catalog, drop everything unreachable and
    /// serialize.
    pub(crate) fn finish(mut self) -> Result<Vec<u8>> {
        let kids: Vec<Object> = self.kids.iter().map(|id| Object::Reference(*id)).collect();
        let count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer = Dictionary::new();
        self.doc.trailer.set("Root", catalog_id);

        self.doc.prune_objects();
        self.doc.renumber_objects();
        self.doc.compress();
        save(&mut self.doc)
    }
}

/// Append `operations` to the page, wrapped in `q`/`Q`. Existing content
/// is isolated in its own `q`/`Q` pair first so its graphics state cannot
/// leak into the new drawing.
pub(crate) fn append_content(
    doc: &mut Document,
    page_id: ObjectId,
    operations: Vec<Operation>,
) -> Result<()> {
    let existing: Vec<Object> = {
        let page = doc.get_dictionary(page_id)?;
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    };

    let mut wrapped = Vec::with_capacity(operations.len() + 2);
    wrapped.push(Operation::new("q", vec![]));
    wrapped.extend(operations);
    wrapped.push(Operation::new("Q", vec![]));
    let encoded = lopdf::content::Content { operations: wrapped }.encode()?;

    let mut contents = Vec::with_capacity(existing.len() + 3);
    if !existing.is_empty() {
        let open = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let close = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
        contents.push(Object::Reference(open));
        contents.extend(existing);
        contents.push(Object::Reference(close));
    }
    let added = doc.add_object(Stream::new(Dictionary::new(), encoded));
    contents.push(Object::Reference(added));

    doc.get_dictionary_mut(page_id)?.set("Contents", contents);
    Ok(())
}

/// Register `value` as `/Resources/<category>/<name>` of the page. The
/// effective (possibly inherited or shared) resource dictionary is copied
/// onto the page before it is changed.
pub(crate) fn add_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    name: &str,
    value: Object,
) -> Result<()> {
    let mut resources = inherited(doc, page_id, b"Resources")
        .and_then(|o| o.as_dict().ok().cloned())
        .unwrap_or_else(Dictionary::new);

    let mut group = resources
        .get(category.as_bytes())
        .ok()
        .and_then(|o| resolve(doc, o).as_dict().ok().cloned())
        .unwrap_or_else(Dictionary::new);

    group.set(name, value);
    resources.set(category, group);
    doc.get_dictionary_mut(page_id)?.set("Resources", resources);
    Ok(())
}

/// Add a standard Type1 font object.
pub(crate) fn add_font(doc: &mut Document, font: Font) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
        "Encoding" => "WinAnsiEncoding",
    })
}

/// A WinAnsi literal string operand.
pub(crate) fn text_operand(text: &str) -> Object {
    Object::String(to_win_ansi(text), StringFormat::Literal)
}

/// Operations drawing one line of text with its baseline starting at
/// `(x, y)`.
pub(crate) fn text_line(resource: &str, size: f32, x: f32, y: f32, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(resource.as_bytes().to_vec()), size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![text_operand(text)]),
        Operation::new("ET", vec![]),
    ]
}

/// Ensure the page index is valid for a document of `total` pages.
pub(crate) fn check_page(page: u32, total: u32) -> Result<()> {
    if page == 0 || page > total {
        return Err(Error::PageOutOfRange(page, total));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A document whose pages take their media box and rotation from the
    /// page tree root.
    fn inherited_doc() -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(300),
                    Object::Integer(400),
                ],
                "Rotate" => 90,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn test_inherited_attributes() {
        let doc = inherited_doc();
        let page = page_ids(&doc)[0];
        assert_eq!(media_box(&doc, page), [0.0, 0.0, 300.0, 400.0]);
        assert_eq!(rotation(&doc, page), 90);
        assert!(inherited(&doc, page, b"CropBox").is_none());
    }

    #[test]
    fn test_assembler_copies_inherited_attributes() {
        let mut assembler = PageAssembler::new();
        let pages = assembler.import(inherited_doc());
        assembler.push_page(pages[0]).unwrap();
        assembler.push_page(pages[0]).unwrap();
        assert_eq!(assembler.len(), 2);

        let bytes = assembler.finish().unwrap();
        let out = load(&bytes).unwrap();
        let ids = page_ids(&out);
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(media_box(&out, ids[1]), [0.0, 0.0, 300.0, 400.0]);
        assert_eq!(rotation(&out, ids[1]), 90);
    }

    #[test]
    fn test_append_content_wraps_existing() {
        let mut doc = inherited_doc();
        let page = page_ids(&doc)[0];
        let content = doc.add_object(Stream::new(Dictionary::new(), b"1 0 0 RG".to_vec()));
        doc.get_dictionary_mut(page).unwrap().set("Contents", content);

        append_content(&mut doc, page, text_line("F1", 12.0, 10.0, 10.0, "Hi")).unwrap();

        let text = String::from_utf8_lossy(&doc.get_page_content(page).unwrap()).to_string();
        assert!(text.starts_with("q\n1 0 0 RG\nQ\n"));
        assert!(text.contains("(Hi) Tj"));
        assert!(text.trim_end().ends_with('Q'));
    }

    #[test]
    fn test_add_resource_copies_inherited() {
        let mut doc = inherited_doc();
        let page = page_ids(&doc)[0];
        let font = add_font(&mut doc, Font::Helvetica);
        add_resource(&mut doc, page, "Font", "FkF1", Object::Reference(font)).unwrap();

        let resources = doc.get_dictionary(page).unwrap().get(b"Resources").unwrap();
        let fonts = resources.as_dict().unwrap().get(b"Font").unwrap().as_dict().unwrap();
        assert_eq!(fonts.get(b"FkF1").unwrap().as_reference().unwrap(), font);
    }

    #[test]
    fn test_check_page() {
        assert!(check_page(1, 3).is_ok());
        assert!(matches!(check_page(0, 3), Err(Error::PageOutOfRange(0, 3))));
        assert!(matches!(check_page(4, 3), Err(Error::PageOutOfRange(4, 3))));
    }
}
