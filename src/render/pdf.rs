//! PDF writer.
//!
//! Tables shaped like DOCX or plain-text reader output (a `content` column
//! next to `paragraph` or `line`) are laid out as word-wrapped paragraphs.
//! Anything else becomes a positional grid of truncated cells. Every page
//! carries a `Page i of N` footer.

use super::options::PdfTableLayout;
use super::{RenderOptions, TableWriter};
use crate::detect::Format;
use crate::error::{Error, Result};
use crate::model::Table;
use crate::pdf::document::{add_font, text_line, PageAssembler};
use crate::pdf::text::{truncate, wrap, Font};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, Stream};

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

const TITLE_SIZE: f32 = 16.0;
const FOOTER_SIZE: f32 = 9.0;
const FOOTER_Y: f32 = 30.0;
const LINE_SPACING: f32 = 1.4;

/// Renders a table as an A4 document using the standard Helvetica fonts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfWriter;

impl TableWriter for PdfWriter {
    fn format(&self) -> Format {
        Format::Pdf
    }

    fn write(&self, table: &Table, options: &RenderOptions) -> Result<Vec<u8>> {
        let layout = &options.pdf;
        let mut flow = PageFlow::new(layout);

        flow.reserve(TITLE_SIZE * LINE_SPACING);
        flow.text(BOLD, TITLE_SIZE, layout.margin, &options.document_title);
        flow.advance(TITLE_SIZE * 1.8);

        if is_paragraphs(table) {
            paragraphs(&mut flow, table);
        } else {
            grid(&mut flow, table);
        }

        let pages = flow.finish();
        log::debug!("Rendering {} rows onto {} PDF pages", table.row_count(), pages.len());
        assemble(pages, layout).map_err(|e| Error::serialization("pdf", e))
    }
}

fn is_paragraphs(table: &Table) -> bool {
    let has = |name: &str| table.columns.iter().any(|c| c == name);
    has("content") && (has("paragraph") || has("line"))
}

/// Top-down cursor over a sequence of pages.
struct PageFlow<'a> {
    layout: &'a PdfTableLayout,
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    /// Top of the next line
    y: f32,
}

impl<'a> PageFlow<'a> {
    fn new(layout: &'a PdfTableLayout) -> Self {
        Self {
            layout,
            pages: Vec::new(),
            current: Vec::new(),
            y: layout.page_height - layout.margin,
        }
    }

    fn bottom(&self) -> f32 {
        self.layout.margin.max(FOOTER_Y + 2.0 * FOOTER_SIZE)
    }

    fn needs_break(&self, height: f32) -> bool {
        self.y - height < self.bottom() && !self.current.is_empty()
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.y = self.layout.page_height - self.layout.margin;
    }

    /// Start a new page unless `height` still fits on this one.
    fn reserve(&mut self, height: f32) {
        if self.needs_break(height) {
            self.new_page();
        }
    }

    fn text(&mut self, font: &str, size: f32, x: f32, text: &str) {
        if !text.is_empty() {
            self.current.extend(text_line(font, size, x, self.y - size, text));
        }
    }

    fn rule(&mut self, x1: f32, x2: f32) {
        let y = self.y - 0.5;
        self.current.extend([
            Operation::new("w", vec![0.5f32.into()]),
            Operation::new("m", vec![x1.into(), y.into()]),
            Operation::new("l", vec![x2.into(), y.into()]),
            Operation::new("S", vec![]),
        ]);
    }

    fn advance(&mut self, height: f32) {
        self.y -= height;
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

fn paragraphs(flow: &mut PageFlow<'_>, table: &Table) {
    let layout = flow.layout;
    let size = layout.font_size;
    let width = layout.page_width - 2.0 * layout.margin;
    let line_height = size * LINE_SPACING;

    for row in &table.rows {
        for line in wrap(&row.text("content"), Font::Helvetica, size, width) {
            flow.reserve(line_height);
            flow.text(REGULAR, size, layout.margin, &line);
            flow.advance(line_height);
        }
        flow.advance(size * 0.6);
    }
}

fn grid(flow: &mut PageFlow<'_>, table: &Table) {
    let layout = flow.layout;
    let columns: Vec<&str> = table
        .columns
        .iter()
        .take(layout.max_columns)
        .map(String::as_str)
        .collect();
    if columns.is_empty() {
        return;
    }
    if table.columns.len() > columns.len() {
        log::info!(
            "PDF grid shows {} of {} columns",
            columns.len(),
            table.columns.len()
        );
    }

    let width = (layout.page_width - 2.0 * layout.margin) / columns.len() as f32;
    let row_height = layout.font_size * LINE_SPACING;

    grid_header(flow, &columns, width, row_height);
    for row in &table.rows {
        if flow.needs_break(row_height) {
            flow.new_page();
            grid_header(flow, &columns, width, row_height);
        }
        for (i, name) in columns.iter().enumerate() {
            let x = layout.margin + i as f32 * width;
            flow.text(REGULAR, layout.font_size, x, &truncate(&row.text(name), layout.cell_chars));
        }
        flow.advance(row_height);
    }
}

fn grid_header(flow: &mut PageFlow<'_>, columns: &[&str], width: f32, row_height: f32) {
    let layout = flow.layout;
    for (i, name) in columns.iter().enumerate() {
        let x = layout.margin + i as f32 * width;
        flow.text(BOLD, layout.font_size, x, &truncate(name, layout.cell_chars));
    }
    flow.advance(row_height - layout.font_size * 0.2);
    flow.rule(layout.margin, layout.page_width - layout.margin);
    flow.advance(layout.font_size * 0.2);
}

fn footer(page: usize, total: usize, layout: &PdfTableLayout) -> Vec<Operation> {
    let label = format!("Page {page} of {total}");
    let x = (layout.page_width - Font::Helvetica.text_width(&label, FOOTER_SIZE)) / 2.0;
    text_line(REGULAR, FOOTER_SIZE, x, FOOTER_Y, &label)
}

fn assemble(pages: Vec<Vec<Operation>>, layout: &PdfTableLayout) -> Result<Vec<u8>> {
    let mut assembler = PageAssembler::new();
    let doc = assembler.document_mut();
    let regular = add_font(doc, Font::Helvetica);
    let bold = add_font(doc, Font::HelveticaBold);
    let resources = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR => regular,
            BOLD => bold,
        },
    });

    let total = pages.len();
    for (index, mut operations) in pages.into_iter().enumerate() {
        operations.extend(footer(index + 1, total, layout));
        let content = Content { operations }.encode()?;
        let content_id = assembler
            .document_mut()
            .add_object(Stream::new(Dictionary::new(), content));
        assembler.push_new_page(dictionary! {
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::from(layout.page_width),
                Object::from(layout.page_height),
            ],
            "Resources" => resources,
            "Contents" => content_id,
        });
    }
    assembler.finish()
}
