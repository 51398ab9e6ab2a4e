//! HTML table reader.

use super::{decode_text, unique_headers, ParseOptions, TableReader};
use crate::error::{Error, Result};
use crate::model::{Row, Table};
use lol_html::html_content::EndTag;
use lol_html::{element, rewrite_str, text, HandlerResult, RewriteStrSettings};
use std::cell::RefCell;
use std::rc::Rc;

/// Reads the first `<table>` of a document.
///
/// The first row (usually the `<thead>` row) supplies the header cells.
/// Later rows are keyed positionally; cells past the header get
/// `column_{index}` keys and rows without cells are skipped.
#[derive(Debug, Clone, Default)]
pub struct HtmlReader;

impl HtmlReader {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Default)]
struct Collector {
    /// Top-level tables opened so far
    tables: usize,
    /// Tables currently open, nested ones included
    depth: usize,
    rows: Vec<Vec<String>>,
}

impl Collector {
    /// Directly inside the first top-level table, not a table nested in it.
    fn in_first_table(&self) -> bool {
        self.tables == 1 && self.depth == 1
    }
}

impl TableReader for HtmlReader {
    fn name(&self) -> &str {
        "html"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["html", "htm"]
    }

    fn read(&self, bytes: &[u8], options: &ParseOptions) -> Result<Table> {
        let html = decode_text(bytes);
        let state = Rc::new(RefCell::new(Collector::default()));

        rewrite_str(
            &html,
            RewriteStrSettings {
                element_content_handlers: vec![
                    element!("table", |el| {
                        {
                            let s = &mut *state.borrow_mut();
                            s.depth += 1;
                            if s.depth == 1 {
                                s.tables += 1;
                            }
                        }
                        if let Some(handlers) = el.end_tag_handlers() {
                            let closing = Rc::clone(&state);
                            let handler: lol_html::EndTagHandler<'static> =
                                Box::new(move |_end: &mut EndTag<'_>| -> HandlerResult {
                                    let s = &mut *closing.borrow_mut();
                                    s.depth = s.depth.saturating_sub(1);
                                    Ok(())
                                });
                            handlers.push(handler);
                        }
                        Ok(())
                    }),
                    element!("tr", |_el| {
                        let s = &mut *state.borrow_mut();
                        if s.in_first_table() {
                            s.rows.push(Vec::new());
                        }
                        Ok(())
                    }),
                    element!("td, th", |_el| {
                        let s = &mut *state.borrow_mut();
                        if s.in_first_table() {
                            if let Some(row) = s.rows.last_mut() {
                                row.push(String::new());
                            }
                        }
                        Ok(())
                    }),
                    text!("td, th", |chunk| {
                        let s = &mut *state.borrow_mut();
                        if s.in_first_table() {
                            if let Some(cell) = s.rows.last_mut().and_then(|r| r.last_mut()) {
                                cell.push_str(chunk.as_str());
                            }
                        }
                        Ok(())
                    }),
                ],
                ..RewriteStrSettings::default()
            },
        )
        .map_err(|e| Error::parse("html", e))?;

        let collected = state.take();
        if collected.tables == 0 {
            log::debug!("no <table> element found");
        }

        let mut rows = collected
            .rows
            .into_iter()
            .map(|cells| {
                cells
                    .iter()
                    .map(|raw| html_escape::decode_html_entities(raw).trim().to_string())
                    .collect::<Vec<_>>()
            })
            .filter(|cells| !cells.is_empty());

        let Some(header_cells) = rows.next() else {
            return Ok(Table::new());
        };
        let headers = unique_headers(&header_cells);

        let data = rows
            .map(|cells| {
                cells
                    .into_iter()
                    .enumerate()
                    .map(|(index, value)| {
                        let key = headers
                            .get(index)
                            .cloned()
                            .unwrap_or_else(|| format!("column_{index}"));
                        (key, options.cell(&value))
                    })
                    .collect::<Row>()
            })
            .collect();

        Ok(Table::from_rows(data))
    }
}
