//! Rendering options and configuration.

/// Options for writing tables.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// `<title>` of generated HTML documents
    pub html_title: String,

    /// Heading of generated DOCX and PDF documents
    pub document_title: String,

    /// JSON layout
    pub json_format: JsonFormat,

    /// PDF grid/flow layout
    pub pdf: PdfTableLayout,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the HTML page title.
    pub fn with_html_title(mut self, title: impl Into<String>) -> Self {
        self.html_title = title.into();
        self
    }

    /// Set the DOCX/PDF heading.
    pub fn with_document_title(mut self, title: impl Into<String>) -> Self {
        self.document_title = title.into();
        self
    }

    /// Set JSON format.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.json_format = format;
        self
    }

    /// Set the PDF layout.
    pub fn with_pdf_layout(mut self, layout: PdfTableLayout) -> Self {
        self.pdf = layout;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            html_title: "Converted Data".to_string(),
            document_title: "Converted Data".to_string(),
            json_format: JsonFormat::Pretty,
            pdf: PdfTableLayout::default(),
        }
    }
}

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with 2-space indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Page geometry and truncation rules for PDF output.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfTableLayout {
    /// Page width in points
    pub page_width: f32,
    /// Page height in points
    pub page_height: f32,
    /// Margin on all sides in points
    pub margin: f32,
    /// Body font size in points
    pub font_size: f32,
    /// Maximum number of grid columns shown
    pub max_columns: usize,
    /// Cells longer than this many characters are truncated
    pub cell_chars: usize,
}

impl PdfTableLayout {
    /// A4 portrait.
    pub const A4: (f32, f32) = (595.28, 841.89);

    /// Set the number of visible columns (at least one).
    pub fn with_max_columns(mut self, columns: usize) -> Self {
        self.max_columns = columns.max(1);
        self
    }

    /// Set the cell truncation length (at least four, room for an ellipsis).
    pub fn with_cell_chars(mut self, chars: usize) -> Self {
        self.cell_chars = chars.max(4);
        self
    }

    /// Set the body font size.
    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = size.clamp(4.0, 36.0);
        self
    }
}

impl Default for PdfTableLayout {
    fn default() -> Self {
        Self {
            page_width: Self::A4.0,
            page_height: Self::A4.1,
            margin: 50.0,
            font_size: 10.0,
            max_columns: 5,
            cell_chars: 18,
        }
    }
}
