//! Options for the PDF tools.

use crate::error::{Error, Result};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Pages a tool applies to (1-indexed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Every page
    #[default]
    All,
    /// An inclusive range of pages
    Range(RangeInclusive<u32>),
    /// Specific pages, in the order given; duplicates are kept
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number is selected.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Expand into page numbers for a document of `total` pages. Numbers
    /// are not checked against `total` except for `All`.
    pub fn resolve(&self, total: u32) -> Vec<u32> {
        match self {
            PageSelection::All => (1..=total).collect(),
            PageSelection::Range(range) => range.clone().collect(),
            PageSelection::Pages(pages) => pages.clone(),
        }
    }

    /// Parse a page selection string such as `"1-10"` or `"1,3,5-7"`.
    ///
    /// An empty string or `all` selects every page. Ranges expand in
    /// ascending order; list order and duplicates are kept.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let range = parse_range(start, end)?;
                return Ok(PageSelection::Range(range));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                pages.extend(parse_range(start, end)?);
            } else {
                pages.push(parse_page(part)?);
            }
        }
        Ok(PageSelection::Pages(pages))
    }
}

fn parse_page(s: &str) -> Result<u32> {
    match s.trim().parse::<u32>() {
        Ok(page) if page >= 1 => Ok(page),
        _ => Err(Error::InvalidArgument(format!("invalid page number '{}'", s.trim()))),
    }
}

fn parse_range(start: &str, end: &str) -> Result<RangeInclusive<u32>> {
    let start = parse_page(start)?;
    let end = parse_page(end)?;
    if start > end {
        return Err(Error::InvalidArgument(format!("invalid page range {start}-{end}")));
    }
    Ok(start..=end)
}

impl FromStr for PageSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PageSelection::parse(s)
    }
}

/// What `extract_pages` does with page numbers outside the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageFilter {
    /// Drop them and log at `info`
    #[default]
    Lenient,
    /// Fail with [`Error::PageOutOfRange`]
    Strict,
}

/// A named group of pages for [`split_ranges`](super::split_ranges).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRange {
    /// Used in the output name `split_{name}.pdf`
    pub name: String,
    /// 1-indexed pages, in output order
    pub pages: Vec<u32>,
}

impl PageRange {
    /// Create a named range.
    pub fn new(name: impl Into<String>, pages: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            pages,
        }
    }
}

/// RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub(crate) fn clamped(self) -> [f32; 3] {
        [self.0, self.1, self.2].map(|c| c.clamp(0.0, 1.0))
    }
}

/// Options for [`watermark`](super::watermark).
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkOptions {
    /// Font size in points
    pub font_size: f32,
    /// Fill and stroke opacity
    pub opacity: f32,
    /// Counter-clockwise rotation in degrees
    pub rotation: f32,
    /// Text colour
    pub color: Rgb,
}

impl WatermarkOptions {
    /// Create watermark options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the font size.
    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }

    /// Set the opacity (clamped to `0.0..=1.0`).
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Set the rotation in degrees.
    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    /// Set the colour.
    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            font_size: 50.0,
            opacity: 0.3,
            rotation: -45.0,
            color: Rgb(0.5, 0.5, 0.5),
        }
    }
}

/// Anchor of a page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    #[default]
    BottomCenter,
    BottomRight,
}

impl Position {
    /// All anchors.
    pub const ALL: [Position; 6] = [
        Position::TopLeft,
        Position::TopCenter,
        Position::TopRight,
        Position::BottomLeft,
        Position::BottomCenter,
        Position::BottomRight,
    ];

    /// Kebab-case name, e.g. `bottom-center`.
    pub fn name(self) -> &'static str {
        match self {
            Position::TopLeft => "top-left",
            Position::TopCenter => "top-center",
            Position::TopRight => "top-right",
            Position::BottomLeft => "bottom-left",
            Position::BottomCenter => "bottom-center",
            Position::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Position {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Position::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidArgument(format!("unknown position '{s}'")))
    }
}

/// Options for [`add_page_numbers`](super::add_page_numbers).
#[derive(Debug, Clone, PartialEq)]
pub struct PageNumberOptions {
    /// Anchor on the page
    pub position: Position,
    /// Font size in points
    pub font_size: f32,
    /// Label template; `{n}` is the page number and `{total}` the page count
    pub format: String,
}

impl PageNumberOptions {
    /// Create page number options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the anchor.
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Set the font size.
    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }

    /// Set the label template.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub(crate) fn label(&self, page: usize, total: usize) -> String {
        self.format
            .replace("{n}", &page.to_string())
            .replace("{total}", &total.to_string())
    }
}

impl Default for PageNumberOptions {
    fn default() -> Self {
        Self {
            position: Position::BottomCenter,
            font_size: 12.0,
            format: "Page {n} of {total}".to_string(),
        }
    }
}

/// Compression severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// Leave images alone; only repack streams
    Low,
    /// JPEG quality 70, at most 2000 px wide
    #[default]
    Medium,
    /// JPEG quality 40, at most 1200 px wide, metadata removed
    Extreme,
}

/// Image quality below which every image is re-encoded regardless of size.
pub const REENCODE_QUALITY: u8 = 85;

impl CompressionLevel {
    /// The recompression parameters of this level.
    pub fn profile(self) -> CompressionProfile {
        match self {
            CompressionLevel::Low => CompressionProfile {
                quality: 92,
                max_width: None,
                strip_metadata: false,
            },
            CompressionLevel::Medium => CompressionProfile {
                quality: 70,
                max_width: Some(2000),
                strip_metadata: false,
            },
            CompressionLevel::Extreme => CompressionProfile {
                quality: 40,
                max_width: Some(1200),
                strip_metadata: true,
            },
        }
    }

    /// Lower-case name.
    pub fn name(self) -> &'static str {
        match self {
            CompressionLevel::Low => "low",
            CompressionLevel::Medium => "medium",
            CompressionLevel::Extreme => "extreme",
        }
    }
}

impl FromStr for CompressionLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(CompressionLevel::Low),
            "medium" => Ok(CompressionLevel::Medium),
            "extreme" | "high" => Ok(CompressionLevel::Extreme),
            other => Err(Error::InvalidArgument(format!(
                "unknown compression level '{other}'"
            ))),
        }
    }
}

/// JPEG re-encoding parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionProfile {
    /// JPEG quality, 1-100
    pub quality: u8,
    /// Images wider than this are downsampled
    pub max_width: Option<u32>,
    /// Remove document info and XMP metadata
    pub strip_metadata: bool,
}

impl CompressionProfile {
    /// Whether an image `width` pixels wide should be re-encoded.
    pub fn accept(&self, width: u32) -> bool {
        self.quality < REENCODE_QUALITY || self.max_width.is_some_and(|max| width > max)
    }
}
