//! PDF tools: structural editing, image compression and rasterisation.
//!
//! Every operation takes the input document as bytes, works on a private
//! in-memory copy and returns new bytes. Nothing here touches the row
//! model; the object graph is [`lopdf`]'s id-keyed arena.
//!
//! ```no_run
//! use filekit::pdf::{self, PageFilter};
//!
//! fn main() -> filekit::Result<()> {
//!     let a = std::fs::read("a.pdf")?;
//!     let b = std::fs::read("b.pdf")?;
//!     let merged = pdf::merge(&[a, b])?;
//!     let first_two = pdf::extract_pages(&merged, &[1, 2], PageFilter::Lenient)?;
//!     std::fs::write("out.pdf", first_two)?;
//!     Ok(())
//! }
//! ```

mod compress;
pub(crate) mod document;
mod images;
mod info;
mod options;
mod pages;
mod render;
mod stamp;
pub mod text;

pub use compress::{
    compress, compress_with_progress, CompressedImage, CompressionProgress, CompressionReport,
    ImageReport, NoopProgress, SkipReason,
};
pub use images::{images_to_pdf, ImageInput};
pub use info::{info, DocumentInfo, PageInfo};
pub use options::{
    CompressionLevel, CompressionProfile, PageFilter, PageNumberOptions, PageRange, PageSelection,
    Position, Rgb, WatermarkOptions, REENCODE_QUALITY,
};
pub use pages::{
    extract_pages, merge, page_rotations, rotate, split, split_ranges, PdfPart, SplitResult,
};
pub use render::{pdf_to_images, PageImage};
pub use stamp::{add_page_numbers, watermark};
