//! Page rasterisation through pdfium.

use crate::detect::detect_pdf_from_bytes;
use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use pdfium_render::prelude::*;
use std::io::Cursor;

/// One rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// PNG bytes
    pub bytes: Vec<u8>,
    /// `page_{n}.png`
    pub name: String,
    /// `data:image/png;base64,...`
    pub data_url: String,
}

/// Bind pdfium from the working directory, falling back to the system
/// library path. A missing library is an error, never a panic.
fn bind() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Error::Rasterize(format!("pdfium library not available: {e:?}")))?;
    Ok(Pdfium::new(bindings))
}

/// Render every page to PNG at `scale` times its size in points.
pub fn pdf_to_images(bytes: &[u8], scale: f32) -> Result<Vec<PageImage>> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(Error::InvalidArgument(format!("scale must be positive, got {scale}")));
    }
    detect_pdf_from_bytes(bytes)?;

    let pdfium = bind()?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| Error::PdfLoad(format!("{e:?}")))?;

    let config = PdfRenderConfig::new().scale_page_by_factor(scale);
    let pages = document.pages();
    log::info!("Rendering {} pages at scale {scale}", pages.len());

    let mut images = Vec::with_capacity(pages.len() as usize);
    for (index, page) in pages.iter().enumerate() {
        let number = index + 1;
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| Error::Rasterize(format!("page {number}: {e:?}")))?;

        let mut png = Vec::new();
        bitmap
            .as_image()
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| Error::Rasterize(format!("page {number}: {e}")))?;

        let data_url = format!("data:image/png;base64,{}", STANDARD.encode(&png));
        images.push(PageImage {
            bytes: png,
            name: format!("page_{number}.png"),
            data_url,
        });
    }
    Ok(images)
}
