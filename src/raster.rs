//! Raster recompression: decode, downsample, re-encode as JPEG.

use crate::error::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage};

/// A JPEG produced by [`recompress_image`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recompressed {
    /// JPEG bytes
    pub bytes: Vec<u8>,
    /// Width of the encoded raster
    pub width: u32,
    /// Height of the encoded raster
    pub height: u32,
    /// Whether the JPEG has a single grey channel
    pub grayscale: bool,
}

/// Size after fitting `width` into `max_width`, keeping the aspect ratio.
/// Neither side drops below one pixel.
pub fn target_dimensions(width: u32, height: u32, max_width: Option<u32>) -> (u32, u32) {
    match max_width {
        Some(max) if width > max && max > 0 => {
            let scaled = (u64::from(height) * u64::from(max) + u64::from(width) / 2) / u64::from(width);
            (max, scaled.clamp(1, u64::from(u32::MAX)) as u32)
        }
        _ => (width, height),
    }
}

/// Downsample `image` to `max_width` if wider and encode it as JPEG at
/// `quality` (1-100). Grey images stay grey; alpha is dropped.
pub fn recompress_image(image: &DynamicImage, quality: u8, max_width: Option<u32>) -> Result<Recompressed> {
    let (width, height) = target_dimensions(image.width(), image.height(), max_width);
    let resized;
    let image = if (width, height) != (image.width(), image.height()) {
        resized = image.resize_exact(width, height, FilterType::Lanczos3);
        &resized
    } else {
        image
    };

    let grayscale = matches!(
        image.color(),
        ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16
    );

    let mut bytes = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
        let encoded = if grayscale {
            encoder.encode_image(&image.to_luma8())
        } else {
            encoder.encode_image(&image.to_rgb8())
        };
        encoded.map_err(|e| Error::serialization("jpeg", e))?;
    }

    Ok(Recompressed {
        bytes,
        width,
        height,
        grayscale,
    })
}

/// Decode `encoded` (any format the `image` crate reads), then
/// [`recompress_image`]. Returns `None` if the bytes cannot be decoded or
/// encoded; callers keep the original in that case.
pub fn recompress(encoded: &[u8], quality: u8, max_width: Option<u32>) -> Option<Vec<u8>> {
    let image = match image::load_from_memory(encoded) {
        Ok(image) => image,
        Err(e) => {
            log::debug!("Cannot decode image for recompression: {e}");
            return None;
        }
    };
    recompress_image(&image, quality, max_width)
        .map(|out| out.bytes)
        .ok()
}
