//! Image recompression for PDF documents.
//!
//! Every image XObject is visited by id. Images the level selects are
//! decoded, downsampled and re-encoded as JPEG; the stream is replaced only
//! when the result is strictly smaller. A failing image is skipped with a
//! [`SkipReason`], never failing the document.

use super::document::{load, number, resolve, save_packed};
use super::options::{CompressionLevel, CompressionProfile};
use crate::error::Result;
use crate::raster::recompress_image;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::fmt;

const INFO_KEYS: [&[u8]; 6] = [b"Title", b"Author", b"Subject", b"Keywords", b"Producer", b"Creator"];

/// Why an image was left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The level leaves images of this width alone
    NotSelected,
    /// Stencil masks are one bit deep and cannot be JPEG encoded
    ImageMask,
    /// `Width`/`Height` missing or zero
    InvalidDimensions,
    /// Stream filters other than none, `FlateDecode` or `DCTDecode`
    UnsupportedFilter(String),
    /// Raw pixels in a colour space other than `DeviceRGB`/`DeviceGray`
    UnsupportedColorSpace(String),
    /// Raw pixels with other than 8 bits per component
    UnsupportedBitDepth(i64),
    /// A `/Decode` array that cannot be applied to the decoded samples
    UnsupportedDecode,
    /// The pixels could not be decoded
    DecodeFailed(String),
    /// The JPEG encoder failed
    EncodeFailed(String),
    /// Re-encoding did not make the stream smaller
    NotSmaller {
        /// Current stream length
        original: usize,
        /// Length of the re-encoded stream
        recompressed: usize,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotSelected => write!(f, "not selected at this level"),
            SkipReason::ImageMask => write!(f, "image mask"),
            SkipReason::InvalidDimensions => write!(f, "invalid dimensions"),
            SkipReason::UnsupportedFilter(name) => write!(f, "unsupported filter {name}"),
            SkipReason::UnsupportedColorSpace(name) => write!(f, "unsupported colour space {name}"),
            SkipReason::UnsupportedBitDepth(bits) => write!(f, "unsupported bit depth {bits}"),
            SkipReason::UnsupportedDecode => write!(f, "unsupported decode array"),
            SkipReason::DecodeFailed(e) => write!(f, "decode failed: {e}"),
            SkipReason::EncodeFailed(e) => write!(f, "encode failed: {e}"),
            SkipReason::NotSmaller {
                original,
                recompressed,
            } => write!(f, "not smaller ({recompressed} >= {original} bytes)"),
        }
    }
}

/// An image whose stream was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressedImage {
    /// Stream length before
    pub original_size: usize,
    /// Stream length after
    pub new_size: usize,
    /// Width after recompression
    pub width: u32,
    /// Height after recompression
    pub height: u32,
}

/// What happened to one image object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReport {
    /// Object id of the image stream
    pub id: ObjectId,
    /// Replacement details, or why the image was kept
    pub outcome: std::result::Result<CompressedImage, SkipReason>,
}

/// Result of [`compress`].
#[derive(Debug, Clone)]
pub struct CompressionReport {
    /// The rewritten document
    pub bytes: Vec<u8>,
    /// Input size in bytes
    pub original_size: usize,
    /// Output size in bytes
    pub new_size: usize,
    /// One entry per image object, in object id order
    pub images: Vec<ImageReport>,
}

impl CompressionReport {
    /// Size reduction in percent, never negative.
    pub fn reduction(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        ((1.0 - self.new_size as f64 / self.original_size as f64) * 100.0).max(0.0)
    }

    /// Number of images whose stream was replaced.
    pub fn compressed_count(&self) -> usize {
        self.images.iter().filter(|r| r.outcome.is_ok()).count()
    }
}

/// Receives per-image progress from [`compress_with_progress`].
pub trait CompressionProgress {
    /// Called before image `index` (1-based) of `total` is processed.
    fn on_image(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called after an image has been processed.
    fn on_image_done(&self, report: &ImageReport) {
        let _ = report;
    }
}

/// Progress sink that ignores every event.
pub struct NoopProgress;

impl CompressionProgress for NoopProgress {}

/// Recompress the images of a PDF at the given level.
pub fn compress(bytes: &[u8], level: CompressionLevel) -> Result<CompressionReport> {
    compress_with_progress(bytes, level, &NoopProgress)
}

/// [`compress`] reporting each image to `progress`.
pub fn compress_with_progress(
    bytes: &[u8],
    level: CompressionLevel,
    progress: &dyn CompressionProgress,
) -> Result<CompressionReport> {
    let profile = level.profile();
    let mut doc = load(bytes)?;

    let image_ids = image_ids(&doc);
    let total = image_ids.len();
    log::info!("Compressing at level {}: {total} images", level.name());

    let mut images = Vec::with_capacity(total);
    for (index, id) in image_ids.into_iter().enumerate() {
        progress.on_image(index + 1, total);
        log::debug!("Optimizing image {}/{}...", index + 1, total);

        let outcome = compress_image(&mut doc, id, &profile);
        match &outcome {
            Ok(done) => log::debug!(
                "Image {id:?}: {} -> {} bytes ({}x{})",
                done.original_size,
                done.new_size,
                done.width,
                done.height
            ),
            Err(reason @ SkipReason::DecodeFailed(_)) => log::warn!("Image {id:?} skipped: {reason}"),
            Err(reason) => log::debug!("Image {id:?} skipped: {reason}"),
        }

        let report = ImageReport { id, outcome };
        progress.on_image_done(&report);
        images.push(report);
    }

    if profile.strip_metadata {
        strip_metadata(&mut doc);
    }
    doc.prune_objects();
    doc.compress();
    let out = save_packed(&mut doc)?;

    Ok(CompressionReport {
        original_size: bytes.len(),
        new_size: out.len(),
        bytes: out,
        images,
    })
}

/// Ids of every stream whose `/Subtype` is `/Image`.
fn image_ids(doc: &Document) -> Vec<ObjectId> {
    doc.objects
        .iter()
        .filter_map(|(id, object)| match object {
            Object::Stream(stream) if is_image(&stream.dict) => Some(*id),
            _ => None,
        })
        .collect()
}

fn is_image(dict: &Dictionary) -> bool {
    matches!(dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Image")
}

fn name_of(object: &Object) -> Option<String> {
    match object {
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

fn filters(doc: &Document, dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter").map(|o| resolve(doc, o)) {
        Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Ok(Object::Array(items)) => items.iter().filter_map(name_of).collect(),
        _ => Vec::new(),
    }
}

fn color_space(doc: &Document, dict: &Dictionary) -> String {
    match dict.get(b"ColorSpace").map(|o| resolve(doc, o)) {
        Ok(Object::Name(name)) => String::from_utf8_lossy(name).into_owned(),
        Ok(Object::Array(items)) => items
            .first()
            .and_then(name_of)
            .unwrap_or_else(|| "unknown".into()),
        _ => "none".into(),
    }
}

/// Decode the current stream content into a raster.
fn decode(doc: &Document, id: ObjectId) -> std::result::Result<(DynamicImage, usize), SkipReason> {
    let stream = match doc.get_object(id) {
        Ok(Object::Stream(stream)) => stream,
        _ => return Err(SkipReason::DecodeFailed("not a stream".into())),
    };
    let dict = &stream.dict;

    if matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true))) {
        return Err(SkipReason::ImageMask);
    }
    let dimension = |key: &[u8]| {
        dict.get(key)
            .ok()
            .and_then(|o| number(resolve(doc, o)))
            .filter(|v| *v >= 1.0)
            .map(|v| v as u32)
    };
    let (Some(width), Some(height)) = (dimension(b"Width"), dimension(b"Height")) else {
        return Err(SkipReason::InvalidDimensions);
    };

    let filters = filters(doc, dict);
    let ranges = decode_ranges(doc, dict);
    let image = match filters.as_slice() {
        [only] if only == "DCTDecode" => {
            if ranges.is_some() {
                return Err(SkipReason::UnsupportedDecode);
            }
            image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
                .map_err(|e| SkipReason::DecodeFailed(e.to_string()))?
        }
        [] | [_] if filters.iter().all(|f| f == "FlateDecode") => {
            let bits = match dict.get(b"BitsPerComponent") {
                Ok(Object::Integer(bits)) => *bits,
                _ => 8,
            };
            if bits != 8 {
                return Err(SkipReason::UnsupportedBitDepth(bits));
            }
            let pixels = if filters.is_empty() {
                stream.content.clone()
            } else {
                stream
                    .decompressed_content()
                    .map_err(|e| SkipReason::DecodeFailed(e.to_string()))?
            };
            raw_image(&color_space(doc, dict), width, height, pixels, ranges.as_deref())?
        }
        other => return Err(SkipReason::UnsupportedFilter(other.join(" "))),
    };

    Ok((image, stream.content.len()))
}

fn raw_image(
    color_space: &str,
    width: u32,
    height: u32,
    mut pixels: Vec<u8>,
    ranges: Option<&[f32]>,
) -> std::result::Result<DynamicImage, SkipReason> {
    let channels = match color_space {
        "DeviceRGB" => 3,
        "DeviceGray" => 1,
        other => return Err(SkipReason::UnsupportedColorSpace(other.to_string())),
    };
    let expected = width as usize * height as usize * channels;
    if pixels.len() < expected {
        return Err(SkipReason::DecodeFailed(format!(
            "{} bytes of pixel data, expected {expected}",
            pixels.len()
        )));
    }
    pixels.truncate(expected);
    if let Some(ranges) = ranges {
        apply_decode(&mut pixels, channels, ranges)?;
    }

    let image = if channels == 3 {
        RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8)
    } else {
        GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8)
    };
    image.ok_or_else(|| SkipReason::DecodeFailed("pixel buffer does not match dimensions".into()))
}

/// The `/Decode` ranges, or `None` when absent or the identity mapping.
fn decode_ranges(doc: &Document, dict: &Dictionary) -> Option<Vec<f32>> {
    let Ok(Object::Array(items)) = dict.get(b"Decode").map(|o| resolve(doc, o)) else {
        return None;
    };
    let ranges: Vec<f32> = items.iter().filter_map(|o| number(resolve(doc, o))).collect();
    let identity = ranges.len() == items.len() && ranges.chunks(2).all(|pair| pair == [0.0, 1.0]);
    (!identity).then_some(ranges)
}

/// Map each 8-bit sample through its `[min max]` pair.
fn apply_decode(pixels: &mut [u8], channels: usize, ranges: &[f32]) -> std::result::Result<(), SkipReason> {
    if ranges.len() != channels * 2 {
        return Err(SkipReason::UnsupportedDecode);
    }
    for pixel in pixels.chunks_exact_mut(channels) {
        for (sample, range) in pixel.iter_mut().zip(ranges.chunks_exact(2)) {
            let mapped = range[0] + f32::from(*sample) / 255.0 * (range[1] - range[0]);
            *sample = (mapped.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
    }
    Ok(())
}

fn declared_width(doc: &Document, id: ObjectId) -> Option<u32> {
    match doc.get_object(id) {
        Ok(Object::Stream(stream)) => stream
            .dict
            .get(b"Width")
            .ok()
            .and_then(|o| number(resolve(doc, o)))
            .map(|v| v.max(0.0) as u32),
        _ => None,
    }
}

fn compress_image(
    doc: &mut Document,
    id: ObjectId,
    profile: &CompressionProfile,
) -> std::result::Result<CompressedImage, SkipReason> {
    let width = declared_width(doc, id).ok_or(SkipReason::InvalidDimensions)?;
    if !profile.accept(width) {
        return Err(SkipReason::NotSelected);
    }

    let (image, original_size) = decode(doc, id)?;
    let out = recompress_image(&image, profile.quality, profile.max_width)
        .map_err(|e| SkipReason::EncodeFailed(e.to_string()))?;

    if out.bytes.len() >= original_size {
        return Err(SkipReason::NotSmaller {
            original: original_size,
            recompressed: out.bytes.len(),
        });
    }

    let Ok(Object::Stream(stream)) = doc.get_object_mut(id) else {
        return Err(SkipReason::DecodeFailed("not a stream".into()));
    };
    let new_size = out.bytes.len();
    let dict = &mut stream.dict;
    dict.set("Filter", "DCTDecode");
    dict.remove(b"DecodeParms");
    dict.remove(b"Decode");
    dict.set("ColorSpace", if out.grayscale { "DeviceGray" } else { "DeviceRGB" });
    dict.set("BitsPerComponent", 8);
    dict.set("Width", i64::from(out.width));
    dict.set("Height", i64::from(out.height));
    stream.set_content(out.bytes);
    stream.dict.set("Length", new_size as i64);

    Ok(CompressedImage {
        original_size,
        new_size,
        width: out.width,
        height: out.height,
    })
}

/// Remove document info entries and the catalog's XMP stream.
fn strip_metadata(doc: &mut Document) {
    let info_id = doc.trailer.get(b"Info").and_then(Object::as_reference).ok();
    match info_id {
        Some(id) => {
            if let Ok(info) = doc.get_dictionary_mut(id) {
                for key in INFO_KEYS {
                    info.remove(key);
                }
            }
        }
        None => {
            if let Ok(Object::Dictionary(info)) = doc.trailer.get_mut(b"Info") {
                for key in INFO_KEYS {
                    info.remove(key);
                }
            }
        }
    }

    let root = doc.trailer.get(b"Root").and_then(Object::as_reference).ok();
    if let Some(catalog) = root.and_then(|id| doc.get_dictionary_mut(id).ok()) {
        catalog.remove(b"Metadata");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    fn image_stream(dict: Dictionary, content: Vec<u8>) -> Document {
        let mut doc = Document::with_version("1.7");
        doc.add_object(Stream::new(dict, content));
        doc
    }

    fn first_image(doc: &Document) -> ObjectId {
        image_ids(doc)[0]
    }

    #[test]
    fn test_low_level_leaves_images() {
        let mut doc = image_stream(
            dictionary! { "Subtype" => "Image", "Width" => 5000, "Height" => 10 },
            vec![0; 10],
        );
        let id = first_image(&doc);
        let outcome = compress_image(&mut doc, id, &CompressionLevel::Low.profile());
        assert_eq!(outcome, Err(SkipReason::NotSelected));
    }

    #[test]
    fn test_image_mask_skipped() {
        let mut doc = image_stream(
            dictionary! { "Subtype" => "Image", "Width" => 8, "Height" => 8, "ImageMask" => true },
            vec![0; 8],
        );
        let id = first_image(&doc);
        let outcome = compress_image(&mut doc, id, &CompressionLevel::Extreme.profile());
        assert_eq!(outcome, Err(SkipReason::ImageMask));
    }

    #[test]
    fn test_unsupported_filter_skipped() {
        let mut doc = image_stream(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 8,
                "Height" => 8,
                "Filter" => "JBIG2Decode",
            },
            vec![0; 8],
        );
        let id = first_image(&doc);
        let outcome = compress_image(&mut doc, id, &CompressionLevel::Extreme.profile());
        assert_eq!(outcome, Err(SkipReason::UnsupportedFilter("JBIG2Decode".into())));
    }

    #[test]
    fn test_corrupt_jpeg_is_kept() {
        let original = vec![0xFF, 0xD8, 1, 2, 3];
        let mut doc = image_stream(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 8,
                "Height" => 8,
                "Filter" => "DCTDecode",
            },
            original.clone(),
        );
        let id = first_image(&doc);
        let outcome = compress_image(&mut doc, id, &CompressionLevel::Extreme.profile());
        assert!(matches!(outcome, Err(SkipReason::DecodeFailed(_))));
        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        assert_eq!(stream.content, original);
    }

    #[test]
    fn test_raw_rgb_replaced_when_smaller() {
        let (width, height) = (300u32, 200u32);
        let pixels: Vec<u8> = (0..width * height).flat_map(|i| [(i % 7) as u8 * 30, 90, 160]).collect();
        let mut doc = image_stream(
            dictionary! {
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            pixels.clone(),
        );
        let id = first_image(&doc);
        let done = compress_image(&mut doc, id, &CompressionLevel::Extreme.profile()).unwrap();
        assert_eq!((done.width, done.height), (300, 200));
        assert!(done.new_size < pixels.len());

        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        assert_eq!(stream.dict.get(b"Filter").and_then(Object::as_name).unwrap(), b"DCTDecode");
        assert_eq!(stream.dict.get(b"Length").and_then(Object::as_i64).unwrap(), done.new_size as i64);
        assert_eq!(stream.content.len(), done.new_size);
    }

    #[test]
    fn test_raw_gray_stays_gray_and_downsamples() {
        let (width, height) = (1600u32, 10u32);
        let mut doc = image_stream(
            dictionary! {
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![200; (width * height) as usize],
        );
        let id = first_image(&doc);
        let done = compress_image(&mut doc, id, &CompressionLevel::Extreme.profile()).unwrap();
        assert_eq!(done.width, 1200);

        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        assert_eq!(stream.dict.get(b"ColorSpace").and_then(Object::as_name).unwrap(), b"DeviceGray");
        assert_eq!(stream.dict.get(b"Width").and_then(Object::as_i64).unwrap(), 1200);
    }

    #[test]
    fn test_tiny_image_not_smaller() {
        let mut doc = image_stream(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 1,
                "Height" => 1,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![0],
        );
        let id = first_image(&doc);
        let outcome = compress_image(&mut doc, id, &CompressionLevel::Extreme.profile());
        assert!(matches!(outcome, Err(SkipReason::NotSmaller { original: 1, .. })));
        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        assert_eq!(stream.content, vec![0]);
    }

    #[test]
    fn test_inverted_gray_decode_is_applied() {
        let (width, height) = (1600u32, 10u32);
        let mut doc = image_stream(
            dictionary! {
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Decode" => vec![Object::Integer(1), Object::Integer(0)],
            },
            vec![0; (width * height) as usize],
        );
        let id = first_image(&doc);
        let done = compress_image(&mut doc, id, &CompressionLevel::Extreme.profile()).unwrap();
        assert_eq!((done.width, done.height), (1200, 8));

        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        assert!(stream.dict.get(b"Decode").is_err());
        let decoded = image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
            .unwrap()
            .to_luma8();
        // samples of 0 under [1 0] render white
        assert!(decoded.pixels().all(|p| p.0[0] >= 250));
    }

    #[test]
    fn test_decode_ranges_and_mapping() {
        let mut pixels = vec![10, 20, 30];
        let ranges = decode_ranges(
            &Document::with_version("1.7"),
            &dictionary! { "Decode" => [0, 1, 0, 1, 0, 1].map(Object::Integer).to_vec() },
        );
        assert_eq!(ranges, None);
        apply_decode(&mut pixels, 3, &[0.0, 1.0, 1.0, 0.0, 0.0, 0.5]).unwrap();
        assert_eq!(pixels, vec![10, 235, 15]);
    }

    #[test]
    fn test_mismatched_decode_skipped() {
        let mut doc = image_stream(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 8,
                "Height" => 8,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Decode" => vec![Object::Integer(1), Object::Integer(0)],
            },
            vec![0; 8 * 8 * 3],
        );
        let id = first_image(&doc);
        let outcome = compress_image(&mut doc, id, &CompressionLevel::Extreme.profile());
        assert_eq!(outcome, Err(SkipReason::UnsupportedDecode));
    }

    #[test]
    fn test_jpeg_with_decode_skipped() {
        let original = vec![0xFF, 0xD8, 1, 2, 3];
        let mut doc = image_stream(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 8,
                "Height" => 8,
                "Filter" => "DCTDecode",
                "Decode" => vec![Object::Integer(1), Object::Integer(0)],
            },
            original.clone(),
        );
        let id = first_image(&doc);
        let outcome = compress_image(&mut doc, id, &CompressionLevel::Extreme.profile());
        assert_eq!(outcome, Err(SkipReason::UnsupportedDecode));
        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        assert_eq!(stream.content, original);
    }

    fn document_with_info() -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(200), Object::Integer(200)],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Quarterly"),
            "Author" => Object::string_literal("Finance"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_metadata_stripped_only_at_extreme() {
        let pdf = document_with_info();

        let kept = compress(&pdf, CompressionLevel::Medium).unwrap();
        let info = super::super::info::info(&kept.bytes).unwrap();
        assert_eq!(info.title, "Quarterly");
        assert!(kept.images.is_empty());

        let stripped = compress(&pdf, CompressionLevel::Extreme).unwrap();
        let info = super::super::info::info(&stripped.bytes).unwrap();
        assert_eq!(info.title, "");
        assert_eq!(info.author, "");
        assert_eq!(info.page_count, 1);
    }

    #[test]
    fn test_reduction_never_negative() {
        let report = CompressionReport {
            bytes: Vec::new(),
            original_size: 100,
            new_size: 120,
            images: Vec::new(),
        };
        assert_eq!(report.reduction(), 0.0);

        let report = CompressionReport {
            new_size: 25,
            ..report
        };
        assert_eq!(report.reduction(), 75.0);
    }
}
