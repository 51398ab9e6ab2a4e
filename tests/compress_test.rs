//! Integration tests for PDF image compression.

use std::cell::RefCell;
use std::io::Cursor;

use filekit::pdf::{self, CompressionLevel, CompressionProgress, ImageInput, ImageReport, SkipReason};
use filekit::ErrorKind;
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::{Document, Object};

/// Deterministic noise, which Flate cannot shrink but JPEG can.
fn noise(width: u32, height: u32) -> RgbImage {
    let mut state: u32 = 0x2545_F491;
    RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        };
        Rgb([next(), next(), next()])
    })
}

fn png(image: &RgbImage) -> Vec<u8> {
    let mut out = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}

fn pdf_of(image: &RgbImage) -> Vec<u8> {
    pdf::images_to_pdf(&[ImageInput::new("noise.png", png(image))]).unwrap()
}

fn image_streams(bytes: &[u8]) -> Vec<lopdf::Stream> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.objects
        .values()
        .filter_map(|object| match object {
            Object::Stream(stream)
                if stream.dict.get(b"Subtype").and_then(Object::as_name).ok() == Some(&b"Image"[..]) =>
            {
                Some(stream.clone())
            }
            _ => None,
        })
        .collect()
}

#[test]
fn test_extreme_recompresses_noise() {
    let input = pdf_of(&noise(600, 400));
    let report = pdf::compress(&input, CompressionLevel::Extreme).unwrap();

    assert_eq!(report.images.len(), 1);
    assert_eq!(report.compressed_count(), 1);
    let done = report.images[0].outcome.as_ref().unwrap();
    assert!(done.new_size < done.original_size);
    assert_eq!((done.width, done.height), (600, 400));

    assert_eq!(report.original_size, input.len());
    assert!(report.new_size < report.original_size);
    assert!(report.reduction() > 0.0);

    let streams = image_streams(&report.bytes);
    assert_eq!(streams.len(), 1);
    assert_eq!(
        streams[0].dict.get(b"Filter").and_then(Object::as_name).unwrap(),
        b"DCTDecode"
    );
    assert_eq!(pdf::info(&report.bytes).unwrap().page_count, 1);
}

#[test]
fn test_low_leaves_images_alone() {
    let input = pdf_of(&noise(200, 100));
    let report = pdf::compress(&input, CompressionLevel::Low).unwrap();

    assert_eq!(report.compressed_count(), 0);
    assert!(matches!(report.images[0].outcome, Err(SkipReason::NotSelected)));
    assert_eq!(
        image_streams(&report.bytes)[0].dict.get(b"Filter").and_then(Object::as_name).unwrap(),
        b"FlateDecode"
    );
    assert!(report.reduction() >= 0.0);
}

#[test]
fn test_wide_images_are_downsampled() {
    let input = pdf_of(&noise(1500, 20));

    let medium = pdf::compress(&input, CompressionLevel::Medium).unwrap();
    assert_eq!(medium.images[0].outcome.as_ref().unwrap().width, 1500);

    let extreme = pdf::compress(&input, CompressionLevel::Extreme).unwrap();
    let done = extreme.images[0].outcome.as_ref().unwrap();
    assert_eq!((done.width, done.height), (1200, 16));

    let stream = &image_streams(&extreme.bytes)[0];
    assert_eq!(stream.dict.get(b"Width").and_then(Object::as_i64).unwrap(), 1200);
    // the page keeps its size; only the raster shrinks
    let page = &pdf::info(&extreme.bytes).unwrap().pages[0];
    assert_eq!((page.width, page.height), (1500.0, 20.0));
}

#[test]
fn test_replacements_are_never_larger() {
    let translucent = RgbaImage::from_pixel(300, 300, Rgba([10, 200, 30, 128]));
    let mut bytes = Vec::new();
    translucent
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    let input = pdf::images_to_pdf(&[ImageInput::new("flat.png", bytes)]).unwrap();

    let report = pdf::compress(&input, CompressionLevel::Extreme).unwrap();
    // colour image and its soft mask
    assert_eq!(report.images.len(), 2);
    for image in &report.images {
        match &image.outcome {
            Ok(done) => assert!(done.new_size < done.original_size),
            Err(reason) => assert!(matches!(reason, SkipReason::NotSmaller { .. }), "{reason}"),
        }
    }
    assert!(report.reduction() >= 0.0);
}

struct Recorder {
    started: RefCell<Vec<(usize, usize)>>,
    finished: RefCell<usize>,
}

impl CompressionProgress for Recorder {
    fn on_image(&self, index: usize, total: usize) {
        self.started.borrow_mut().push((index, total));
    }

    fn on_image_done(&self, _report: &ImageReport) {
        *self.finished.borrow_mut() += 1;
    }
}

#[test]
fn test_progress_callbacks() {
    let images = [
        ImageInput::new("a.png", png(&noise(50, 50))),
        ImageInput::new("b.png", png(&noise(60, 40))),
    ];
    let input = pdf::images_to_pdf(&images).unwrap();

    let recorder = Recorder {
        started: RefCell::new(Vec::new()),
        finished: RefCell::new(0),
    };
    let report = pdf::compress_with_progress(&input, CompressionLevel::Medium, &recorder).unwrap();

    assert_eq!(recorder.started.into_inner(), vec![(1, 2), (2, 2)]);
    assert_eq!(recorder.finished.into_inner(), 2);
    assert_eq!(pdf::info(&report.bytes).unwrap().page_count, 2);
}

#[test]
fn test_output_uses_object_streams() {
    let input = pdf_of(&noise(200, 100));
    assert!(!input.windows(7).any(|w| w == b"/ObjStm"));

    for level in [CompressionLevel::Low, CompressionLevel::Extreme] {
        let report = pdf::compress(&input, level).unwrap();
        assert!(report.bytes.windows(7).any(|w| w == b"/ObjStm"), "{level:?}");
        assert!(report.bytes.windows(5).any(|w| w == b"/XRef"), "{level:?}");

        let info = pdf::info(&report.bytes).unwrap();
        assert_eq!(info.page_count, 1);
        assert_eq!((info.pages[0].width, info.pages[0].height), (200.0, 100.0));
    }
}

#[test]
fn test_compress_rejects_non_pdf() {
    let err = pdf::compress(b"definitely not a pdf", CompressionLevel::Medium).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PdfLoad);
}
