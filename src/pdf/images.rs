//! Images to PDF, one page per image.

use super::document::PageAssembler;
use crate::error::{Error, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::ImageFormat;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;
use std::path::Path;

const IMAGE_RESOURCE: &str = "Im0";

/// An image file handed to [`images_to_pdf`].
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// File name; its extension is used when no MIME type is given
    pub name: String,
    /// Declared MIME type, if known
    pub mime_type: Option<String>,
    /// Encoded image
    pub bytes: Vec<u8>,
}

impl ImageInput {
    /// Create an input from a name and its bytes.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            bytes,
        }
    }

    /// Set the declared MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Read an image file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, std::fs::read(path)?))
    }

    fn kind(&self) -> Option<ImageKind> {
        match self.mime_type.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("image/jpeg" | "image/jpg") => return Some(ImageKind::Jpeg),
            Some("image/png") => return Some(ImageKind::Png),
            _ => {}
        }
        let name = self.name.to_ascii_lowercase();
        if name.ends_with(".jpg") || name.ends_with(".jpeg") {
            Some(ImageKind::Jpeg)
        } else if name.ends_with(".png") {
            Some(ImageKind::Png)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageKind {
    Jpeg,
    Png,
}

/// Frame header of a baseline or progressive JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct JpegFrame {
    width: u32,
    height: u32,
    components: u8,
}

/// Walk the marker segments up to the first start-of-frame.
fn jpeg_frame(data: &[u8]) -> Option<JpegFrame> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut i = 2;
    while i + 4 <= data.len() {
        if data[i] != 0xFF {
            return None;
        }
        let marker = data[i + 1];
        match marker {
            // fill byte
            0xFF => {
                i += 1;
                continue;
            }
            // standalone markers
            0x01 | 0xD0..=0xD8 => {
                i += 2;
                continue;
            }
            // scan data or end of image before any frame
            0xD9 | 0xDA => return None,
            _ => {}
        }

        let length = usize::from(u16::from_be_bytes([data[i + 2], data[i + 3]]));
        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            let segment = data.get(i + 4..i + 2 + length)?;
            if segment.len() < 6 {
                return None;
            }
            let frame = JpegFrame {
                height: u32::from(u16::from_be_bytes([segment[1], segment[2]])),
                width: u32::from(u16::from_be_bytes([segment[3], segment[4]])),
                components: segment[5],
            };
            return (frame.width > 0 && frame.height > 0).then_some(frame);
        }
        i += 2 + length;
    }
    None
}

/// An image XObject added to a document.
struct Embedded {
    id: ObjectId,
    width: u32,
    height: u32,
}

fn embed_jpeg(doc: &mut Document, data: &[u8]) -> std::result::Result<Embedded, String> {
    let frame = jpeg_frame(data).ok_or("no JPEG frame header found")?;
    let color_space = match frame.components {
        1 => "DeviceGray",
        3 => "DeviceRGB",
        4 => "DeviceCMYK",
        n => return Err(format!("unsupported JPEG component count {n}")),
    };

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(frame.width),
        "Height" => i64::from(frame.height),
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode",
    };
    if frame.components == 4 {
        // Adobe CMYK JPEGs store inverted values.
        dict.set("Decode", [1, 0, 1, 0, 1, 0, 1, 0].map(Object::Integer).to_vec());
    }

    let id = doc.add_object(Stream::new(dict, data.to_vec()));
    Ok(Embedded {
        id,
        width: frame.width,
        height: frame.height,
    })
}

fn deflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn pixel_stream(width: u32, height: u32, color_space: &str, pixels: &[u8]) -> std::result::Result<Stream, String> {
    let compressed = deflate(pixels).map_err(|e| e.to_string())?;
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(width),
        "Height" => i64::from(height),
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };
    Ok(Stream::new(dict, compressed))
}

fn embed_png(doc: &mut Document, data: &[u8]) -> std::result::Result<Embedded, String> {
    let image = image::load_from_memory_with_format(data, ImageFormat::Png).map_err(|e| e.to_string())?;
    let (width, height) = (image.width(), image.height());

    let mut stream = pixel_stream(width, height, "DeviceRGB", image.to_rgb8().as_raw())?;
    if image.color().has_alpha() {
        let alpha: Vec<u8> = image.to_rgba8().pixels().map(|p| p.0[3]).collect();
        let mask = doc.add_object(pixel_stream(width, height, "DeviceGray", &alpha)?);
        stream.dict.set("SMask", mask);
    }

    let id = doc.add_object(stream);
    Ok(Embedded { id, width, height })
}

/// One page per JPEG or PNG, each the size of the image in pixels
/// (one pixel per point). Inputs that are neither JPEG nor PNG by MIME type
/// or extension are skipped.
pub fn images_to_pdf(images: &[ImageInput]) -> Result<Vec<u8>> {
    let mut assembler = PageAssembler::new();

    for image in images {
        let Some(kind) = image.kind() else {
            log::info!("Skipping {}: not a JPEG or PNG image", image.name);
            continue;
        };

        let doc = assembler.document_mut();
        let embedded = match kind {
            ImageKind::Jpeg => embed_jpeg(doc, &image.bytes),
            ImageKind::Png => embed_png(doc, &image.bytes),
        }
        .map_err(|message| Error::ImageEmbed(format!("{}: {message}", image.name)))?;

        let (w, h) = (embedded.width as f32, embedded.height as f32);
        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![w.into(), 0.into(), 0.into(), h.into(), 0.into(), 0.into()],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ];
        let content = Content { operations }.encode()?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

        assembler.push_new_page(dictionary! {
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(i64::from(embedded.width)),
                Object::Integer(i64::from(embedded.height)),
            ],
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    IMAGE_RESOURCE => embedded.id,
                },
            },
            "Contents" => content_id,
        });
        log::debug!("Embedded {} ({}x{})", image.name, embedded.width, embedded.height);
    }

    if assembler.len() == 0 {
        return Err(Error::InvalidArgument("no JPEG or PNG images to convert".into()));
    }
    assembler.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::io::Cursor;

    /// A minimal JPEG header: SOI, an APP0 segment and a SOF0 frame.
    fn jpeg_header(width: u16, height: u16, components: u8) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00];
        data.extend([0xFF, 0xC0, 0x00, 0x0B, 0x08]);
        data.extend(height.to_be_bytes());
        data.extend(width.to_be_bytes());
        data.extend([components, 0x01, 0x11, 0x00]);
        data.extend([0xFF, 0xD9]);
        data
    }

    #[test]
    fn test_jpeg_frame() {
        let frame = jpeg_frame(&jpeg_header(640, 480, 3)).unwrap();
        assert_eq!(
            frame,
            JpegFrame {
                width: 640,
                height: 480,
                components: 3
            }
        );
        assert!(jpeg_frame(b"\xFF\xD8\xFF\xD9").is_none());
        assert!(jpeg_frame(b"GIF89a").is_none());
    }

    #[test]
    fn test_kind_from_mime_and_extension() {
        assert_eq!(ImageInput::new("a.JPG", vec![]).kind(), Some(ImageKind::Jpeg));
        assert_eq!(ImageInput::new("a.png", vec![]).kind(), Some(ImageKind::Png));
        assert_eq!(ImageInput::new("a.gif", vec![]).kind(), None);
        assert_eq!(
            ImageInput::new("upload", vec![]).with_mime_type("image/png").kind(),
            Some(ImageKind::Png)
        );
    }

    #[test]
    fn test_png_alpha_gets_soft_mask() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 2, Rgba([255, 0, 0, 128])));
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).unwrap();

        let mut doc = Document::with_version("1.7");
        let embedded = embed_png(&mut doc, &png).unwrap();
        assert_eq!((embedded.width, embedded.height), (3, 2));

        let stream = doc.get_object(embedded.id).unwrap().as_stream().unwrap();
        let mask = stream.dict.get(b"SMask").unwrap().as_reference().unwrap();
        let mask = doc.get_object(mask).unwrap().as_stream().unwrap();
        assert_eq!(mask.decompressed_content().unwrap(), vec![128; 6]);
    }

    #[test]
    fn test_jpeg_and_png_pages() {
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::new(20, 10))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        let inputs = vec![
            ImageInput::new("photo.jpg", jpeg_header(30, 40, 3)),
            ImageInput::new("notes.txt", b"skip me".to_vec()),
            ImageInput::new("icon.png", png),
        ];

        let bytes = images_to_pdf(&inputs).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let sizes: Vec<[f32; 4]> = doc
            .get_pages()
            .values()
            .map(|id| super::super::document::media_box(&doc, *id))
            .collect();
        assert_eq!(sizes, vec![[0.0, 0.0, 30.0, 40.0], [0.0, 0.0, 20.0, 10.0]]);
    }

    #[test]
    fn test_bad_image_is_an_error() {
        let err = images_to_pdf(&[ImageInput::new("broken.png", b"nope".to_vec())]).unwrap_err();
        assert!(matches!(err, Error::ImageEmbed(_)));

        let err = images_to_pdf(&[ImageInput::new("a.gif", vec![])]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
