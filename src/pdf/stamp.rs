//! Text drawn on top of existing pages.

use super::document::{
    add_font, add_resource, append_content, load, media_box, page_ids, save, text_line,
};
use super::options::{PageNumberOptions, Position, WatermarkOptions};
use super::text::Font;
use crate::error::{Error, Result};
use lopdf::content::Operation;
use lopdf::{dictionary, Object};

const FONT_RESOURCE: &str = "FkHelv";
const STATE_RESOURCE: &str = "FkGs";

/// Helvetica cap height as a fraction of the font size.
const CAP_HEIGHT: f32 = 0.718;

const NUMBER_MARGIN_X: f32 = 40.0;
const NUMBER_MARGIN_BOTTOM: f32 = 30.0;
const NUMBER_MARGIN_TOP: f32 = 40.0;
const NUMBER_GREY: f32 = 0.3;

/// Draw `text` across the centre of every page.
pub fn watermark(bytes: &[u8], text: &str, options: &WatermarkOptions) -> Result<Vec<u8>> {
    if text.trim().is_empty() {
        return Err(Error::InvalidArgument("watermark text is empty".into()));
    }
    if options.font_size <= 0.0 {
        return Err(Error::InvalidArgument("font size must be positive".into()));
    }

    let mut doc = load(bytes)?;
    let font = add_font(&mut doc, Font::Helvetica);
    let opacity = options.opacity.clamp(0.0, 1.0);
    let state = doc.add_object(dictionary! {
        "Type" => "ExtGState",
        "ca" => opacity,
        "CA" => opacity,
    });

    let size = options.font_size;
    let width = Font::Helvetica.text_width(text, size);
    let [r, g, b] = options.color.clamped();
    let (sin, cos) = options.rotation.to_radians().sin_cos();

    for page in page_ids(&doc) {
        let [x0, y0, x1, y1] = media_box(&doc, page);
        let (cx, cy) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);

        add_resource(&mut doc, page, "Font", FONT_RESOURCE, Object::Reference(font))?;
        add_resource(&mut doc, page, "ExtGState", STATE_RESOURCE, Object::Reference(state))?;

        // Rotate about the page centre, then centre the text on the origin.
        let mut operations = vec![
            Operation::new("gs", vec![Object::Name(STATE_RESOURCE.as_bytes().to_vec())]),
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new(
                "cm",
                vec![cos.into(), sin.into(), (-sin).into(), cos.into(), cx.into(), cy.into()],
            ),
        ];
        operations.extend(text_line(
            FONT_RESOURCE,
            size,
            -width / 2.0,
            -size * CAP_HEIGHT / 2.0,
            text,
        ));
        append_content(&mut doc, page, operations)?;
    }

    save(&mut doc)
}

/// Where the label's baseline starts on a page with the given media box.
fn anchor(position: Position, media: [f32; 4], text_width: f32) -> (f32, f32) {
    let [x0, y0, x1, y1] = media;
    let x = match position {
        Position::TopLeft | Position::BottomLeft => x0 + NUMBER_MARGIN_X,
        Position::TopCenter | Position::BottomCenter => x0 + (x1 - x0 - text_width) / 2.0,
        Position::TopRight | Position::BottomRight => x1 - text_width - NUMBER_MARGIN_X,
    };
    let y = match position {
        Position::TopLeft | Position::TopCenter | Position::TopRight => y1 - NUMBER_MARGIN_TOP,
        _ => y0 + NUMBER_MARGIN_BOTTOM,
    };
    (x, y)
}

/// Label every page, e.g. `Page 2 of 7`.
pub fn add_page_numbers(bytes: &[u8], options: &PageNumberOptions) -> Result<Vec<u8>> {
    if options.font_size <= 0.0 {
        return Err(Error::InvalidArgument("font size must be positive".into()));
    }

    let mut doc = load(bytes)?;
    let font = add_font(&mut doc, Font::Helvetica);
    let pages = page_ids(&doc);
    let total = pages.len();

    for (index, page) in pages.into_iter().enumerate() {
        let label = options.label(index + 1, total);
        let width = Font::Helvetica.text_width(&label, options.font_size);
        let (x, y) = anchor(options.position, media_box(&doc, page), width);

        add_resource(&mut doc, page, "Font", FONT_RESOURCE, Object::Reference(font))?;

        let mut operations = vec![Operation::new(
            "rg",
            vec![NUMBER_GREY.into(), NUMBER_GREY.into(), NUMBER_GREY.into()],
        )];
        operations.extend(text_line(FONT_RESOURCE, options.font_size, x, y, &label));
        append_content(&mut doc, page, operations)?;
    }

    save(&mut doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A4: [f32; 4] = [0.0, 0.0, 595.0, 842.0];

    #[test]
    fn test_anchor_positions() {
        assert_eq!(anchor(Position::BottomLeft, A4, 100.0), (40.0, 30.0));
        assert_eq!(anchor(Position::BottomCenter, A4, 95.0), (250.0, 30.0));
        assert_eq!(anchor(Position::BottomRight, A4, 100.0), (455.0, 30.0));
        assert_eq!(anchor(Position::TopLeft, A4, 100.0), (40.0, 802.0));
        assert_eq!(anchor(Position::TopRight, A4, 100.0), (455.0, 802.0));
    }

    #[test]
    fn test_anchor_respects_media_origin() {
        let shifted = [100.0, 100.0, 695.0, 942.0];
        assert_eq!(anchor(Position::BottomLeft, shifted, 10.0), (140.0, 130.0));
    }

    #[test]
    fn test_watermark_rejects_empty_text() {
        let err = watermark(b"%PDF-1.7", "  ", &WatermarkOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
