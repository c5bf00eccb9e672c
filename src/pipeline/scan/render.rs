//! Annotation overlay: draws finding boxes on a copy of the source scan,
//! downscales for display, and encodes the result as PNG.
//!
//! Pure image-to-image transform. No I/O, fully testable with in-memory buffers.

use std::io::Cursor;

use base64::Engine;
use image::imageops::FilterType;
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tracing::debug;

use super::geometry::{clamp_to_image, stroke_width, PixelRect};
use super::types::{Finding, ScanAnalysis};
use super::AnalysisError;
use crate::config::OverlayConfig;

/// Maximum input image size (in bytes) before rejecting.
const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024; // 50 MB

/// Minimum valid image size in bytes (smallest valid PNG is ~67 bytes).
const MIN_IMAGE_BYTES: usize = 67;

/// Draw every finding's boxes onto a new RGBA copy of `source`.
///
/// Boxes are clamped to the image; the stroke grows inward from the outline.
pub fn render_annotations(
    source: &DynamicImage,
    findings: &[Finding],
    config: &OverlayConfig,
) -> RgbaImage {
    let mut canvas = source.to_rgba8();
    let (width, height) = canvas.dimensions();
    let stroke = stroke_width(width, config);
    let color = Rgba(config.highlight);

    let mut drawn = 0usize;
    for b in findings.iter().flat_map(|f| f.boxes.iter()) {
        if let Some(rect) = clamp_to_image(b, width, height) {
            draw_outline(&mut canvas, rect, stroke, color);
            drawn += 1;
        }
    }

    debug!(
        size = format!("{width}x{height}"),
        stroke,
        boxes = drawn,
        "Annotations drawn"
    );
    canvas
}

fn draw_outline(canvas: &mut RgbaImage, rect: PixelRect, stroke: u32, color: Rgba<u8>) {
    for t in 0..stroke {
        let w = rect.width().saturating_sub(2 * t);
        let h = rect.height().saturating_sub(2 * t);
        if w == 0 || h == 0 {
            break;
        }
        let ring = Rect::at((rect.left + t) as i32, (rect.top + t) as i32).of_size(w, h);
        draw_hollow_rect_mut(canvas, ring, color);
    }
}

/// Uniformly downscale when wider than `max_width`. `0` disables.
pub fn downscale_to_width(image: RgbaImage, max_width: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    if max_width == 0 || w <= max_width {
        return image;
    }

    let new_h = ((f64::from(h) * f64::from(max_width) / f64::from(w)).round() as u32).max(1);

    debug!(
        from = format!("{w}x{h}"),
        to = format!("{max_width}x{new_h}"),
        "Downscaling annotated image for display"
    );

    image::imageops::resize(&image, max_width, new_h, FilterType::Lanczos3)
}

/// Decode an uploaded scan, rejecting implausible sizes before decoding.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, AnalysisError> {
    if bytes.len() < MIN_IMAGE_BYTES {
        return Err(AnalysisError::Image("Image data too small to be valid".into()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(AnalysisError::Image(format!(
            "Image data exceeds {}MB limit",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }

    image::load_from_memory(bytes)
        .map_err(|e| AnalysisError::Image(format!("Failed to decode image: {e}")))
}

/// Encode an RGBA image as PNG bytes.
pub fn encode_png(img: RgbaImage) -> Result<Vec<u8>, AnalysisError> {
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .map_err(|e| AnalysisError::Image(format!("PNG encoding failed: {e}")))?;
    Ok(cursor.into_inner())
}

/// `data:` URL for embedding PNG bytes in a page.
pub fn png_data_url(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

impl ScanAnalysis {
    pub fn to_data_url(&self) -> String {
        png_data_url(&self.annotated_png)
    }
}
