use serde_json::{Map, Value};

use super::types::BoundingBox;
use crate::config::OverlayConfig;

/// Key holding a single `[x1, y1, x2, y2]` box.
pub const SINGLE_BOX_KEY: &str = "bbox";

/// Key holding a list of boxes.
pub const BOX_LIST_KEY: &str = "bboxes";

/// Collect every well-formed box of a finding: the single box first, then
/// list entries in order. Malformed entries are dropped with a warning.
pub fn collect_boxes(
    finding: &Map<String, Value>,
    finding_index: usize,
    warnings: &mut Vec<String>,
) -> Vec<BoundingBox> {
    let mut boxes = Vec::new();

    if let Some(single) = finding.get(SINGLE_BOX_KEY) {
        match parse_box(single) {
            Some(b) => boxes.push(b),
            None if single.is_null() => {}
            None => warnings.push(format!(
                "Finding {finding_index}: dropped malformed '{SINGLE_BOX_KEY}'"
            )),
        }
    }

    match finding.get(BOX_LIST_KEY) {
        Some(Value::Array(entries)) => {
            for (i, entry) in entries.iter().enumerate() {
                match parse_box(entry) {
                    Some(b) => boxes.push(b),
                    None => warnings.push(format!(
                        "Finding {finding_index}: dropped malformed '{BOX_LIST_KEY}' entry {i}"
                    )),
                }
            }
        }
        Some(Value::Null) | None => {}
        Some(_) => warnings.push(format!(
            "Finding {finding_index}: '{BOX_LIST_KEY}' is not a list"
        )),
    }

    boxes
}

/// A box is exactly four JSON integers.
pub fn parse_box(value: &Value) -> Option<BoundingBox> {
    let arr = value.as_array()?;
    if arr.len() != 4 {
        return None;
    }

    let mut coords = [0i64; 4];
    for (slot, v) in coords.iter_mut().zip(arr) {
        *slot = v.as_i64()?;
    }
    Some(BoundingBox::from(coords))
}

/// Outline width proportional to the source width, so boxes stay visible
/// on both thumbnails and full-resolution scans.
pub fn stroke_width(image_width: u32, config: &OverlayConfig) -> u32 {
    let divisor = config.stroke_divisor.max(1);
    (image_width / divisor).clamp(config.min_stroke, config.max_stroke.max(config.min_stroke))
}

/// Inclusive pixel rectangle inside the image bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl PixelRect {
    pub fn width(&self) -> u32 {
        self.right - self.left + 1
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top + 1
    }
}

/// Clamp a model box into `[0, width) x [0, height)`.
///
/// The rectangle spans the two clamped corners whichever way round they are,
/// so inverted boxes still draw. Returns `None` only for an empty image.
pub fn clamp_to_image(b: &BoundingBox, width: u32, height: u32) -> Option<PixelRect> {
    if width == 0 || height == 0 {
        return None;
    }

    let clamp_x = |v: i64| v.clamp(0, i64::from(width) - 1) as u32;
    let clamp_y = |v: i64| v.clamp(0, i64::from(height) - 1) as u32;

    let (x1, x2) = (clamp_x(b.x1), clamp_x(b.x2));
    let (y1, y2) = (clamp_y(b.y1), clamp_y(b.y2));

    Some(PixelRect {
        left: x1.min(x2),
        top: y1.min(y2),
        right: x1.max(x2),
        bottom: y1.max(y2),
    })
}
