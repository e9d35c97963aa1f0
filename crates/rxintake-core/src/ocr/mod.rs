//! OCR for scanned invoices and rasterized PDF pages.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::{create_engine, PureOcrEngine};

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Anything that can turn an image into text.
pub trait TextRecognizer {
    /// Recognize text boxes in an image.
    fn process(&self, image: &DynamicImage) -> Result<OcrResult, OcrError>;

    /// Convenience: recognized text only, in reading order.
    fn extract_text(&self, image: &DynamicImage) -> Result<String, OcrError> {
        Ok(self.process(image)?.text)
    }
}

/// A detected text box with its coordinates and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Result of OCR processing on an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    /// Detected and recognized text boxes.
    pub boxes: Vec<TextBox>,

    /// Full text, one line per visual row.
    pub text: String,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),
}

impl OcrResult {
    /// Build a result from unordered boxes.
    pub fn from_boxes(boxes: Vec<TextBox>, image_size: (u32, u32), processing_time_ms: u64) -> Self {
        let mut result = Self {
            boxes,
            text: String::new(),
            processing_time_ms,
            image_size,
        };
        result.sort_by_reading_order();
        result
    }

    /// Sort boxes by reading order and rebuild the text.
    ///
    /// A box joins the current line when its vertical centre lies within half
    /// a box height of the line's running centre. Each line is ordered left to
    /// right and its cells joined by spaces, so a slightly skewed table row
    /// still comes out as a single line.
    pub fn sort_by_reading_order(&mut self) {
        self.boxes.sort_by(|a, b| centre_y(a).total_cmp(&centre_y(b)));

        let mut lines: Vec<Line> = Vec::new();
        for text_box in self.boxes.drain(..) {
            match lines.last_mut() {
                Some(line) if line.accepts(&text_box) => line.push(text_box),
                _ => lines.push(Line::new(text_box)),
            }
        }

        let mut text = Vec::with_capacity(lines.len());
        for mut line in lines {
            line.boxes.sort_by(|a, b| a.rect().0.total_cmp(&b.rect().0));
            text.push(
                line.boxes
                    .iter()
                    .map(|b| b.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
            );
            self.boxes.extend(line.boxes);
        }

        self.text = text.join("\n");
    }
}

fn centre_y(text_box: &TextBox) -> f32 {
    let (_, top, _, bottom) = text_box.rect();
    (top + bottom) / 2.0
}

fn half_height(text_box: &TextBox) -> f32 {
    let (_, top, _, bottom) = text_box.rect();
    (bottom - top) / 2.0
}

/// Boxes sharing one visual line.
struct Line {
    boxes: Vec<TextBox>,
    centre: f32,
    half_height: f32,
}

impl Line {
    fn new(text_box: TextBox) -> Self {
        Self {
            centre: centre_y(&text_box),
            half_height: half_height(&text_box),
            boxes: vec![text_box],
        }
    }

    fn accepts(&self, text_box: &TextBox) -> bool {
        let tolerance = self.half_height.max(half_height(text_box)).max(1.0);
        (centre_y(text_box) - self.centre).abs() <= tolerance
    }

    fn push(&mut self, text_box: TextBox) {
        let n = self.boxes.len() as f32;
        self.centre = (self.centre * n + centre_y(&text_box)) / (n + 1.0);
        self.half_height = (self.half_height * n + half_height(&text_box)) / (n + 1.0);
        self.boxes.push(text_box);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_box(x: f32, y: f32, text: &str) -> TextBox {
        TextBox {
            bbox: [x, y, x + 50.0, y, x + 50.0, y + 10.0, x, y + 10.0],
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_reading_order_groups_rows() {
        let result = OcrResult::from_boxes(
            vec![
                text_box(200.0, 42.0, "$3.50"),
                text_box(10.0, 5.0, "INVOICE"),
                text_box(10.0, 41.0, "Paracetamol"),
                text_box(120.0, 45.0, "10 tabs"),
            ],
            (400, 100),
            3,
        );

        assert_eq!(result.text, "INVOICE\nParacetamol 10 tabs $3.50");
    }

    #[test]
    fn test_skewed_row_stays_on_one_line() {
        let result = OcrResult::from_boxes(
            vec![
                text_box(10.0, 38.0, "Paracetamol"),
                text_box(120.0, 41.0, "10 tabs"),
                text_box(200.0, 39.0, "$3.50"),
                text_box(10.0, 60.0, "Total"),
            ],
            (400, 100),
            3,
        );

        assert_eq!(result.text, "Paracetamol 10 tabs $3.50\nTotal");
        assert_eq!(result.boxes[1].text, "10 tabs");

        let items = crate::parse::text::parse_text(&result.text);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Paracetamol");
        assert_eq!(items[0].quantity.as_deref(), Some("10"));
    }

    #[test]
    fn test_rect() {
        let b = text_box(10.0, 20.0, "x");
        assert_eq!(b.rect(), (10.0, 20.0, 60.0, 30.0));
    }
}
