//! Font metrics
//!
//! Layout constants derived from the font and the canvas size: how many
//! characters fit on a row, how many rows fit on the canvas, and the margins
//! around them. Recomputed whenever the font or canvas changes.

use serde::{Deserialize, Serialize};

/// Percentage of the raw grid reserved as margin on each axis
const MARGIN_PERCENT: usize = 2;

/// Line height as a multiple of the font size
pub const LINE_HEIGHT_FACTOR: f32 = 1.25;

/// Measures glyph advances without touching the visible surface
pub trait TextMeasure {
    /// Advance width of one monospace cell in pixels
    fn char_width(&self, font_size: f32, font_family: &str) -> f32;

    /// Distance between baselines in pixels
    fn line_height(&self, font_size: f32, _font_family: &str) -> f32 {
        font_size * LINE_HEIGHT_FACTOR
    }
}

/// Measurement based on the typical monospace aspect ratio
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMeasure {
    /// Advance width as a fraction of the font size
    pub aspect: f32,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self { aspect: 0.6 }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn char_width(&self, font_size: f32, _font_family: &str) -> f32 {
        font_size * self.aspect
    }
}

/// Derived layout constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontMetrics {
    pub font_size: f32,
    pub char_width_px: f32,
    pub line_height_px: f32,
    /// Characters per row after the horizontal margin
    pub max_line_width_chars: usize,
    /// Rows per screen after the vertical margin
    pub max_console_lines: usize,
    /// Horizontal margin in character cells
    pub x_margin: usize,
    /// Vertical margin in rows
    pub y_margin: usize,
}

impl FontMetrics {
    /// Compute metrics for a font on a canvas
    pub fn compute(
        measure: &dyn TextMeasure,
        font_size: f32,
        font_family: &str,
        canvas_width: u32,
        canvas_height: u32,
    ) -> Self {
        let char_width_px = measure.char_width(font_size, font_family).max(0.1);
        let line_height_px = measure.line_height(font_size, font_family).max(0.1);

        let (max_line_width_chars, x_margin) = fit_with_margin(canvas_width as f32, char_width_px);
        let (max_console_lines, y_margin) = fit_with_margin(canvas_height as f32, line_height_px);

        Self {
            font_size,
            char_width_px,
            line_height_px,
            max_line_width_chars,
            max_console_lines,
            x_margin,
            y_margin,
        }
    }

    /// Pixel position of the top-left corner of a cell
    pub fn cell_origin(&self, col: usize, row: usize) -> (f32, f32) {
        let x = (self.x_margin as f32 / 2.0 + col as f32) * self.char_width_px;
        let y = (self.y_margin as f32 / 2.0 + row as f32) * self.line_height_px;
        (x, y)
    }
}

/// Two-pass fit: raw cell count, then the margin, then the final subtraction
fn fit_with_margin(extent: f32, cell: f32) -> (usize, usize) {
    // Absorb f32 error so 1080 / 10.8 lands on 100, not 99
    let raw = (extent / cell + 1e-3).floor() as usize;
    let margin = (raw * MARGIN_PERCENT).div_ceil(100);
    (raw.saturating_sub(margin).max(1), margin)
}
