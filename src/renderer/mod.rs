//! Renderer Module
//!
//! The console hands each redraw to a `RenderSink` as a `Frame`: the
//! visible text runs already placed on the cell grid, plus the cursor.
//! `SoftwareRenderer` is the built-in sink; it draws frames into a
//! `PixelSurface` through a `GlyphRasterizer`.
//!
//! Redraws are full recomputes, so the last frame drawn always wins.

#[cfg(feature = "raster")]
mod font;
mod raster;
mod surface;

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

use crate::core::{ColorToken, FontMetrics};

#[cfg(feature = "raster")]
pub use font::{FontError, FontRenderer};
pub use raster::{BlockRasterizer, Glyph, GlyphRasterizer};
pub use surface::PixelSurface;

/// A run of same-colored text placed on the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub color: ColorToken,
    /// Cell column of the first character
    pub col: usize,
    /// Visible row
    pub row: usize,
    /// Pixel position of the run's top-left corner
    pub x: f32,
    pub y: f32,
}

/// Cursor glyph state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameCursor {
    pub col: usize,
    pub row: usize,
    pub x: f32,
    pub y: f32,
    /// Blink phase; hidden cursors are not drawn
    pub visible: bool,
}

/// Everything needed to draw the console once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub metrics: FontMetrics,
    pub background: ColorToken,
    pub background_opacity: f32,
    /// Color for runs whose color is `Default`
    pub text_color: ColorToken,
    pub runs: Vec<TextRun>,
    pub cursor: Option<FrameCursor>,
}

impl Frame {
    /// Resolve a run color against the frame's text color
    pub fn resolve(&self, color: ColorToken) -> (u8, u8, u8) {
        color.or(self.text_color).to_rgb((255, 255, 255))
    }
}

/// Consumer of console frames
pub trait RenderSink {
    /// Draw one frame, replacing whatever was drawn before
    fn draw(&mut self, frame: &Frame);
}

/// Records frames instead of drawing them
#[derive(Debug, Default, Clone)]
pub struct FrameRecorder {
    pub frames: Vec<Frame>,
}

impl RenderSink for FrameRecorder {
    fn draw(&mut self, frame: &Frame) {
        self.frames.push(frame.clone());
    }
}

/// CPU renderer drawing frames into a pixel surface
#[derive(Debug)]
pub struct SoftwareRenderer<R = BlockRasterizer> {
    surface: PixelSurface,
    rasterizer: R,
}

impl SoftwareRenderer<BlockRasterizer> {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_rasterizer(width, height, BlockRasterizer)
    }
}

impl<R: GlyphRasterizer> SoftwareRenderer<R> {
    pub fn with_rasterizer(width: u32, height: u32, rasterizer: R) -> Self {
        Self {
            surface: PixelSurface::new(width, height),
            rasterizer,
        }
    }

    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut PixelSurface {
        &mut self.surface
    }

    pub fn rasterizer_mut(&mut self) -> &mut R {
        &mut self.rasterizer
    }

    fn draw_run(&mut self, frame: &Frame, run: &TextRun) {
        let metrics = &frame.metrics;
        let rgb = frame.resolve(run.color);
        let mut x = run.x;

        // Every character owns exactly one cell, matching the layout
        for c in run.text.chars() {
            let font_size = match c.width() {
                Some(0) => {
                    x += metrics.char_width_px;
                    continue;
                }
                // Wide glyphs are scaled down into their single cell
                Some(span) => metrics.font_size / span as f32,
                None => metrics.font_size,
            };
            let glyph = self.rasterizer.rasterize(
                c,
                font_size,
                metrics.char_width_px,
                metrics.line_height_px,
            );
            if !glyph.bitmap.is_empty() {
                self.surface.draw_glyph(
                    &glyph.bitmap,
                    glyph.width,
                    glyph.height,
                    x.round() as i32 + glyph.x_offset,
                    run.y.round() as i32 + glyph.y_offset,
                    rgb,
                );
            }
            x += metrics.char_width_px;
        }
    }
}

impl<R: GlyphRasterizer> RenderSink for SoftwareRenderer<R> {
    fn draw(&mut self, frame: &Frame) {
        self.surface.resize(frame.width, frame.height);
        let background = frame.background.to_rgb((0, 0, 0));
        self.surface.clear(background, frame.background_opacity);

        for run in &frame.runs {
            self.draw_run(frame, run);
        }

        if let Some(cursor) = frame.cursor.filter(|c| c.visible) {
            let metrics = &frame.metrics;
            // Underline-style bar along the bottom of the cell
            let height = (metrics.line_height_px / 8.0).ceil().max(1.0) as u32;
            self.surface.fill_rect(
                cursor.x.round() as i32,
                (cursor.y + metrics.line_height_px).round() as i32 - height as i32,
                metrics.char_width_px.ceil().max(1.0) as u32,
                height,
                frame.resolve(ColorToken::Default),
            );
        }

        self.surface.mark_dirty();
    }
}
