//! Font Rendering
//!
//! Glyph rasterization and measurement from a real font file.
//! Uses fontdue for simple, fast font rasterization.

use std::collections::HashMap;
use std::path::Path;

use fontdue::{Font, FontSettings};

use crate::core::TextMeasure;

use super::raster::{Glyph, GlyphRasterizer};

/// Font-related errors
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("font IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("font parse error: {0}")]
    Parse(String),
    #[error("no suitable font found")]
    NoFontFound,
}

/// Font renderer that rasterizes and caches glyphs
pub struct FontRenderer {
    font: Font,
    /// Cached glyphs keyed by character and font size bits
    glyph_cache: HashMap<(char, u32), Glyph>,
}

impl std::fmt::Debug for FontRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRenderer")
            .field("cached_glyphs", &self.glyph_cache.len())
            .finish()
    }
}

impl FontRenderer {
    /// Load a font file
    pub fn load(font_path: &Path) -> Result<Self, FontError> {
        let font_data = std::fs::read(font_path)?;
        Self::from_bytes(&font_data)
    }

    /// Create a font renderer from font data bytes
    pub fn from_bytes(font_data: &[u8]) -> Result<Self, FontError> {
        let font = Font::from_bytes(font_data, FontSettings::default())
            .map_err(|e| FontError::Parse(e.to_string()))?;
        Ok(Self {
            font,
            glyph_cache: HashMap::new(),
        })
    }

    /// Try common system monospace fonts in order of preference
    pub fn with_default_font() -> Result<Self, FontError> {
        let font_paths = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
            "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
            "/usr/share/fonts/truetype/ubuntu/UbuntuMono-R.ttf",
            "/usr/share/fonts/truetype/freefont/FreeMono.ttf",
        ];

        for path in &font_paths {
            if let Ok(renderer) = Self::load(Path::new(path)) {
                tracing::info!("loaded font: {}", path);
                return Ok(renderer);
            }
        }

        Err(FontError::NoFontFound)
    }

    pub fn clear_cache(&mut self) {
        self.glyph_cache.clear();
    }
}

impl TextMeasure for FontRenderer {
    fn char_width(&self, font_size: f32, _font_family: &str) -> f32 {
        // 'M' as the reference advance
        self.font.metrics('M', font_size).advance_width
    }

    fn line_height(&self, font_size: f32, _font_family: &str) -> f32 {
        self.font
            .horizontal_line_metrics(font_size)
            .map(|m| m.new_line_size)
            .unwrap_or(font_size * crate::core::LINE_HEIGHT_FACTOR)
    }
}

impl GlyphRasterizer for FontRenderer {
    fn rasterize(&mut self, c: char, font_size: f32, _cell_width: f32, cell_height: f32) -> Glyph {
        let key = (c, font_size.to_bits());
        if let Some(glyph) = self.glyph_cache.get(&key) {
            return glyph.clone();
        }

        let (metrics, bitmap) = self.font.rasterize(c, font_size);
        let ascent = self
            .font
            .horizontal_line_metrics(font_size)
            .map(|m| m.ascent)
            .unwrap_or(cell_height * 0.8);
        // fontdue offsets are relative to the baseline
        let y_offset = (ascent - metrics.height as f32 - metrics.ymin as f32).round() as i32;

        let glyph = Glyph {
            width: metrics.width as u32,
            height: metrics.height as u32,
            x_offset: metrics.xmin,
            y_offset,
            bitmap,
        };
        self.glyph_cache.insert(key, glyph.clone());
        glyph
    }
}
