//! Glyph rasterization

/// Coverage bitmap for one character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    pub width: u32,
    pub height: u32,
    /// Offset of the bitmap from the cell's top-left corner
    pub x_offset: i32,
    pub y_offset: i32,
    /// Grayscale coverage, one byte per pixel
    pub bitmap: Vec<u8>,
}

impl Glyph {
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            x_offset: 0,
            y_offset: 0,
            bitmap: Vec::new(),
        }
    }
}

/// Produces glyph bitmaps for a cell size
pub trait GlyphRasterizer {
    /// Rasterize `c` for a cell of `cell_width` x `cell_height` pixels
    fn rasterize(&mut self, c: char, font_size: f32, cell_width: f32, cell_height: f32) -> Glyph;
}

/// Draws every visible character as a solid block
///
/// Needs no font data, which keeps headless rendering and tests
/// deterministic.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockRasterizer;

impl GlyphRasterizer for BlockRasterizer {
    fn rasterize(&mut self, c: char, _font_size: f32, cell_width: f32, cell_height: f32) -> Glyph {
        if c.is_whitespace() || c.is_control() {
            return Glyph::empty();
        }
        let width = cell_width.floor().max(1.0) as u32;
        let height = cell_height.floor().max(1.0) as u32;
        // One pixel of padding on each side when the cell allows it
        let pad_x = u32::from(width > 2);
        let pad_y = u32::from(height > 2);
        let inner_w = width - pad_x * 2;
        let inner_h = height - pad_y * 2;
        Glyph {
            width: inner_w,
            height: inner_h,
            x_offset: pad_x as i32,
            y_offset: pad_y as i32,
            bitmap: vec![255; (inner_w * inner_h) as usize],
        }
    }
}
