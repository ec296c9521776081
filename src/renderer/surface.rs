//! Pixel surface
//!
//! An RGBA buffer exclusively owned by the console. Every write marks it
//! dirty; whoever uploads the pixels (a texture, a window) takes the flag.

/// RGBA pixel buffer with a dirty flag
#[derive(Debug, Clone)]
pub struct PixelSurface {
    /// Pixel buffer (RGBA)
    buffer: Vec<u8>,
    width: u32,
    height: u32,
    dirty: bool,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buffer: vec![0u8; (width as usize) * (height as usize) * 4],
            width,
            height,
            dirty: true,
        }
    }

    /// Resize the buffer; contents are undefined until the next clear
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.buffer
            .resize((width as usize) * (height as usize) * 4, 0);
        self.dirty = true;
    }

    /// Fill the whole surface with a color at the given opacity
    pub fn clear(&mut self, rgb: (u8, u8, u8), opacity: f32) {
        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        for pixel in self.buffer.chunks_exact_mut(4) {
            pixel[0] = rgb.0;
            pixel[1] = rgb.1;
            pixel[2] = rgb.2;
            pixel[3] = alpha;
        }
        self.dirty = true;
    }

    /// Fill a rectangle, clipped to the surface
    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, rgb: (u8, u8, u8)) {
        let x0 = x.max(0) as u32;
        let y0 = y.max(0) as u32;
        let x1 = (x + w as i32).clamp(0, self.width as i32) as u32;
        let y1 = (y + h as i32).clamp(0, self.height as i32) as u32;

        for row in y0..y1 {
            for col in x0..x1 {
                let idx = self.index(col, row);
                self.buffer[idx] = rgb.0;
                self.buffer[idx + 1] = rgb.1;
                self.buffer[idx + 2] = rgb.2;
                self.buffer[idx + 3] = 255;
            }
        }
        self.dirty = true;
    }

    /// Blend a coverage bitmap over the surface
    pub fn draw_glyph(
        &mut self,
        bitmap: &[u8],
        glyph_width: u32,
        glyph_height: u32,
        x: i32,
        y: i32,
        rgb: (u8, u8, u8),
    ) {
        for gy in 0..glyph_height {
            let py = y + gy as i32;
            if py < 0 || py >= self.height as i32 {
                continue;
            }

            for gx in 0..glyph_width {
                let px = x + gx as i32;
                if px < 0 || px >= self.width as i32 {
                    continue;
                }

                let coverage = bitmap
                    .get((gy * glyph_width + gx) as usize)
                    .copied()
                    .unwrap_or(0);
                if coverage == 0 {
                    continue;
                }

                let idx = self.index(px as u32, py as u32);
                let a = coverage as f32 / 255.0;
                let inv_a = 1.0 - a;
                let blend = |fg: u8, bg: u8| (fg as f32 * a + bg as f32 * inv_a).round() as u8;

                self.buffer[idx] = blend(rgb.0, self.buffer[idx]);
                self.buffer[idx + 1] = blend(rgb.1, self.buffer[idx + 1]);
                self.buffer[idx + 2] = blend(rgb.2, self.buffer[idx + 2]);
                self.buffer[idx + 3] = self.buffer[idx + 3].max(coverage);
            }
        }
        self.dirty = true;
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + x as usize) * 4
    }

    /// RGBA of one pixel
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = self.index(x, y);
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.buffer[idx..idx + 4]);
        Some(out)
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Read and reset the dirty flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}
