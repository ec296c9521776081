//! Gradient cursor
//!
//! Walks a fixed palette back and forth: up to the last color, then back
//! down to the first, and so on. One instance is shared by the intro and
//! demo mode so the colors continue where the banner left off.

use crate::core::ColorToken;

/// Magenta through blue to cyan
pub const DEFAULT_PALETTE: &[ColorToken] = &[
    ColorToken::Rgb(255, 0, 170),
    ColorToken::Rgb(230, 0, 200),
    ColorToken::Rgb(200, 0, 230),
    ColorToken::Rgb(160, 20, 255),
    ColorToken::Rgb(120, 50, 255),
    ColorToken::Rgb(80, 90, 255),
    ColorToken::Rgb(40, 130, 255),
    ColorToken::Rgb(0, 170, 255),
    ColorToken::Rgb(0, 210, 255),
    ColorToken::Rgb(0, 255, 255),
];

/// Bouncing walker over a color palette
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradientCursor {
    palette: Vec<ColorToken>,
    index: usize,
    ascending: bool,
}

impl Default for GradientCursor {
    fn default() -> Self {
        Self::new(DEFAULT_PALETTE.to_vec())
    }
}

impl GradientCursor {
    /// An empty palette falls back to the default color
    pub fn new(palette: Vec<ColorToken>) -> Self {
        let palette = if palette.is_empty() {
            vec![ColorToken::Default]
        } else {
            palette
        };
        Self {
            palette,
            index: 0,
            ascending: true,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> ColorToken {
        self.palette[self.index]
    }

    /// Return the current color and step, reversing at either end
    pub fn next_color(&mut self) -> ColorToken {
        let color = self.current();
        let last = self.palette.len() - 1;
        if last == 0 {
            return color;
        }
        if self.ascending && self.index == last {
            self.ascending = false;
        } else if !self.ascending && self.index == 0 {
            self.ascending = true;
        }
        if self.ascending {
            self.index += 1;
        } else {
            self.index -= 1;
        }
        color
    }
}
