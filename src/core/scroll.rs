//! Scroll state for the console window
//!
//! The offset counts rows back from the newest content: 0 shows the live
//! bottom of the console, larger values reveal older rows. It is bounded by
//! `total_rows - visible_rows` and clamped whenever either changes.

use serde::{Deserialize, Serialize};

/// Analog stick magnitude below which input is ignored
pub const AXIS_DEADZONE: f32 = 0.3;

/// Scroll direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollDirection {
    /// Towards older content
    Up,
    /// Towards the newest content
    Down,
}

/// Bounded scroll offset over a sequence of rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollController {
    offset: usize,
    total_rows: usize,
    visible_rows: usize,
}

impl ScrollController {
    /// Create a controller showing `visible_rows` rows at a time
    pub fn new(visible_rows: usize) -> Self {
        Self {
            offset: 0,
            total_rows: 0,
            visible_rows: visible_rows.max(1),
        }
    }

    /// Update content and viewport sizes, clamping the offset
    pub fn set_bounds(&mut self, total_rows: usize, visible_rows: usize) {
        self.total_rows = total_rows;
        self.visible_rows = visible_rows.max(1);
        self.offset = self.offset.min(self.max_offset());
    }

    /// Largest valid offset
    pub fn max_offset(&self) -> usize {
        self.total_rows.saturating_sub(self.visible_rows)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    /// Scroll one row; returns false at the bounds
    pub fn scroll(&mut self, direction: ScrollDirection) -> bool {
        match direction {
            ScrollDirection::Up if self.offset < self.max_offset() => {
                self.offset += 1;
                true
            }
            ScrollDirection::Down if self.offset > 0 => {
                self.offset -= 1;
                true
            }
            _ => false,
        }
    }

    /// Jump back to the live bottom
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Row range `[start, end)` currently visible
    pub fn window(&self) -> (usize, usize) {
        let end = self.total_rows.saturating_sub(self.offset);
        let start = end.saturating_sub(self.visible_rows);
        (start, end)
    }

    /// Convert one sample of an analog axis into a scroll step
    ///
    /// Negative values (stick pushed up) scroll towards older content.
    pub fn sample_axis(&mut self, value: f32) -> Option<ScrollDirection> {
        if !value.is_finite() || value.abs() <= AXIS_DEADZONE {
            return None;
        }
        let direction = if value < 0.0 {
            ScrollDirection::Up
        } else {
            ScrollDirection::Down
        };
        self.scroll(direction).then_some(direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_up_to_bound() {
        let mut sc = ScrollController::new(3);
        sc.set_bounds(5, 3);
        assert!(sc.scroll(ScrollDirection::Up));
        assert!(sc.scroll(ScrollDirection::Up));
        assert!(!sc.scroll(ScrollDirection::Up));
        assert_eq!(sc.offset(), 2);
        assert_eq!(sc.window(), (0, 3));
    }

    #[test]
    fn test_scroll_down_at_zero_is_noop() {
        let mut sc = ScrollController::new(3);
        sc.set_bounds(10, 3);
        assert!(!sc.scroll(ScrollDirection::Down));
        assert_eq!(sc.offset(), 0);
        assert_eq!(sc.window(), (7, 10));
    }

    #[test]
    fn test_content_shorter_than_viewport() {
        let mut sc = ScrollController::new(10);
        sc.set_bounds(4, 10);
        assert_eq!(sc.max_offset(), 0);
        assert!(!sc.scroll(ScrollDirection::Up));
        assert_eq!(sc.window(), (0, 4));
    }

    #[test]
    fn test_bounds_shrink_clamps_offset() {
        let mut sc = ScrollController::new(2);
        sc.set_bounds(10, 2);
        for _ in 0..8 {
            sc.scroll(ScrollDirection::Up);
        }
        assert_eq!(sc.offset(), 8);
        sc.set_bounds(5, 2);
        assert_eq!(sc.offset(), 3);
    }

    #[test]
    fn test_axis_deadzone() {
        let mut sc = ScrollController::new(2);
        sc.set_bounds(10, 2);
        assert_eq!(sc.sample_axis(0.2), None);
        assert_eq!(sc.sample_axis(-0.3), None);
        assert_eq!(sc.sample_axis(-0.8), Some(ScrollDirection::Up));
        assert_eq!(sc.sample_axis(0.9), Some(ScrollDirection::Down));
        assert_eq!(sc.sample_axis(0.9), None);
        assert_eq!(sc.sample_axis(f32::NAN), None);
    }
}
