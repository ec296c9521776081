//! Demo mode
//!
//! Once the intro has finished, emits a sample line every interval so the
//! console can be showcased without a host feeding it.

use std::time::Duration;

use crate::core::ColorToken;

use super::GradientCursor;

/// Most overdue lines emitted by one tick
pub const MAX_CATCH_UP: usize = 4;

/// Lines cycled through in demo mode
const DEMO_LINES: &[&str] = &[
    "console ready",
    "loading scene assets",
    "compiled 42 shaders",
    "entity count: 128",
    "frame time 11.1ms",
    "warming texture cache",
    "input devices connected: 2",
    "autosave complete",
];

/// Periodic sample output
#[derive(Debug, Clone)]
pub struct DemoMode {
    interval: Duration,
    next_due: Option<Duration>,
    emitted: usize,
}

impl DemoMode {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next_due: None,
            emitted: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of lines emitted so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Lines due at `now`; the first tick only arms the timer
    ///
    /// After a stall longer than `MAX_CATCH_UP` intervals the missed lines
    /// are skipped and the schedule restarts from `now`.
    pub fn tick(&mut self, now: Duration, gradient: &mut GradientCursor) -> Vec<(String, ColorToken)> {
        let mut out = Vec::new();
        let Some(mut due) = self.next_due else {
            self.next_due = Some(now + self.interval);
            return out;
        };

        while due <= now && out.len() < MAX_CATCH_UP {
            let text = format!(
                "[demo {}] {}",
                self.emitted + 1,
                DEMO_LINES[self.emitted % DEMO_LINES.len()]
            );
            out.push((text, gradient.next_color()));
            self.emitted += 1;
            due += self.interval;
        }
        if due <= now {
            tracing::debug!(behind = ?(now - due), "demo output fell behind, skipping ahead");
            due = now + self.interval;
        }
        self.next_due = Some(due);
        out
    }
}
