//! Intro Animation
//!
//! Plays a banner into the console before normal operation starts.
//!
//! # Phases
//!
//! - `MeasuringFont`: shrink the font by whole pixels until the widest
//!   banner line fits, stopping at 1px. The first fitting step is found
//!   by a galloping search, so huge sizes stay cheap
//! - `Playing`: reveal one banner line per `line_delay`, each colored by
//!   the gradient cursor
//! - `Settling`: wait `settle_delay`, then clear the banner and restore
//!   the font unless the logo is kept
//! - `Done`: the console may start draining captured output
//!
//! The animator is driven by `tick` with an explicit clock and never
//! touches the console itself; it reports what to do as `IntroEvent`s.

mod demo;
mod gradient;

use std::time::Duration;

use crate::core::ColorToken;

pub use demo::{DemoMode, MAX_CATCH_UP};
pub use gradient::{GradientCursor, DEFAULT_PALETTE};

/// Smallest font size the fit search will try
pub const MIN_FONT_SIZE: f32 = 1.0;

/// Pause between the last banner line and cleanup
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// Banner shown by default
pub const BANNER: &[&str] = &[
    r"                         _     _ ",
    r"  _ __ ___   ___   ___ | |__ (_)",
    r" | '_ ` _ \ / _ \ / __|| '_ \| |",
    r" | | | | | | (_) | (__ | | | | |",
    r" |_| |_| |_|\___/ \___||_| |_|_|",
    r"",
    r"        c o n s o l e",
    r"",
];

/// Intro phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntroPhase {
    MeasuringFont,
    Playing,
    Settling,
    Done,
}

/// Work the console performs on behalf of the animator
#[derive(Debug, Clone, PartialEq)]
pub enum IntroEvent {
    /// Switch the font size and reflow
    SetFontSize(f32),
    /// Append one banner line
    Line { text: String, color: ColorToken },
    /// Drop everything shown so far
    ClearHistory,
    /// The intro has finished
    Done,
}

/// Timing and cleanup options
#[derive(Debug, Clone, PartialEq)]
pub struct IntroSettings {
    pub line_delay: Duration,
    pub settle_delay: Duration,
    /// Keep the banner (and its fitted font) after the intro
    pub keep_logo: bool,
    /// Finish on the first tick without showing anything
    pub skip: bool,
}

impl Default for IntroSettings {
    fn default() -> Self {
        Self {
            line_delay: Duration::from_millis(75),
            settle_delay: DEFAULT_SETTLE_DELAY,
            keep_logo: false,
            skip: false,
        }
    }
}

/// Tick-driven banner sequencer
#[derive(Debug, Clone)]
pub struct IntroAnimator {
    phase: IntroPhase,
    banner: Vec<String>,
    settings: IntroSettings,
    original_font_size: f32,
    fitted_font_size: f32,
    next_line: usize,
    /// When the next step is due
    due: Duration,
}

impl IntroAnimator {
    pub fn new(banner: Vec<String>, settings: IntroSettings, font_size: f32) -> Self {
        Self {
            phase: IntroPhase::MeasuringFont,
            banner,
            settings,
            original_font_size: font_size,
            fitted_font_size: font_size,
            next_line: 0,
            due: Duration::ZERO,
        }
    }

    /// Animator for the default banner
    pub fn with_default_banner(settings: IntroSettings, font_size: f32) -> Self {
        Self::new(
            BANNER.iter().map(|line| line.to_string()).collect(),
            settings,
            font_size,
        )
    }

    pub fn phase(&self) -> IntroPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == IntroPhase::Done
    }

    /// Font size chosen by the fit search
    pub fn fitted_font_size(&self) -> f32 {
        self.fitted_font_size
    }

    /// Advance to `now`
    ///
    /// `columns_at` reports how many characters fit on a row at a given
    /// font size. Several steps may complete in one tick when it arrives
    /// late.
    pub fn tick<F>(
        &mut self,
        now: Duration,
        gradient: &mut GradientCursor,
        columns_at: F,
    ) -> Vec<IntroEvent>
    where
        F: Fn(f32) -> usize,
    {
        let mut events = Vec::new();

        loop {
            match self.phase {
                IntroPhase::MeasuringFont => {
                    if self.settings.skip {
                        self.finish(&mut events);
                        break;
                    }
                    self.measure(&columns_at, &mut events);
                    self.phase = IntroPhase::Playing;
                    self.due = now;
                    tracing::debug!(
                        lines = self.banner.len(),
                        font_size = self.fitted_font_size,
                        "intro playing"
                    );
                }
                IntroPhase::Playing => {
                    if self.next_line >= self.banner.len() {
                        self.phase = IntroPhase::Settling;
                        self.due += self.settings.settle_delay;
                        continue;
                    }
                    if self.due > now {
                        break;
                    }
                    events.push(IntroEvent::Line {
                        text: self.banner[self.next_line].clone(),
                        color: gradient.next_color(),
                    });
                    self.next_line += 1;
                    if self.next_line < self.banner.len() {
                        self.due += self.settings.line_delay;
                    }
                }
                IntroPhase::Settling => {
                    if self.due > now {
                        break;
                    }
                    if !self.settings.keep_logo {
                        events.push(IntroEvent::ClearHistory);
                        if self.fitted_font_size != self.original_font_size {
                            events.push(IntroEvent::SetFontSize(self.original_font_size));
                        }
                    }
                    self.finish(&mut events);
                    break;
                }
                IntroPhase::Done => break,
            }
        }

        events
    }

    fn measure<F>(&mut self, columns_at: &F, events: &mut Vec<IntroEvent>)
    where
        F: Fn(f32) -> usize,
    {
        let widest = self
            .banner
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);

        let start = self.original_font_size.max(MIN_FONT_SIZE);
        let fits = |size: f32| columns_at(size) >= widest;
        let size = if fits(start) {
            start
        } else {
            // Step k is `start - k`, the last step is the floor
            let steps = (f64::from(start) - f64::from(MIN_FONT_SIZE)).ceil() as u64;
            let at = |k: u64| (f64::from(start) - k as f64).max(f64::from(MIN_FONT_SIZE)) as f32;
            // at(lo) never fits
            let mut lo = 0;
            let mut hi = steps.min(1);
            while hi < steps && !fits(at(hi)) {
                lo = hi;
                hi = hi.saturating_mul(2).min(steps);
            }
            while hi - lo > 1 {
                let mid = lo + (hi - lo) / 2;
                if fits(at(mid)) {
                    hi = mid;
                } else {
                    lo = mid;
                }
            }
            at(hi)
        };
        if columns_at(size) < widest {
            tracing::warn!(
                widest,
                columns = columns_at(size),
                "intro banner does not fit even at the minimum font size"
            );
        }

        self.fitted_font_size = size;
        if size != self.original_font_size {
            events.push(IntroEvent::SetFontSize(size));
        }
    }

    fn finish(&mut self, events: &mut Vec<IntroEvent>) {
        self.phase = IntroPhase::Done;
        events.push(IntroEvent::Done);
        tracing::debug!("intro done");
    }
}
