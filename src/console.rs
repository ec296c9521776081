//! Console
//!
//! Ties together capture, formatting, reflow, scrolling, the command line,
//! the evaluator and the intro. This is the main integration point the
//! host drives: it feeds keys and log calls in, advances the clock with
//! `tick`, and pulls frames out.
//!
//! The console is cooperative. Nothing happens between calls; timers (intro
//! steps, cursor blink, demo output) fire when `tick` reaches their due time.

use std::time::Duration;

use crate::app::ConsoleConfig;
use crate::capture::{install_panic_hook, CaptureHandle, LogLevel};
use crate::core::{
    CursorSnapshot, FontMetrics, Fragment, MonospaceMeasure, ReflowEngine,
    ScrollController, ScrollDirection, Snapshot, TextMeasure, ViewRow,
};
use crate::error::ConsoleError;
use crate::eval::{EvalOutcome, Evaluator};
use crate::format::{FormattedEntry, Formatter, LogArg};
use crate::input::{CommandHistory, CommandLayout, CommandLine, Key, KeyValueStore, Submission, PROMPT};
use crate::intro::{DemoMode, GradientCursor, IntroAnimator, IntroEvent, IntroPhase, IntroSettings};
use crate::renderer::{Frame, FrameCursor, RenderSink, TextRun};

/// Cursor blink half-period
pub const CURSOR_BLINK: Duration = Duration::from_millis(500);

/// The visible window, row by row
struct View {
    rows: Vec<ViewRow>,
    cursor: Option<CursorSnapshot>,
}

/// A scrollable, auto-reflowing console
pub struct Console {
    config: ConsoleConfig,
    measure: Box<dyn TextMeasure>,
    metrics: FontMetrics,
    /// Font size in effect; differs from the configured one while the intro
    /// shows a shrunk banner
    font_size: f32,
    engine: ReflowEngine,
    scroll: ScrollController,
    formatter: Formatter,
    capture: CaptureHandle,
    command_line: CommandLine,
    evaluator: Evaluator,
    intro: IntroAnimator,
    gradient: GradientCursor,
    demo: Option<DemoMode>,
    /// Last thumbstick axis value, sampled on every tick
    axis: f32,
    cursor_visible: bool,
    next_blink: Option<Duration>,
    dirty: bool,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("metrics", &self.metrics)
            .field("entries", &self.engine.raw_len())
            .field("lines", &self.engine.line_count())
            .field("intro", &self.intro.phase())
            .field("evaluator", &self.evaluator)
            .finish()
    }
}

impl Console {
    /// Create a console with an in-memory command history
    pub fn new(config: ConsoleConfig) -> Result<Self, ConsoleError> {
        Self::with_history(config, CommandHistory::new())
    }

    /// Create a console whose command history is backed by `store`
    ///
    /// The backup slot is read once here; a corrupt slot is an error.
    pub fn with_history_store(
        config: ConsoleConfig,
        store: Box<dyn KeyValueStore>,
    ) -> Result<Self, ConsoleError> {
        let history = CommandHistory::with_store(store)?;
        Self::with_history(config, history)
    }

    /// Create a console around an existing command history
    pub fn with_history(config: ConsoleConfig, history: CommandHistory) -> Result<Self, ConsoleError> {
        config.validate()?;

        let measure: Box<dyn TextMeasure> = Box::new(MonospaceMeasure::default());
        let (width, height) = config.canvas_size();
        let metrics = FontMetrics::compute(
            measure.as_ref(),
            config.font_size,
            &config.font_family,
            width,
            height,
        );

        let mut engine = ReflowEngine::new(config.history, metrics.max_line_width_chars);
        engine.set_show_stack_traces(config.show_stack_traces);

        let capture = CaptureHandle::new(config.capture_rules());
        capture.set_active(config.capture_console_active);
        if config.capture_panics {
            install_panic_hook(&capture);
        }

        let intro = IntroAnimator::with_default_banner(intro_settings(&config), config.font_size);
        let demo = config
            .demo
            .then(|| DemoMode::new(Duration::from_millis(config.demo_interval)));

        tracing::debug!(
            cols = metrics.max_line_width_chars,
            rows = metrics.max_console_lines,
            "console created"
        );

        Ok(Self {
            font_size: config.font_size,
            measure,
            metrics,
            scroll: ScrollController::new(metrics.max_console_lines),
            engine,
            formatter: Formatter::new(),
            capture,
            command_line: CommandLine::new(history, config.command_color),
            evaluator: Evaluator::default(),
            intro,
            gradient: GradientCursor::default(),
            demo,
            axis: 0.0,
            cursor_visible: true,
            next_blink: None,
            dirty: true,
            config,
        })
    }

    /// Replace the evaluator; the new one is probed on first use
    pub fn set_evaluator(&mut self, evaluator: Evaluator) {
        self.evaluator = evaluator;
    }

    /// Replace the text measurement and reflow
    pub fn set_measure(&mut self, measure: Box<dyn TextMeasure>) {
        self.measure = measure;
        self.recompute_metrics();
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    pub fn engine(&self) -> &ReflowEngine {
        &self.engine
    }

    pub fn command_line(&self) -> &CommandLine {
        &self.command_line
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll.offset()
    }

    pub fn intro_phase(&self) -> IntroPhase {
        self.intro.phase()
    }

    /// Whether the intro has finished and captured output is flowing
    pub fn is_ready(&self) -> bool {
        self.intro.is_done()
    }

    /// A handle for routing log calls from elsewhere (or a tracing layer)
    pub fn capture_handle(&self) -> CaptureHandle {
        self.capture.clone()
    }

    /// Switch capture on or off without unregistering anything
    pub fn set_capture_active(&mut self, active: bool) {
        self.config.capture_console_active = active;
        self.capture.set_active(active);
    }

    /// Whether something changed since the last redraw
    pub fn needs_redraw(&self) -> bool {
        self.dirty
    }

    /// Capture one log call
    ///
    /// Calls made during the intro are queued and shown once it is done,
    /// in call order.
    pub fn log(&mut self, level: LogLevel, args: Vec<LogArg>) {
        self.capture.log(level, args);
        if self.intro.is_done() {
            self.flush_captured();
        }
    }

    /// Advance every timer to `now`
    pub fn tick(&mut self, now: Duration) {
        if !self.intro.is_done() {
            self.advance_intro(now);
        }

        if self.intro.is_done() {
            self.flush_captured();

            let demo_lines = match self.demo.as_mut() {
                Some(demo) => demo.tick(now, &mut self.gradient),
                None => Vec::new(),
            };
            for (text, color) in demo_lines {
                self.append(FormattedEntry::plain(text, color));
            }

            if self.config.thumbstick_scrolling && self.axis != 0.0 {
                self.update_bounds();
                if self.scroll.sample_axis(self.axis).is_some() {
                    self.dirty = true;
                }
            }
        }

        self.blink(now);
    }

    fn advance_intro(&mut self, now: Duration) {
        let measure = self.measure.as_ref();
        let family = self.config.font_family.as_str();
        let (width, height) = self.config.canvas_size();
        let events = self.intro.tick(now, &mut self.gradient, |size| {
            FontMetrics::compute(measure, size, family, width, height).max_line_width_chars
        });

        for event in events {
            match event {
                IntroEvent::SetFontSize(size) => {
                    self.font_size = size;
                    self.recompute_metrics();
                }
                IntroEvent::Line { text, color } => {
                    self.append(FormattedEntry::plain(text, color));
                }
                IntroEvent::ClearHistory => {
                    self.engine.clear();
                    self.scroll.reset();
                    self.dirty = true;
                }
                IntroEvent::Done => {
                    tracing::debug!(pending = self.capture.pending(), "console ready");
                    self.dirty = true;
                }
            }
        }
    }

    fn blink(&mut self, now: Duration) {
        let Some(due) = self.next_blink else {
            self.next_blink = Some(now + CURSOR_BLINK);
            return;
        };
        if due > now {
            return;
        }
        // Whole half-periods elapsed, without stepping through a long stall
        let late = (now - due).as_nanos();
        let half = CURSOR_BLINK.as_nanos();
        if (late / half) % 2 == 0 {
            self.cursor_visible = !self.cursor_visible;
        }
        let into_period = Duration::from_nanos((late % half) as u64);
        self.next_blink = Some(now + CURSOR_BLINK - into_period);
        if self.command_line_shown() {
            self.dirty = true;
        }
    }

    /// Feed one key press
    ///
    /// Returns false when keyboard input is disabled or the intro is still
    /// running.
    pub fn handle_key(&mut self, key: Key) -> bool {
        if !self.command_line_shown() {
            return false;
        }

        match key {
            Key::PageUp => {
                self.scroll(ScrollDirection::Up);
            }
            Key::PageDown => {
                self.scroll(ScrollDirection::Down);
            }
            key => {
                if let Some(submission) = self.command_line.handle_key(key) {
                    self.submit(submission);
                }
                if key.is_edit() || key == Key::Enter {
                    self.scroll.reset();
                }
                // Keep the cursor solid while typing
                self.cursor_visible = true;
                self.update_bounds();
                self.dirty = true;
            }
        }
        true
    }

    /// Echo a command, run it and print the outcome
    fn submit(&mut self, submission: Submission) {
        self.append(FormattedEntry::plain(
            format!("{}{}", PROMPT, submission.text),
            submission.color,
        ));

        match self.evaluator.run(&submission.text) {
            EvalOutcome::Value(value) => {
                let entries =
                    self.formatter
                        .format(&[LogArg::Value(value)], self.config.return_color, None);
                for entry in entries {
                    self.append(entry);
                }
            }
            EvalOutcome::NoValue => {}
            EvalOutcome::Failed(error) => {
                self.append(FormattedEntry::plain(error.to_string(), self.config.error_color));
            }
        }
    }

    /// Scroll one row; returns false at the bounds
    pub fn scroll(&mut self, direction: ScrollDirection) -> bool {
        self.update_bounds();
        let moved = self.scroll.scroll(direction);
        if moved {
            self.dirty = true;
        }
        moved
    }

    /// Record the thumbstick axis; it is turned into scroll steps on tick
    pub fn set_thumbstick(&mut self, value: f32) {
        self.axis = if value.is_finite() { value } else { 0.0 };
    }

    /// Apply a new configuration
    ///
    /// Font or canvas changes reflow the history; everything else takes
    /// effect in place.
    pub fn update_config(&mut self, config: ConsoleConfig) -> Result<(), ConsoleError> {
        config.validate()?;
        let old = std::mem::replace(&mut self.config, config);
        let new = &self.config;

        if new.history != old.history {
            self.engine.set_history_limit(new.history);
        }
        if new.show_stack_traces != old.show_stack_traces {
            self.engine.set_show_stack_traces(new.show_stack_traces);
        }
        if new.capture_console != old.capture_console
            || new.capture_console_colors != old.capture_console_colors
            || new.capture_stack_trace_for != old.capture_stack_trace_for
        {
            self.capture.set_rules(new.capture_rules());
        }
        self.capture.set_active(new.capture_console_active);
        if new.capture_panics && !old.capture_panics {
            install_panic_hook(&self.capture);
        }
        self.command_line.set_color(new.command_color);

        if new.demo != old.demo || new.demo_interval != old.demo_interval {
            self.demo = new
                .demo
                .then(|| DemoMode::new(Duration::from_millis(new.demo_interval)));
        }

        let relayout = new.font_size != old.font_size
            || new.font_family != old.font_family
            || new.canvas_size() != old.canvas_size();
        if new.font_size != old.font_size && self.intro.is_done() {
            self.font_size = new.font_size;
        }
        if relayout {
            self.recompute_metrics();
        }

        self.update_bounds();
        self.dirty = true;
        Ok(())
    }

    /// Persist any history mutation that failed to write earlier
    pub fn flush_history(&mut self) -> Result<(), ConsoleError> {
        self.command_line.history_mut().flush()?;
        Ok(())
    }

    fn recompute_metrics(&mut self) {
        let (width, height) = self.config.canvas_size();
        self.metrics = FontMetrics::compute(
            self.measure.as_ref(),
            self.font_size,
            &self.config.font_family,
            width,
            height,
        );
        self.engine.set_max_line_width(self.metrics.max_line_width_chars);
        tracing::debug!(
            font_size = self.font_size,
            cols = self.metrics.max_line_width_chars,
            rows = self.metrics.max_console_lines,
            "font metrics changed"
        );
        self.update_bounds();
        self.dirty = true;
    }

    fn flush_captured(&mut self) {
        for call in self.capture.drain() {
            let entries = self
                .formatter
                .format(&call.args, call.color, call.stack.as_deref());
            for entry in entries {
                self.append(entry);
            }
        }
    }

    fn append(&mut self, entry: FormattedEntry) {
        let result = self
            .engine
            .append(entry.text, entry.color, entry.stack_trace, entry.same_line);
        if let Err(e) = result {
            tracing::error!("dropped console entry: {}", e);
            return;
        }
        self.update_bounds();
        self.dirty = true;
    }

    fn command_line_shown(&self) -> bool {
        self.config.keyboard_events_input && self.intro.is_done()
    }

    fn command_layout(&self) -> Option<CommandLayout> {
        self.command_line_shown()
            .then(|| self.command_line.layout(self.metrics.max_line_width_chars))
    }

    /// History rows plus command line rows
    pub fn total_rows(&self) -> usize {
        let command_rows = self.command_layout().map_or(0, |layout| layout.rows.len());
        self.engine.row_count() + command_rows
    }

    fn update_bounds(&mut self) {
        let total = self.total_rows();
        self.scroll.set_bounds(total, self.metrics.max_console_lines);
    }

    fn view(&self) -> View {
        let layout = self.command_layout();
        let history_rows = self.engine.rows();
        let command_rows = layout.as_ref().map_or(0, |l| l.rows.len());
        let total = history_rows.len() + command_rows;

        let mut scroll = self.scroll.clone();
        scroll.set_bounds(total, self.metrics.max_console_lines);
        let (start, end) = scroll.window();

        let mut rows = Vec::with_capacity(end - start);
        for index in start..end {
            if let Some(row) = history_rows.get(index) {
                let fragments = (row.start..row.end)
                    .filter_map(|i| self.engine.line(i))
                    .map(|line| Fragment {
                        text: line.text.clone(),
                        color: line.color,
                    })
                    .collect();
                rows.push(ViewRow { fragments });
            } else if let Some(text) = layout
                .as_ref()
                .and_then(|l| l.rows.get(index - history_rows.len()))
            {
                rows.push(ViewRow {
                    fragments: vec![Fragment {
                        text: text.clone(),
                        color: self.command_line.color(),
                    }],
                });
            }
        }

        let cursor = layout.and_then(|l| {
            let row = history_rows.len() + l.cursor_row;
            (start..end).contains(&row).then_some(CursorSnapshot {
                row: row - start,
                col: l.cursor_col,
                visible: self.cursor_visible,
            })
        });

        View { rows, cursor }
    }

    /// Deterministic snapshot of the visible window
    pub fn snapshot(&self) -> Snapshot {
        let view = self.view();
        Snapshot {
            cols: self.metrics.max_line_width_chars,
            rows: self.metrics.max_console_lines,
            view: view.rows,
            cursor: view.cursor,
            scroll_offset: self.scroll.offset(),
            total_rows: self.total_rows(),
            history_len: self.engine.raw_len(),
        }
    }

    /// Build the frame for the current state
    pub fn frame(&self) -> Frame {
        let view = self.view();
        let metrics = self.metrics;

        let mut runs = Vec::new();
        for (row, view_row) in view.rows.iter().enumerate() {
            let mut col = 0;
            for fragment in &view_row.fragments {
                let (x, y) = metrics.cell_origin(col, row);
                runs.push(TextRun {
                    text: fragment.text.clone(),
                    color: fragment.color,
                    col,
                    row,
                    x,
                    y,
                });
                col += fragment.text.chars().count();
            }
        }

        let cursor = view.cursor.map(|c| {
            let (x, y) = metrics.cell_origin(c.col, c.row);
            FrameCursor {
                col: c.col,
                row: c.row,
                x,
                y,
                visible: c.visible,
            }
        });

        let (width, height) = self.config.canvas_size();
        Frame {
            width,
            height,
            metrics,
            background: self.config.background_color,
            background_opacity: self.config.background_opacity,
            text_color: self.config.text_color,
            runs,
            cursor,
        }
    }

    /// Draw the current state into `sink`
    pub fn redraw(&mut self, sink: &mut dyn RenderSink) {
        sink.draw(&self.frame());
        self.dirty = false;
    }

    /// Redraw only if something changed; returns whether it drew
    pub fn redraw_if_dirty(&mut self, sink: &mut dyn RenderSink) -> bool {
        if !self.dirty {
            return false;
        }
        self.redraw(sink);
        true
    }
}

fn intro_settings(config: &ConsoleConfig) -> IntroSettings {
    IntroSettings {
        line_delay: Duration::from_millis(config.intro_line_delay),
        keep_logo: config.keep_logo,
        skip: config.skip_intro_animation,
        ..Default::default()
    }
}
