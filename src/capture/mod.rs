//! Log Capture
//!
//! Routes log output into the console without taking it away from anyone
//! else. Hosts opt in through one of two doors:
//!
//! - `CaptureHandle::log`, an explicit sink for calls the host routes
//!   itself
//! - `CaptureLayer`, a `tracing_subscriber::Layer` composed next to the
//!   host's own layers; it observes events and never filters them
//!
//! Captured calls are queued in call order and drained by the console on
//! its next tick. A process-wide panic hook (installed at most once) feeds
//! panics into every live handle.

mod layer;
mod level;
mod panic;

use std::backtrace::Backtrace;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::ColorToken;
use crate::format::LogArg;

pub use layer::CaptureLayer;
pub use level::{LogLevel, ParseLevelError};
pub use panic::install_panic_hook;

/// One intercepted log call
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedCall {
    pub level: LogLevel,
    pub args: Vec<LogArg>,
    pub color: ColorToken,
    /// Stack text, present for levels configured to capture one
    pub stack: Option<String>,
}

/// Which levels are captured, their colors, and which get stack traces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRules {
    pub levels: Vec<(LogLevel, ColorToken)>,
    pub stack_trace_for: Vec<LogLevel>,
}

impl Default for CaptureRules {
    fn default() -> Self {
        Self {
            levels: vec![
                (LogLevel::Log, ColorToken::Default),
                (LogLevel::Warn, ColorToken::YELLOW),
                (LogLevel::Error, ColorToken::RED),
            ],
            stack_trace_for: vec![LogLevel::Error],
        }
    }
}

impl CaptureRules {
    /// Color for a level, or `None` if the level is not captured
    pub fn color_for(&self, level: LogLevel) -> Option<ColorToken> {
        self.levels
            .iter()
            .find(|(l, _)| *l == level)
            .map(|(_, color)| *color)
    }

    pub fn wants_stack(&self, level: LogLevel) -> bool {
        self.stack_trace_for.contains(&level)
    }
}

#[derive(Debug)]
struct Shared {
    queue: Mutex<VecDeque<CapturedCall>>,
    rules: Mutex<CaptureRules>,
    active: AtomicBool,
    /// Token of the one layer allowed to forward events
    layer_token: AtomicU64,
}

/// Shared, cloneable entry point into a console's capture queue
#[derive(Debug, Clone)]
pub struct CaptureHandle {
    shared: Arc<Shared>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CaptureHandle {
    /// Create an active handle with the given rules
    pub fn new(rules: CaptureRules) -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(VecDeque::new()),
                rules: Mutex::new(rules),
                active: AtomicBool::new(true),
                layer_token: AtomicU64::new(0),
            }),
        }
    }

    /// Capture a log call; a no-op for inactive handles or uncaptured levels
    pub fn log(&self, level: LogLevel, args: Vec<LogArg>) {
        self.capture(level, args, None);
    }

    /// Capture with an extra stack prefix (the tracing callsite)
    pub(crate) fn capture(&self, level: LogLevel, args: Vec<LogArg>, callsite: Option<String>) {
        if !self.is_active() {
            return;
        }
        let (color, wants_stack) = {
            let rules = lock(&self.shared.rules);
            match rules.color_for(level) {
                Some(color) => (color, rules.wants_stack(level)),
                None => return,
            }
        };

        let stack = wants_stack.then(|| {
            let trace = Backtrace::force_capture().to_string();
            match callsite {
                Some(site) => format!("{}\n{}", site, trace),
                None => trace,
            }
        });

        self.push(CapturedCall {
            level,
            args,
            color,
            stack,
        });
    }

    /// Report an uncaught failure (panic) into the error pipeline
    pub fn report_error(&self, message: String, stack: Option<String>) {
        if !self.is_active() {
            return;
        }
        let color = lock(&self.shared.rules)
            .color_for(LogLevel::Error)
            .unwrap_or(ColorToken::RED);
        self.push(CapturedCall {
            level: LogLevel::Error,
            args: vec![LogArg::Text(message)],
            color,
            stack,
        });
    }

    fn push(&self, call: CapturedCall) {
        lock(&self.shared.queue).push_back(call);
    }

    /// Take every queued call, oldest first
    pub fn drain(&self) -> Vec<CapturedCall> {
        lock(&self.shared.queue).drain(..).collect()
    }

    /// Number of calls waiting to be drained
    pub fn pending(&self) -> usize {
        lock(&self.shared.queue).len()
    }

    pub fn set_active(&self, active: bool) {
        self.shared.active.store(active, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    pub fn set_rules(&self, rules: CaptureRules) {
        *lock(&self.shared.rules) = rules;
    }

    pub fn rules(&self) -> CaptureRules {
        lock(&self.shared.rules).clone()
    }

    /// Build the tracing layer for this handle
    ///
    /// Only the most recently built layer forwards events, so registering
    /// again never double-logs.
    pub fn layer(&self) -> CaptureLayer {
        let token = self.shared.layer_token.fetch_add(1, Ordering::SeqCst) + 1;
        CaptureLayer::new(self.clone(), token)
    }

    fn is_current_layer(&self, token: u64) -> bool {
        self.shared.layer_token.load(Ordering::SeqCst) == token
    }

    fn same_as(&self, other: &Arc<Shared>) -> bool {
        Arc::ptr_eq(&self.shared, other)
    }
}

impl Default for CaptureHandle {
    fn default() -> Self {
        Self::new(CaptureRules::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_queues_in_order() {
        let handle = CaptureHandle::default();
        handle.log(LogLevel::Log, vec!["one".into()]);
        handle.log(LogLevel::Warn, vec!["two".into()]);
        let calls = handle.drain();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args, vec![LogArg::from("one")]);
        assert_eq!(calls[1].color, ColorToken::YELLOW);
        assert_eq!(handle.pending(), 0);
    }

    #[test]
    fn test_uncaptured_level_is_ignored() {
        let handle = CaptureHandle::default();
        handle.log(LogLevel::Debug, vec!["quiet".into()]);
        assert_eq!(handle.pending(), 0);
    }

    #[test]
    fn test_inactive_handle_drops_calls() {
        let handle = CaptureHandle::default();
        handle.set_active(false);
        handle.log(LogLevel::Error, vec!["lost".into()]);
        handle.report_error("also lost".into(), None);
        assert_eq!(handle.pending(), 0);
    }

    #[test]
    fn test_error_level_gets_stack() {
        let handle = CaptureHandle::default();
        handle.log(LogLevel::Error, vec!["bad".into()]);
        handle.log(LogLevel::Log, vec!["fine".into()]);
        let calls = handle.drain();
        assert!(calls[0].stack.is_some());
        assert!(calls[1].stack.is_none());
    }

    #[test]
    fn test_report_error_uses_error_color() {
        let handle = CaptureHandle::default();
        handle.report_error("panicked".into(), Some("trace".into()));
        let calls = handle.drain();
        assert_eq!(calls[0].level, LogLevel::Error);
        assert_eq!(calls[0].color, ColorToken::RED);
    }
}
