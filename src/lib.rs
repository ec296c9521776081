//! Mochi Console Library
//!
//! A virtual console that captures log output, wraps it to a fixed-width
//! grid and renders a scrollable window of it onto a pixel buffer. This
//! crate provides:
//!
//! - `core`: Colors, raw entries, display lines, font metrics, reflow and scroll state
//! - `format`: Turning log call arguments into colored console entries
//! - `capture`: Explicit log sink, tracing layer and panic hook
//! - `input`: Keys, the command line state machine and persisted command history
//! - `eval`: JavaScript evaluation of submitted commands in an embedded QuickJS context
//! - `intro`: Banner animation, gradient colors and demo mode
//! - `renderer`: Frames, the render sink trait and a software renderer
//! - `console`: The `Console` tying all of the above together

pub mod app;
pub mod capture;
pub mod console;
pub mod core;
pub mod error;
pub mod eval;
pub mod format;
pub mod input;
pub mod intro;
pub mod renderer;

pub use app::{ConfigError, ConsoleConfig};
pub use capture::{CaptureHandle, CaptureLayer, LogLevel};
pub use console::Console;
pub use core::{ColorToken, ScrollDirection, Snapshot};
pub use error::ConsoleError;
pub use format::LogArg;
pub use input::Key;
pub use renderer::{Frame, RenderSink, SoftwareRenderer};
