//! Console Core Module
//!
//! Platform-independent console state. This module contains:
//! - Colors attached to every entry
//! - Raw history entries and their wrapped display lines
//! - Font metrics derived from font and canvas size
//! - The reflow engine and scroll state
//! - Deterministic snapshot generation
//!
//! The core is deterministic: given the same sequence of appends and metric
//! changes, it always produces the same display lines.

mod color;
mod line;
mod metrics;
mod reflow;
mod scroll;
mod snapshot;

pub use color::{ColorToken, ParseColorError};
pub use line::{unwrap_chunks, wrap_text, wrap_text_at, Chunk, DisplayLine, RawEntry};
pub use metrics::{FontMetrics, MonospaceMeasure, TextMeasure, LINE_HEIGHT_FACTOR};
pub use reflow::{ReflowEngine, Row};
pub use scroll::{ScrollController, ScrollDirection, AXIS_DEADZONE};
pub use snapshot::{CursorSnapshot, Fragment, Snapshot, ViewRow};
