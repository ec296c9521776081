//! Tracing layer that mirrors events into a console
//!
//! The layer only observes: `enabled` always returns true and nothing is
//! filtered, so the host's other layers keep their default behavior.
//! Events from this crate's own modules are not mirrored; they would
//! otherwise land back in the console they describe.

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Metadata, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::format::LogArg;

use super::{CaptureHandle, LogLevel};

/// Target prefix of events emitted by this crate
const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

fn is_own_target(target: &str) -> bool {
    target
        .strip_prefix(OWN_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// Custom tracing layer that captures events to a console
pub struct CaptureLayer {
    handle: CaptureHandle,
    token: u64,
}

impl CaptureLayer {
    pub(super) fn new(handle: CaptureHandle, token: u64) -> Self {
        Self { handle, token }
    }
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        // A newer layer for the same handle supersedes this one
        if !self.handle.is_current_layer(self.token) {
            return;
        }

        let metadata = event.metadata();
        if is_own_target(metadata.target()) {
            return;
        }
        let level = LogLevel::from(metadata.level());

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut args = Vec::with_capacity(2);
        if let Some(message) = visitor.message {
            args.push(LogArg::Text(message));
        }
        if !visitor.fields.is_empty() {
            args.push(LogArg::Value(Value::Object(visitor.fields)));
        }

        let callsite = match (metadata.file(), metadata.line()) {
            (Some(file), Some(line)) => format!("at {}:{} ({})", file, line, metadata.target()),
            _ => format!("at {}", metadata.target()),
        };

        self.handle.capture(level, args, Some(callsite));
    }

    fn enabled(&self, _metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        // Never filter - capture must not suppress other output
        true
    }
}

/// Collects the message and structured fields of an event
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field, Value::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.insert(field, Value::from(format!("{:?}", value)));
        }
    }
}
