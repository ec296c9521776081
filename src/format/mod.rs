//! Output Formatter
//!
//! Turns the heterogeneous arguments of a log call into colored text
//! entries ready for the reflow engine.
//!
//! # Rules
//!
//! - Text arguments pass through unchanged; everything else is dumped as
//!   (pretty) JSON. Values that could not be serialized degrade to a
//!   `<could not stringify>` marker listing their key names.
//! - Multiple arguments are joined with a single space.
//! - A first argument containing `%c` directives is split into fragments,
//!   each colored by the matching trailing style argument and rendered on
//!   the same row as the previous fragment.
//! - A captured stack trace becomes a separate, flagged entry so it can be
//!   hidden independently of the message.

mod style;

use serde::Serialize;
use serde_json::Value;

use crate::core::ColorToken;

pub use style::parse_style_color;

/// Marker shown in place of an argument that could not be serialized
pub const UNSTRINGIFIABLE_MARKER: &str = "<could not stringify>";

/// Directive that starts a new styled fragment
const STYLE_DIRECTIVE: &str = "%c";

/// One argument of a log call
#[derive(Debug, Clone, PartialEq)]
pub enum LogArg {
    /// Already-textual argument
    Text(String),
    /// Structured value, rendered as JSON
    Value(Value),
    /// A value whose serialization failed
    Unserializable {
        /// The value's own key names, if known
        keys: Vec<String>,
        reason: String,
    },
}

impl LogArg {
    /// Capture any serializable value
    ///
    /// Serialization errors are kept, not raised; the formatter renders
    /// them with the fallback marker.
    pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => LogArg::Value(value),
            Err(e) => LogArg::Unserializable {
                keys: Vec::new(),
                reason: e.to_string(),
            },
        }
    }

    /// An argument known to be unserializable, with its key names
    pub fn unserializable(keys: Vec<String>, reason: impl Into<String>) -> Self {
        LogArg::Unserializable {
            keys,
            reason: reason.into(),
        }
    }

    /// Short name of the argument's kind, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            LogArg::Text(_) => "text",
            LogArg::Value(Value::Null) => "null",
            LogArg::Value(Value::Bool(_)) => "boolean",
            LogArg::Value(Value::Number(_)) => "number",
            LogArg::Value(Value::String(_)) => "string",
            LogArg::Value(Value::Array(_)) => "array",
            LogArg::Value(Value::Object(_)) => "object",
            LogArg::Unserializable { .. } => "unserializable value",
        }
    }

    /// The argument's text if it is textual
    pub fn as_text(&self) -> Option<&str> {
        match self {
            LogArg::Text(text) => Some(text),
            LogArg::Value(Value::String(text)) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for LogArg {
    fn from(text: &str) -> Self {
        LogArg::Text(text.to_string())
    }
}

impl From<String> for LogArg {
    fn from(text: String) -> Self {
        LogArg::Text(text)
    }
}

impl From<Value> for LogArg {
    fn from(value: Value) -> Self {
        LogArg::Value(value)
    }
}

/// A formatted unit ready for `ReflowEngine::append`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedEntry {
    pub text: String,
    pub color: ColorToken,
    pub stack_trace: bool,
    pub same_line: bool,
}

impl FormattedEntry {
    /// A plain entry on its own row
    pub fn plain(text: String, color: ColorToken) -> Self {
        Self {
            text,
            color,
            stack_trace: false,
            same_line: false,
        }
    }
}

/// Converts log call arguments into console entries
#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    /// Indent structured values over multiple lines
    pub pretty_json: bool,
}

impl Default for Formatter {
    fn default() -> Self {
        Self { pretty_json: true }
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Format one log call
    ///
    /// Never fails: unserializable arguments degrade to a marker.
    pub fn format(
        &self,
        args: &[LogArg],
        color: ColorToken,
        stack: Option<&str>,
    ) -> Vec<FormattedEntry> {
        let mut entries = match args.first().and_then(LogArg::as_text) {
            Some(first) if first.contains(STYLE_DIRECTIVE) => {
                self.format_styled(first, &args[1..], color)
            }
            _ => vec![FormattedEntry::plain(self.join(args), color)],
        };

        if let Some(stack) = stack {
            entries.push(FormattedEntry {
                text: stack.to_string(),
                color,
                stack_trace: true,
                same_line: false,
            });
        }

        entries
    }

    /// Render a single argument as text
    pub fn stringify(&self, arg: &LogArg) -> String {
        match arg {
            LogArg::Text(text) => text.clone(),
            LogArg::Value(Value::String(text)) => text.clone(),
            LogArg::Value(value) => {
                let dumped = if self.pretty_json {
                    serde_json::to_string_pretty(value)
                } else {
                    serde_json::to_string(value)
                };
                // Value always serializes; keep the fallback anyway for symmetry
                dumped.unwrap_or_else(|e| unstringifiable(&[], &e.to_string()))
            }
            LogArg::Unserializable { keys, reason } => unstringifiable(keys, reason),
        }
    }

    fn join(&self, args: &[LogArg]) -> String {
        args.iter()
            .map(|arg| self.stringify(arg))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Split `%c` styled text into same-row fragments
    fn format_styled(
        &self,
        template: &str,
        rest: &[LogArg],
        color: ColorToken,
    ) -> Vec<FormattedEntry> {
        let segments: Vec<&str> = template.split(STYLE_DIRECTIVE).collect();
        let style_count = segments.len() - 1;
        let (styles, extra) = rest.split_at(style_count.min(rest.len()));

        let mut fragments: Vec<(String, ColorToken)> = Vec::new();
        if !segments[0].is_empty() {
            fragments.push((segments[0].to_string(), color));
        }
        for (i, segment) in segments.iter().enumerate().skip(1) {
            if segment.is_empty() {
                continue;
            }
            let fragment_color = styles
                .get(i - 1)
                .and_then(LogArg::as_text)
                .and_then(parse_style_color)
                .unwrap_or(color);
            fragments.push((segment.to_string(), fragment_color));
        }

        if !extra.is_empty() {
            let tail = format!(" {}", self.join(extra));
            match fragments.last_mut() {
                Some((text, _)) => text.push_str(&tail),
                None => fragments.push((tail.trim_start().to_string(), color)),
            }
        }

        if fragments.is_empty() {
            return vec![FormattedEntry::plain(String::new(), color)];
        }

        fragments
            .into_iter()
            .enumerate()
            .map(|(i, (text, color))| FormattedEntry {
                text,
                color,
                stack_trace: false,
                same_line: i > 0,
            })
            .collect()
    }
}

fn unstringifiable(keys: &[String], reason: &str) -> String {
    tracing::debug!(reason, "argument could not be stringified");
    format!("{} {{{}}}", UNSTRINGIFIABLE_MARKER, keys.join(", "))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use serde_json::json;

    fn texts(entries: &[FormattedEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.text.as_str()).collect()
    }

    #[test]
    fn test_joins_with_single_space() {
        let f = Formatter::new();
        let entries = f.format(
            &["hello".into(), json!(42).into(), json!(true).into()],
            ColorToken::Default,
            None,
        );
        assert_eq!(texts(&entries), vec!["hello 42 true"]);
        assert!(!entries[0].same_line);
    }

    #[test]
    fn test_structured_values_are_pretty_json() {
        let f = Formatter::new();
        let entries = f.format(&[json!({"a": 1}).into()], ColorToken::Default, None);
        assert_eq!(entries[0].text, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_json_string_is_not_quoted() {
        let f = Formatter::new();
        let entries = f.format(&[json!("plain").into()], ColorToken::Default, None);
        assert_eq!(entries[0].text, "plain");
    }

    #[test]
    fn test_serialization_failure_degrades() {
        let mut map = HashMap::new();
        map.insert((1, 2), "tuple keys cannot be JSON object keys");
        let arg = LogArg::serialize(&map);
        assert!(matches!(arg, LogArg::Unserializable { .. }));

        let f = Formatter::new();
        let entries = f.format(&[arg], ColorToken::Default, None);
        assert_eq!(entries[0].text, "<could not stringify> {}");
    }

    #[test]
    fn test_unserializable_lists_keys() {
        let f = Formatter::new();
        let arg = LogArg::unserializable(vec!["parent".into(), "child".into()], "cycle");
        assert_eq!(f.stringify(&arg), "<could not stringify> {parent, child}");
    }

    #[test]
    fn test_styled_fragments() {
        let f = Formatter::new();
        let entries = f.format(
            &["%cred%cblue".into(), "color: red".into(), "color: blue".into()],
            ColorToken::Default,
            None,
        );
        assert_eq!(texts(&entries), vec!["red", "blue"]);
        assert_eq!(entries[0].color, ColorToken::RED);
        assert_eq!(entries[1].color, ColorToken::Rgb(0, 0, 255));
        assert!(!entries[0].same_line);
        assert!(entries[1].same_line);
    }

    #[test]
    fn test_styled_prefix_and_extra_args() {
        let f = Formatter::new();
        let entries = f.format(
            &[
                "pre %cwarn".into(),
                "font-weight: bold; color: yellow".into(),
                json!(3).into(),
            ],
            ColorToken::GREEN,
            None,
        );
        assert_eq!(texts(&entries), vec!["pre ", "warn 3"]);
        assert_eq!(entries[0].color, ColorToken::GREEN);
        assert_eq!(entries[1].color, ColorToken::YELLOW);
    }

    #[test]
    fn test_styled_missing_style_uses_call_color() {
        let f = Formatter::new();
        let entries = f.format(&["%conly".into()], ColorToken::RED, None);
        assert_eq!(texts(&entries), vec!["only"]);
        assert_eq!(entries[0].color, ColorToken::RED);
    }

    #[test]
    fn test_stack_trace_is_separate_entry() {
        let f = Formatter::new();
        let entries = f.format(&["oops".into()], ColorToken::RED, Some("at main\nat start"));
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].stack_trace);
        assert!(entries[1].stack_trace);
        assert_eq!(entries[1].text, "at main\nat start");
    }

    #[test]
    fn test_empty_call_yields_empty_entry() {
        let f = Formatter::new();
        let entries = f.format(&[], ColorToken::Default, None);
        assert_eq!(texts(&entries), vec![""]);
    }
}
