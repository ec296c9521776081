//! QuickJS engine
//!
//! Commands run as global scripts in one QuickJS context that has the
//! standard built-ins and no host bindings. Top-level `let`/`const`
//! bindings persist across submissions. Memory, stack depth and run time
//! are bounded per runtime.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use rquickjs::{Context, Ctx, Runtime, Type, Value};

use super::{EvalError, ScriptEngine};

/// Longest command accepted
pub const MAX_SOURCE_LEN: usize = 4096;

/// Nesting depth past which results are not converted further
const MAX_RESULT_DEPTH: usize = 32;

/// Resource bounds for the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsLimits {
    /// Heap limit in bytes
    pub memory: usize,
    /// Native stack limit in bytes
    pub stack: usize,
    /// Wall-clock budget for one command
    pub timeout: Duration,
}

impl Default for JsLimits {
    fn default() -> Self {
        Self {
            memory: 32 * 1024 * 1024,
            stack: 512 * 1024,
            timeout: Duration::from_millis(500),
        }
    }
}

struct JsState {
    // Dropped after the context
    context: Context,
    _runtime: Runtime,
}

/// JavaScript evaluation through an embedded QuickJS runtime
///
/// The runtime is created by the first `probe`.
pub struct QuickJs {
    limits: JsLimits,
    state: Option<JsState>,
    /// Deadline of the command in flight, read by the interrupt handler
    deadline: Arc<Mutex<Option<Instant>>>,
}

impl std::fmt::Debug for QuickJs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuickJs")
            .field("limits", &self.limits)
            .field("started", &self.state.is_some())
            .finish()
    }
}

impl Default for QuickJs {
    fn default() -> Self {
        Self::new(JsLimits::default())
    }
}

impl QuickJs {
    pub fn new(limits: JsLimits) -> Self {
        Self {
            limits,
            state: None,
            deadline: Arc::new(Mutex::new(None)),
        }
    }

    fn start(&mut self) -> Result<&JsState, EvalError> {
        if self.state.is_none() {
            let runtime = Runtime::new().map_err(|e| {
                tracing::debug!("failed to create QuickJS runtime: {}", e);
                EvalError::Unavailable
            })?;
            runtime.set_memory_limit(self.limits.memory);
            runtime.set_max_stack_size(self.limits.stack);

            let deadline = self.deadline.clone();
            runtime.set_interrupt_handler(Some(Box::new(move || {
                deadline
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_some_and(|at| Instant::now() >= at)
            })));

            let context = Context::full(&runtime).map_err(|e| {
                tracing::debug!("failed to create QuickJS context: {}", e);
                EvalError::Unavailable
            })?;
            self.state = Some(JsState {
                context,
                _runtime: runtime,
            });
        }
        self.state.as_ref().ok_or(EvalError::Unavailable)
    }

    fn set_deadline(&self, deadline: Option<Instant>) {
        *self.deadline.lock().unwrap_or_else(PoisonError::into_inner) = deadline;
    }
}

impl ScriptEngine for QuickJs {
    fn name(&self) -> &str {
        "quickjs"
    }

    fn probe(&mut self) -> Result<(), EvalError> {
        self.start()?;
        match self.eval("1+1")? {
            Some(value) if value == serde_json::json!(2) => Ok(()),
            other => {
                tracing::debug!(?other, "QuickJS probe returned an unexpected value");
                Err(EvalError::Unavailable)
            }
        }
    }

    fn eval(&mut self, source: &str) -> Result<Option<serde_json::Value>, EvalError> {
        if source.len() > MAX_SOURCE_LEN {
            return Err(EvalError::Limit(format!(
                "command longer than {} bytes",
                MAX_SOURCE_LEN
            )));
        }
        let Some(state) = self.state.as_ref() else {
            return Err(EvalError::Unavailable);
        };

        self.set_deadline(Some(Instant::now() + self.limits.timeout));
        let result = state.context.with(|ctx| {
            match ctx.eval::<Value, _>(source) {
                Ok(value) if value.is_undefined() => Ok(None),
                Ok(value) => Ok(Some(js_to_json(&value, 0))),
                Err(rquickjs::Error::Exception) => Err(caught_error(&ctx)),
                Err(e) => Err(EvalError::Runtime(format!("InternalError: {}", e))),
            }
        });
        self.set_deadline(None);
        result
    }
}

/// Turn the pending exception into an `EvalError`
fn caught_error(ctx: &Ctx<'_>) -> EvalError {
    let exc = ctx.catch();
    let Some(obj) = exc.as_object() else {
        return EvalError::Runtime(format!("Uncaught {}", display(&exc)));
    };

    let name: String = obj.get("name").unwrap_or_else(|_| "Error".to_string());
    let message: String = obj.get("message").unwrap_or_default();
    match name.as_str() {
        "SyntaxError" => EvalError::Syntax(message),
        "InternalError" | "RangeError" if is_resource_limit(&message) => EvalError::Limit(message),
        _ if message.is_empty() => EvalError::Runtime(name),
        _ => EvalError::Runtime(format!("{}: {}", name, message)),
    }
}

/// Interrupts, heap exhaustion and stack overflow
fn is_resource_limit(message: &str) -> bool {
    ["interrupted", "out of memory", "stack overflow", "call stack size"]
        .iter()
        .any(|needle| message.contains(needle))
}

/// Text form of a thrown non-object value
fn display(value: &Value<'_>) -> String {
    match js_to_json(value, 0) {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Convert a QuickJS value to JSON
///
/// Non-finite numbers become their JavaScript names and functions a
/// placeholder. Nesting past `MAX_RESULT_DEPTH` (cycles included) is cut.
fn js_to_json(val: &Value<'_>, depth: usize) -> serde_json::Value {
    use serde_json::Value as Json;

    if depth > MAX_RESULT_DEPTH {
        return Json::String("[...]".to_string());
    }
    match val.type_of() {
        Type::Null | Type::Undefined | Type::Uninitialized => Json::Null,
        Type::Bool => val.as_bool().map(Json::Bool).unwrap_or(Json::Null),
        Type::Int => val
            .as_int()
            .map(|n| Json::Number(n.into()))
            .unwrap_or(Json::Null),
        Type::Float => match val.as_float() {
            Some(f) if f.is_nan() => Json::String("NaN".to_string()),
            Some(f) if f.is_infinite() => {
                Json::String(if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string())
            }
            // Integral floats print without a fraction, like JavaScript
            Some(f) if f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 => {
                Json::Number((f as i64).into())
            }
            Some(f) => serde_json::Number::from_f64(f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            None => Json::Null,
        },
        Type::String => val
            .as_string()
            .and_then(|s| s.to_string().ok())
            .map(Json::String)
            .unwrap_or(Json::Null),
        Type::Array => match val.as_array() {
            Some(arr) => Json::Array(
                arr.iter::<Value>()
                    .filter_map(|item| item.ok())
                    .map(|item| js_to_json(&item, depth + 1))
                    .collect(),
            ),
            None => Json::Null,
        },
        Type::Function | Type::Constructor => Json::String("[function]".to_string()),
        Type::Object | Type::Exception => match val.as_object() {
            Some(obj) => {
                let mut map = serde_json::Map::new();
                for key in obj.keys::<String>().flatten() {
                    if let Ok(v) = obj.get::<_, Value>(key.as_str()) {
                        map.insert(key, js_to_json(&v, depth + 1));
                    }
                }
                Json::Object(map)
            }
            None => Json::Null,
        },
        other => Json::String(format!("[{:?}]", other).to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine() -> QuickJs {
        let mut js = QuickJs::default();
        js.probe().unwrap();
        js
    }

    #[test]
    fn test_probe_starts_runtime() {
        let mut js = QuickJs::default();
        assert_eq!(js.eval("1"), Err(EvalError::Unavailable));
        js.probe().unwrap();
        assert_eq!(js.eval("1").unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_values_convert_to_json() {
        let mut js = engine();
        assert_eq!(js.eval("2+2").unwrap(), Some(json!(4)));
        assert_eq!(js.eval("0.5 * 3").unwrap(), Some(json!(1.5)));
        assert_eq!(js.eval("'a' + 'b'").unwrap(), Some(json!("ab")));
        assert_eq!(js.eval("[1, [true, null]]").unwrap(), Some(json!([1, [true, null]])));
        assert_eq!(js.eval("({a: 1, b: 'x'})").unwrap(), Some(json!({"a": 1, "b": "x"})));
        assert_eq!(js.eval("0/0").unwrap(), Some(json!("NaN")));
        assert_eq!(js.eval("Math.max").unwrap(), Some(json!("[function]")));
    }

    #[test]
    fn test_undefined_is_no_value() {
        let mut js = engine();
        assert_eq!(js.eval("let x = 1").unwrap(), None);
        assert_eq!(js.eval("undefined").unwrap(), None);
        assert_eq!(js.eval("x + 1").unwrap(), Some(json!(2)));
    }

    #[test]
    fn test_errors_are_classified() {
        let mut js = engine();
        assert!(matches!(js.eval("2 +"), Err(EvalError::Syntax(_))));
        let err = js.eval("missing").unwrap_err();
        assert!(err.to_string().starts_with("ReferenceError: "), "{}", err);
        assert!(err.to_string().contains("missing"));
        assert_eq!(
            js.eval("throw 'plain'").unwrap_err(),
            EvalError::Runtime("Uncaught plain".to_string())
        );
        // Still usable afterwards
        assert_eq!(js.eval("3").unwrap(), Some(json!(3)));
    }

    #[test]
    fn test_runaway_loop_is_interrupted() {
        let mut js = QuickJs::new(JsLimits {
            timeout: Duration::from_millis(50),
            ..Default::default()
        });
        js.probe().unwrap();
        assert!(matches!(js.eval("while (true) {}"), Err(EvalError::Limit(_))));
        assert_eq!(js.eval("1 + 1").unwrap(), Some(json!(2)));
    }

    #[test]
    fn test_deep_recursion_is_a_limit() {
        let mut js = engine();
        let err = js.eval("function f(n) { return f(n + 1) + 1; } f(0)").unwrap_err();
        assert!(matches!(err, EvalError::Limit(_)), "{:?}", err);
        assert_eq!(js.eval("2").unwrap(), Some(json!(2)));
    }

    #[test]
    fn test_cyclic_result_is_cut() {
        let mut js = engine();
        let value = js.eval("const o = {}; o.self = o; o").unwrap().unwrap();
        assert!(value.to_string().contains("[...]"));
    }

    #[test]
    fn test_long_source_rejected() {
        let mut js = engine();
        let source = "1+".repeat(MAX_SOURCE_LEN);
        assert!(matches!(js.eval(&source), Err(EvalError::Limit(_))));
    }

    #[test]
    fn test_no_host_bindings() {
        let mut js = engine();
        assert_eq!(js.eval("typeof require").unwrap(), Some(json!("undefined")));
        assert_eq!(js.eval("typeof process").unwrap(), Some(json!("undefined")));
    }
}
