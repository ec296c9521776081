//! Command Evaluation
//!
//! Submitted commands run inside a `ScriptEngine`. The engine is probed
//! once; when the probe fails every later submission short-circuits with
//! `EvalError::Unavailable` instead of attempting execution.
//!
//! Engines:
//! - `QuickJs`: JavaScript in an embedded QuickJS context with no host bindings
//! - `Disabled`: always unavailable, for hosts that forbid evaluation

mod quickjs;

use serde_json::Value;

pub use quickjs::{JsLimits, QuickJs, MAX_SOURCE_LEN};

/// Evaluation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("SyntaxError: {0}")]
    Syntax(String),
    #[error("{0}")]
    Runtime(String),
    #[error("EvalError: evaluation forbidden in this environment")]
    Unavailable,
    #[error("RangeError: {0}")]
    Limit(String),
}

/// A capability-gated script runtime
pub trait ScriptEngine {
    /// Short engine name for diagnostics
    fn name(&self) -> &str;

    /// Check that the engine can evaluate at all
    fn probe(&mut self) -> Result<(), EvalError>;

    /// Run `source`; `Ok(None)` is the "no value" result
    fn eval(&mut self, source: &str) -> Result<Option<Value>, EvalError>;
}

/// Engine for hosts where dynamic evaluation is not allowed
#[derive(Debug, Default, Clone, Copy)]
pub struct Disabled;

impl ScriptEngine for Disabled {
    fn name(&self) -> &str {
        "disabled"
    }

    fn probe(&mut self) -> Result<(), EvalError> {
        Err(EvalError::Unavailable)
    }

    fn eval(&mut self, _source: &str) -> Result<Option<Value>, EvalError> {
        Err(EvalError::Unavailable)
    }
}

/// Result of running one command
#[derive(Debug, Clone, PartialEq)]
pub enum EvalOutcome {
    /// A value to print in the return-value color
    Value(Value),
    /// The "no value" sentinel; nothing is printed
    NoValue,
    /// An error to print in the error color
    Failed(EvalError),
}

/// Runs commands through an engine, probing it once
pub struct Evaluator {
    engine: Box<dyn ScriptEngine>,
    /// Cached probe result
    available: Option<bool>,
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("engine", &self.engine.name())
            .field("available", &self.available)
            .finish()
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(Box::new(QuickJs::default()))
    }
}

impl Evaluator {
    pub fn new(engine: Box<dyn ScriptEngine>) -> Self {
        Self {
            engine,
            available: None,
        }
    }

    /// Evaluator that refuses every command
    pub fn disabled() -> Self {
        Self::new(Box::new(Disabled))
    }

    /// Whether the engine passed its probe; probes on first call only
    pub fn is_available(&mut self) -> bool {
        if let Some(available) = self.available {
            return available;
        }
        let available = match self.engine.probe() {
            Ok(()) => {
                tracing::debug!(engine = self.engine.name(), "evaluation available");
                true
            }
            Err(e) => {
                tracing::debug!(engine = self.engine.name(), "evaluation unavailable: {}", e);
                false
            }
        };
        self.available = Some(available);
        available
    }

    /// Run one command; never fails outward
    pub fn run(&mut self, command: &str) -> EvalOutcome {
        if !self.is_available() {
            return EvalOutcome::Failed(EvalError::Unavailable);
        }
        match self.engine.eval(command) {
            Ok(Some(value)) => EvalOutcome::Value(value),
            Ok(None) => EvalOutcome::NoValue,
            Err(e) => {
                tracing::debug!(command, "evaluation failed: {}", e);
                EvalOutcome::Failed(e)
            }
        }
    }
}
