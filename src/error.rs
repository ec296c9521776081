//! Console error type

use crate::app::ConfigError;
use crate::input::StoreError;

/// Errors surfaced to the host
///
/// Formatting and evaluation failures never show up here; they are turned
/// into console output instead.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Non-text payload handed straight to the reflow engine
    #[error("reflow engine accepts text only, got {kind}")]
    InvalidInputKind { kind: &'static str },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("history store error: {0}")]
    Store(#[from] StoreError),
}
