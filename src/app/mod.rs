//! Application glue module
//!
//! Configuration loaded from the host's options object.

mod config;

pub use config::{ConfigError, ConsoleConfig, MAX_FONT_SIZE};
