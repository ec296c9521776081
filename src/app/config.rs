//! Configuration for the console
//!
//! Option names are camelCase so host configuration objects load verbatim.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::capture::{CaptureRules, LogLevel};
use crate::core::ColorToken;

/// Largest accepted font size in pixels
pub const MAX_FONT_SIZE: f32 = 4096.0;

/// Console configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleConfig {
    /// Font size in pixels
    pub font_size: f32,
    /// Font family name
    pub font_family: String,
    pub text_color: ColorToken,
    pub background_color: ColorToken,
    /// Background alpha used when clearing the surface (0.0 - 1.0)
    pub background_opacity: f32,
    /// Canvas width in pixels
    pub canvas_width: u32,
    /// Canvas height in pixels
    pub canvas_height: u32,
    /// Multiplies the canvas size when set
    pub pixel_ratio_override: Option<f32>,
    /// Maximum raw history entries
    pub history: usize,
    /// Levels routed into the console
    pub capture_console: Vec<LogLevel>,
    /// One color per entry of `capture_console`
    pub capture_console_colors: Vec<ColorToken>,
    /// Levels that get a stack trace entry
    pub capture_stack_trace_for: Vec<LogLevel>,
    pub show_stack_traces: bool,
    /// Whether capture starts switched on
    pub capture_console_active: bool,
    /// Install the process-wide panic hook
    pub capture_panics: bool,
    pub skip_intro_animation: bool,
    /// Delay between banner lines in milliseconds
    pub intro_line_delay: u64,
    /// Keep the banner after the intro
    pub keep_logo: bool,
    pub demo: bool,
    /// Demo line period in milliseconds
    pub demo_interval: u64,
    /// Enable the command line
    pub keyboard_events_input: bool,
    pub thumbstick_scrolling: bool,
    /// Color of evaluation results
    pub return_color: ColorToken,
    /// Color of evaluation errors
    pub error_color: ColorToken,
    /// Color of echoed commands and the command line
    pub command_color: ColorToken,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            font_size: 18.0,
            font_family: "monospace".to_string(),
            text_color: ColorToken::GREEN,
            background_color: ColorToken::BLACK,
            background_opacity: 0.9,
            canvas_width: 1080,
            canvas_height: 1920,
            pixel_ratio_override: None,
            history: 2000,
            capture_console: vec![LogLevel::Log, LogLevel::Warn, LogLevel::Error],
            capture_console_colors: vec![
                ColorToken::Default,
                ColorToken::YELLOW,
                ColorToken::RED,
            ],
            capture_stack_trace_for: vec![LogLevel::Error],
            show_stack_traces: false,
            capture_console_active: true,
            capture_panics: true,
            skip_intro_animation: false,
            intro_line_delay: 75,
            keep_logo: false,
            demo: false,
            demo_interval: 1000,
            keyboard_events_input: false,
            thumbstick_scrolling: false,
            return_color: ColorToken::CYAN,
            error_color: ColorToken::RED,
            command_color: ColorToken::WHITE,
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate a JSON configuration object
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ConsoleConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the console cannot lay out
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.font_size.is_finite() || self.font_size <= 0.0 || self.font_size > MAX_FONT_SIZE {
            return Err(ConfigError::Invalid(format!(
                "fontSize must be within (0, {}], got {}",
                MAX_FONT_SIZE, self.font_size
            )));
        }
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "canvas must be non-empty, got {}x{}",
                self.canvas_width, self.canvas_height
            )));
        }
        if let Some(ratio) = self.pixel_ratio_override {
            if !ratio.is_finite() || ratio <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "pixelRatioOverride must be positive, got {}",
                    ratio
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.background_opacity) {
            return Err(ConfigError::Invalid(format!(
                "backgroundOpacity must be within 0..=1, got {}",
                self.background_opacity
            )));
        }
        if self.capture_console_colors.len() > self.capture_console.len() {
            return Err(ConfigError::Invalid(format!(
                "{} capture colors for {} captured levels",
                self.capture_console_colors.len(),
                self.capture_console.len()
            )));
        }
        Ok(())
    }

    /// Canvas size after applying the pixel ratio
    pub fn canvas_size(&self) -> (u32, u32) {
        let ratio = self.pixel_ratio_override.unwrap_or(1.0);
        let scale = |extent: u32| ((extent as f32 * ratio).round() as u32).max(1);
        (scale(self.canvas_width), scale(self.canvas_height))
    }

    /// Capture rules for the configured levels
    ///
    /// Levels without a color entry use the default text color.
    pub fn capture_rules(&self) -> CaptureRules {
        CaptureRules {
            levels: self
                .capture_console
                .iter()
                .enumerate()
                .map(|(i, level)| {
                    let color = self
                        .capture_console_colors
                        .get(i)
                        .copied()
                        .unwrap_or_default();
                    (*level, color)
                })
                .collect(),
            stack_trace_for: self.capture_stack_trace_for.clone(),
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
