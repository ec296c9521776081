//! Console colors
//!
//! Every piece of console output carries a `ColorToken`. Tokens are parsed
//! from the CSS-like strings hosts put in their configuration (`"green"`,
//! `"#ff0"`, `"rgb(255, 128, 0)"`) and resolved to RGB when drawn.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Color of a console entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColorToken {
    /// The console's configured text color
    #[default]
    Default,
    /// 24-bit RGB color
    Rgb(u8, u8, u8),
}

/// CSS named colors understood by the parser
const NAMED_COLORS: &[(&str, (u8, u8, u8))] = &[
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("red", (255, 0, 0)),
    ("green", (0, 128, 0)),
    ("lime", (0, 255, 0)),
    ("blue", (0, 0, 255)),
    ("yellow", (255, 255, 0)),
    ("cyan", (0, 255, 255)),
    ("aqua", (0, 255, 255)),
    ("magenta", (255, 0, 255)),
    ("fuchsia", (255, 0, 255)),
    ("orange", (255, 165, 0)),
    ("purple", (128, 0, 128)),
    ("violet", (238, 130, 238)),
    ("indigo", (75, 0, 130)),
    ("pink", (255, 192, 203)),
    ("brown", (165, 42, 42)),
    ("gold", (255, 215, 0)),
    ("gray", (128, 128, 128)),
    ("grey", (128, 128, 128)),
    ("silver", (192, 192, 192)),
    ("navy", (0, 0, 128)),
    ("teal", (0, 128, 128)),
    ("maroon", (128, 0, 0)),
    ("olive", (128, 128, 0)),
];

impl ColorToken {
    pub const BLACK: ColorToken = ColorToken::Rgb(0, 0, 0);
    pub const WHITE: ColorToken = ColorToken::Rgb(255, 255, 255);
    pub const RED: ColorToken = ColorToken::Rgb(255, 0, 0);
    pub const GREEN: ColorToken = ColorToken::Rgb(0, 128, 0);
    pub const YELLOW: ColorToken = ColorToken::Rgb(255, 255, 0);
    pub const CYAN: ColorToken = ColorToken::Rgb(0, 255, 255);
    pub const GRAY: ColorToken = ColorToken::Rgb(128, 128, 128);

    /// Resolve to RGB, substituting `fallback` for `Default`
    pub fn to_rgb(self, fallback: (u8, u8, u8)) -> (u8, u8, u8) {
        match self {
            ColorToken::Default => fallback,
            ColorToken::Rgb(r, g, b) => (r, g, b),
        }
    }

    /// Replace `Default` with a concrete color
    pub fn or(self, other: ColorToken) -> ColorToken {
        match self {
            ColorToken::Default => other,
            color => color,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, ColorToken::Default)
    }
}

/// Error returned for strings that are not recognized colors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized color: {0:?}")]
pub struct ParseColorError(pub String);

impl FromStr for ColorToken {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();

        if lower.is_empty() || lower == "default" || lower == "null" || lower == "inherit" {
            return Ok(ColorToken::Default);
        }

        if let Some(hex) = lower.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ParseColorError(trimmed.to_string()));
        }

        if let Some(args) = lower
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_rgb_args(args).ok_or_else(|| ParseColorError(trimmed.to_string()));
        }

        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, (r, g, b))| ColorToken::Rgb(*r, *g, *b))
            .ok_or_else(|| ParseColorError(trimmed.to_string()))
    }
}

fn parse_hex(hex: &str) -> Option<ColorToken> {
    let digit = |c: char| c.to_digit(16).map(|d| d as u8);
    let chars: Vec<char> = hex.chars().collect();
    match chars.len() {
        3 => {
            let r = digit(chars[0])?;
            let g = digit(chars[1])?;
            let b = digit(chars[2])?;
            Some(ColorToken::Rgb(r * 17, g * 17, b * 17))
        }
        6 => {
            let byte = |i: usize| Some(digit(chars[i])? * 16 + digit(chars[i + 1])?);
            Some(ColorToken::Rgb(byte(0)?, byte(2)?, byte(4)?))
        }
        _ => None,
    }
}

fn parse_rgb_args(args: &str) -> Option<ColorToken> {
    let parts: Vec<u8> = args
        .split(',')
        .map(|p| p.trim().parse::<u8>().ok())
        .collect::<Option<Vec<_>>>()?;
    match parts.as_slice() {
        [r, g, b] => Some(ColorToken::Rgb(*r, *g, *b)),
        _ => None,
    }
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorToken::Default => write!(f, "default"),
            ColorToken::Rgb(r, g, b) => write!(f, "#{:02x}{:02x}{:02x}", r, g, b),
        }
    }
}

impl TryFrom<String> for ColorToken {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColorToken> for String {
    fn from(color: ColorToken) -> Self {
        color.to_string()
    }
}
