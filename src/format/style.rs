//! Style directive arguments
//!
//! Styled log calls pass CSS-like declarations (`"color: red; font-weight:
//! bold"`). Only the `color` property matters for console output.

use crate::core::ColorToken;

/// Extract the `color` declaration from a style string
pub fn parse_style_color(style: &str) -> Option<ColorToken> {
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .filter(|(prop, _)| prop.trim().eq_ignore_ascii_case("color"))
        .filter_map(|(_, value)| value.trim().parse::<ColorToken>().ok())
        .last()
}
