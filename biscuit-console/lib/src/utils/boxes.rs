//! Box drawing around text.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use unicode_width::UnicodeWidthStr;

use crate::utils::escape_codes::strip_control_sequences;

/// Border characters for a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxChars {
    pub horizontal: char,
    pub vertical: char,
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum BoxStyle {
    /// `+-|` only, for terminals without box drawing glyphs
    Ascii,
    #[default]
    Single,
    Heavy,
    Double,
    Rounded,
}

impl BoxStyle {
    pub const fn chars(self) -> BoxChars {
        let (horizontal, vertical, top_left, top_right, bottom_left, bottom_right) = match self {
            BoxStyle::Ascii => ('-', '|', '+', '+', '+', '+'),
            BoxStyle::Single => ('─', '│', '┌', '┐', '└', '┘'),
            BoxStyle::Heavy => ('━', '┃', '┏', '┓', '┗', '┛'),
            BoxStyle::Double => ('═', '║', '╔', '╗', '╚', '╝'),
            BoxStyle::Rounded => ('─', '│', '╭', '╮', '╰', '╯'),
        };
        BoxChars {
            horizontal,
            vertical,
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }
}

/// Draws a box around `content` with one space of padding on each side.
///
/// Multi-line content gets one row per line, padded to the widest line.
/// Widths are measured on screen: escape codes take no room and wide
/// characters take two columns.
///
/// ## Examples
///
/// ```
/// use biscuit_console::utils::boxes::{boxed, BoxStyle};
///
/// assert_eq!(boxed("Hi", BoxStyle::Ascii), "+----+\n| Hi |\n+----+");
/// ```
pub fn boxed<T: AsRef<str>>(content: T, style: BoxStyle) -> String {
    let c = style.chars();
    let lines: Vec<&str> = content.as_ref().split('\n').collect();
    let widths: Vec<usize> = lines
        .iter()
        .map(|line| strip_control_sequences(line).width())
        .collect();
    let inner = widths.iter().copied().max().unwrap_or(0);

    let horizontal: String = std::iter::repeat_n(c.horizontal, inner + 2).collect();
    let mut out = Vec::with_capacity(lines.len() + 2);
    out.push(format!("{}{horizontal}{}", c.top_left, c.top_right));
    for (line, width) in lines.iter().zip(widths) {
        let pad = " ".repeat(inner - width);
        out.push(format!("{v} {line}{pad} {v}", v = c.vertical));
    }
    out.push(format!("{}{horizontal}{}", c.bottom_left, c.bottom_right));
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_single_box() {
        assert_eq!(
            boxed("Host Detection", BoxStyle::Single),
            "┌────────────────┐\n│ Host Detection │\n└────────────────┘"
        );
    }

    #[test]
    fn test_each_style_uses_its_corners() {
        let rounded = boxed("x", BoxStyle::Rounded);
        assert!(rounded.starts_with('╭') && rounded.ends_with('╯'));
        let double = boxed("x", BoxStyle::Double);
        assert!(double.starts_with('╔') && double.ends_with('╝'));
        let heavy = boxed("x", BoxStyle::Heavy);
        assert!(heavy.starts_with('┏') && heavy.ends_with('┛'));
    }

    #[test]
    fn test_multiline_pads_to_widest() {
        assert_eq!(
            boxed("a\nabc", BoxStyle::Ascii),
            "+-----+\n| a   |\n| abc |\n+-----+"
        );
    }

    #[test]
    fn test_escape_codes_take_no_width() {
        let boxed_text = boxed("\x1b[1mhi\x1b[22m", BoxStyle::Ascii);
        assert_eq!(boxed_text, "+----+\n| \x1b[1mhi\x1b[22m |\n+----+");
    }

    #[test]
    fn test_wide_characters() {
        let out = boxed("日本", BoxStyle::Ascii);
        assert_eq!(out.lines().next(), Some("+------+"));
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(boxed("", BoxStyle::Ascii), "+--+\n|  |\n+--+");
    }

    #[test]
    fn test_style_parse() {
        assert_eq!(BoxStyle::from_str("Rounded").unwrap(), BoxStyle::Rounded);
        assert_eq!(BoxStyle::default(), BoxStyle::Single);
        assert_eq!(BoxStyle::Heavy.to_string(), "heavy");
    }
}
