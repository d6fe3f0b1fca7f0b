//! Text styling helpers.
//!
//! Each wrapper turns its attribute off again with the matching SGR "off"
//! code rather than a full reset, so styles can be nested.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{ConsoleError, Result};
use crate::utils::color::Rgb;
use crate::utils::escape_codes::colorize;

/// makes the text bold
pub fn bold<T: AsRef<str>>(content: T) -> String {
    format!("\x1b[1m{}\x1b[22m", content.as_ref())
}

/// makes the text dim (faint)
pub fn dim<T: AsRef<str>>(content: T) -> String {
    format!("\x1b[2m{}\x1b[22m", content.as_ref())
}

pub fn italic<T: AsRef<str>>(content: T) -> String {
    format!("\x1b[3m{}\x1b[23m", content.as_ref())
}

pub fn underline<T: AsRef<str>>(content: T) -> String {
    format!("\x1b[4m{}\x1b[24m", content.as_ref())
}

pub fn inverse<T: AsRef<str>>(content: T) -> String {
    format!("\x1b[7m{}\x1b[27m", content.as_ref())
}

pub fn strikethrough<T: AsRef<str>>(content: T) -> String {
    format!("\x1b[9m{}\x1b[29m", content.as_ref())
}

/// Colors `text` from a compact RGB spec.
///
/// The spec is a space separated `r g b` triple for the foreground,
/// optionally followed by `/` and a second triple for the background.
/// Either side may be empty: `"/ 30 30 30"` sets only the background.
///
/// ## Examples
///
/// ```
/// use biscuit_console::utils::styling::rgb_text;
///
/// let warm = rgb_text("255 100 0 / 30 30 30", "warm").unwrap();
/// assert_eq!(warm, "\x1b[38;2;255;100;0m\x1b[48;2;30;30;30mwarm\x1b[0m");
/// assert!(rgb_text("300 0 0", "nope").is_err());
/// ```
///
/// ## Errors
///
/// Returns [`ConsoleError::InvalidColorSpec`] when a non-empty side is not
/// exactly three integers in `0..=255`.
pub fn rgb_text<T: AsRef<str>>(spec: &str, text: T) -> Result<String> {
    let (fg, bg) = match spec.split_once('/') {
        Some((fg, bg)) => (fg, bg),
        None => (spec, ""),
    };
    let parse_side = |side: &str| -> Result<Option<Rgb>> {
        if side.trim().is_empty() {
            return Ok(None);
        }
        parse_triple(side)
            .map(Some)
            .ok_or_else(|| ConsoleError::InvalidColorSpec(spec.to_string()))
    };

    Ok(colorize(text, parse_side(fg)?, parse_side(bg)?))
}

fn parse_triple(side: &str) -> Option<Rgb> {
    let values: Vec<u8> = side
        .split_whitespace()
        .map(str::parse::<u8>)
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    match values.as_slice() {
        [r, g, b] => Some(Rgb::new(*r, *g, *b)),
        _ => None,
    }
}

/// A small palette of accent colors for CLI output.
#[derive(
    Debug,
    Clone,
    Copy,
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
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Accent {
    Orange,
    Tangerine,
    Yellow,
    Lime,
    Green,
    SlateBlue,
    Blue,
    Purple,
    Pink,
    Red,
}

impl Accent {
    pub const fn rgb(self) -> Rgb {
        match self {
            Accent::Orange => Rgb::new(242, 81, 29),
            Accent::Tangerine => Rgb::new(255, 147, 0),
            Accent::Yellow => Rgb::new(255, 252, 121),
            Accent::Lime => Rgb::new(15, 250, 121),
            Accent::Green => Rgb::new(0, 143, 0),
            Accent::SlateBlue => Rgb::new(63, 99, 139),
            Accent::Blue => Rgb::new(4, 51, 255),
            Accent::Purple => Rgb::new(172, 57, 255),
            Accent::Pink => Rgb::new(255, 138, 216),
            Accent::Red => Rgb::new(255, 38, 0),
        }
    }

    /// Colors `text` in this accent; `rest` follows uncolored.
    pub fn paint<T: AsRef<str>>(self, text: T, rest: &str) -> String {
        format!("{}{rest}", colorize(text, Some(self.rgb()), None))
    }
}
