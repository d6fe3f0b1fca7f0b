//! Building and taking apart terminal escape sequences.
//!
//! Nothing here performs I/O: these are pure string functions used by the
//! detectors (to parse probe responses) and by the formatting helpers (to
//! build colored text and hyperlinks).

use std::sync::LazyLock;

use regex::Regex;

use crate::utils::color::{Rgb, Rgb16};

/// The escape character.
pub const ESC: &str = "\x1b";
/// String Terminator (`ESC \`).
pub const ST: &str = "\x1b\\";
/// Bell, the alternative OSC terminator.
pub const BEL: &str = "\x07";
/// SGR reset.
pub const RESET: &str = "\x1b[0m";

/// Opening of an OSC8 hyperlink; the target URI follows.
pub const OSC8_START: &str = "\x1b]8;;";

/// Matches the control sequences removed by [`strip_control_sequences`].
static CONTROL_SEQUENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\x1b\[[0-9;?]*[a-zA-Z]",          // CSI
        r"|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)", // OSC, BEL or ST terminated
        r"|\x1b_[^\x1b]*\x1b\\",            // APC / kitty graphics
        r"|\x1b[c78M]",                     // RIS, DECSC, DECRC, RI
    ))
    .expect("Invalid control sequence regex")
});

/// `rgb:<hex>/<hex>/<hex>` as found in OSC 4/10/11 responses.
static COLOR_RESPONSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"rgb:([0-9a-fA-F]{1,16})/([0-9a-fA-F]{1,16})/([0-9a-fA-F]{1,16})")
        .expect("Invalid color response regex")
});

/// Returns the truecolor SGR prefix for the given colors.
///
/// Empty when both are `None`.
pub fn sgr_prefix(fg: Option<Rgb>, bg: Option<Rgb>) -> String {
    let mut prefix = String::new();
    if let Some(Rgb { r, g, b }) = fg {
        prefix.push_str(&format!("\x1b[38;2;{r};{g};{b}m"));
    }
    if let Some(Rgb { r, g, b }) = bg {
        prefix.push_str(&format!("\x1b[48;2;{r};{g};{b}m"));
    }
    prefix
}

/// Wraps `text` in truecolor foreground/background codes followed by a reset.
///
/// With no colors at all the text comes back untouched (no reset either).
///
/// ## Examples
///
/// ```
/// use biscuit_console::utils::{color::Rgb, escape_codes::colorize};
///
/// assert_eq!(
///     colorize("hi", Some(Rgb::new(255, 0, 0)), None),
///     "\x1b[38;2;255;0;0mhi\x1b[0m"
/// );
/// assert_eq!(colorize("plain", None, None), "plain");
/// ```
pub fn colorize<T: AsRef<str>>(text: T, fg: Option<Rgb>, bg: Option<Rgb>) -> String {
    let prefix = sgr_prefix(fg, bg);
    if prefix.is_empty() {
        return text.as_ref().to_string();
    }
    format!("{prefix}{}{RESET}", text.as_ref())
}

/// Builds an OSC8 hyperlink.
///
/// The closing half repeats the opener with an empty target, which is what
/// terminals expect: `ESC]8;;URI ESC\ TEXT ESC]8;; ESC\`.
pub fn osc8_link<T: AsRef<str>, U: AsRef<str>>(text: T, uri: U) -> String {
    format!(
        "{OSC8_START}{}{ST}{}{OSC8_START}{ST}",
        uri.as_ref(),
        text.as_ref()
    )
}

/// Parses the color out of an OSC color query response.
///
/// Accepts any text containing `rgb:R/G/B` where each channel is 1 to 16 hex
/// digits. Two digits are replicated into both bytes (`ff` becomes `ffff`),
/// four are used verbatim, and any other width is scaled into `0..=65535`.
///
/// ## Examples
///
/// ```
/// use biscuit_console::utils::{color::Rgb16, escape_codes::parse_color_response};
///
/// let raw = "\x1b]11;rgb:1e1e/1e1e/2e2e\x1b\\";
/// assert_eq!(parse_color_response(raw), Some(Rgb16::new(0x1e1e, 0x1e1e, 0x2e2e)));
/// assert_eq!(parse_color_response("garbage"), None);
/// ```
pub fn parse_color_response(raw: &str) -> Option<Rgb16> {
    let caps = COLOR_RESPONSE_RE.captures(raw)?;
    let channel = |idx: usize| caps.get(idx).and_then(|m| normalize_channel(m.as_str()));
    Some(Rgb16::new(channel(1)?, channel(2)?, channel(3)?))
}

/// Scales a hex channel of any width (1 to 16 digits) to 16 bits.
fn normalize_channel(hex: &str) -> Option<u16> {
    let value = u64::from_str_radix(hex, 16).ok()?;
    match hex.len() {
        2 => u16::try_from(value * 0x101).ok(),
        4 => u16::try_from(value).ok(),
        len @ 1..=16 => {
            let max = 16f64.powi(len as i32) - 1.0;
            Some(((value as f64 / max) * 65535.0).round() as u16)
        }
        _ => None,
    }
}

/// Removes CSI, OSC, APC and single-character escape sequences.
///
/// Any other character survives, including a stray BEL or backspace that
/// is not part of a recognized sequence. Removal repeats until nothing
/// matches, so a sequence that only forms once an inner one is removed is
/// stripped too and the function is idempotent.
///
/// ## Examples
///
/// ```
/// use biscuit_console::utils::escape_codes::strip_control_sequences;
///
/// let styled = "\x1b[1m\x1b]8;;https://example.com\x1b\\link\x1b]8;;\x1b\\\x1b[0m";
/// assert_eq!(strip_control_sequences(styled), "link");
/// ```
pub fn strip_control_sequences<T: AsRef<str>>(text: T) -> String {
    let mut current = text.as_ref().to_string();
    loop {
        let next = CONTROL_SEQUENCE_RE.replace_all(&current, "");
        if next.len() == current.len() {
            return current;
        }
        current = next.into_owned();
    }
}

/// Whether `text` contains any sequence [`strip_control_sequences`] would remove.
pub fn has_escape_codes<T: AsRef<str>>(text: T) -> bool {
    CONTROL_SEQUENCE_RE.is_match(text.as_ref())
}

/// Whether an OSC response has been terminated by BEL or ST.
pub fn is_osc_terminated(accumulated: &str) -> bool {
    accumulated.contains(BEL) || accumulated.contains(ST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorize_fg_and_bg() {
        let out = colorize("x", Some(Rgb::new(1, 2, 3)), Some(Rgb::new(4, 5, 6)));
        assert_eq!(out, "\x1b[38;2;1;2;3m\x1b[48;2;4;5;6mx\x1b[0m");
    }

    #[test]
    fn test_colorize_bg_only() {
        let out = colorize("x", None, Some(Rgb::new(0, 0, 0)));
        assert_eq!(out, "\x1b[48;2;0;0;0mx\x1b[0m");
    }

    #[test]
    fn test_colorize_without_colors_is_passthrough() {
        assert_eq!(sgr_prefix(None, None), "");
        assert_eq!(colorize("plain text", None, None), "plain text");
    }

    #[test]
    fn test_osc8_link_shape() {
        assert_eq!(
            osc8_link("docs", "https://example.com"),
            "\x1b]8;;https://example.com\x1b\\docs\x1b]8;;\x1b\\"
        );
    }

    #[test]
    fn test_parse_two_digit_channels() {
        assert_eq!(
            parse_color_response("rgb:ff/80/00"),
            Some(Rgb16::new(0xffff, 0x8080, 0x0000))
        );
    }

    #[test]
    fn test_parse_two_digit_equals_four_digit() {
        assert_eq!(parse_color_response("rgb:ff/ff/ff"), parse_color_response("rgb:ffff/ffff/ffff"));
    }

    #[test]
    fn test_parse_two_digit_is_times_257() {
        for v in 0u16..=255 {
            let raw = format!("rgb:{v:02x}/{v:02x}/{v:02X}");
            let parsed = parse_color_response(&raw).unwrap();
            assert_eq!(parsed.r, v * 257);
            assert_eq!(parsed.b, v * 257);
        }
    }

    #[test]
    fn test_parse_other_widths_scale() {
        assert_eq!(parse_color_response("rgb:f/0/8").unwrap(), Rgb16::new(65535, 0, 34952));
        assert_eq!(parse_color_response("rgb:fff/000/fff").unwrap(), Rgb16::new(65535, 0, 65535));
        assert_eq!(
            parse_color_response("rgb:ffffffff/0/ffffff").unwrap(),
            Rgb16::new(65535, 0, 65535)
        );
    }

    #[test]
    fn test_parse_full_osc_responses() {
        let bel = "\x1b]11;rgb:0000/0000/0000\x07";
        let st = "\x1b]4;-2;rgb:fdfd/f6f6/e3e3\x1b\\";
        assert_eq!(parse_color_response(bel), Some(Rgb16::new(0, 0, 0)));
        assert_eq!(parse_color_response(st), Some(Rgb16::new(0xfdfd, 0xf6f6, 0xe3e3)));
    }

    #[test]
    fn test_parse_malformed_is_none() {
        for raw in [
            "",
            "rgb:",
            "rgb:ff/ff",
            "rgb:gg/gg/gg",
            "rgba:/ff/ff",
            "\x1b]11;?\x07",
            "rgb:ff//ff",
            "rgb:11111111111111111/0/0",
        ] {
            assert_eq!(parse_color_response(raw), None, "{raw:?} should not parse");
        }
    }

    #[test]
    fn test_strip_each_sequence_kind() {
        assert_eq!(strip_control_sequences("\x1b[31mred\x1b[0m"), "red");
        assert_eq!(strip_control_sequences("\x1b[?25lhidden\x1b[?25h"), "hidden");
        assert_eq!(strip_control_sequences("\x1b]0;title\x07text"), "text");
        assert_eq!(strip_control_sequences("\x1b]52;c;aGVsbG8=\x1b\\copied"), "copied");
        assert_eq!(strip_control_sequences("\x1b_Gf=100;AAAA\x1b\\img"), "img");
        assert_eq!(strip_control_sequences("\x1bc\x1b7a\x1b8b\x1bMc"), "abc");
    }

    #[test]
    fn test_strip_preserves_stray_controls() {
        assert_eq!(strip_control_sequences("ding\x07 back\x08"), "ding\x07 back\x08");
        assert_eq!(strip_control_sequences("tab\tnewline\n"), "tab\tnewline\n");
    }

    #[test]
    fn test_strip_plain_text_unchanged() {
        let plain = "hello, 世界 🎉";
        assert_eq!(strip_control_sequences(plain), plain);
    }

    #[test]
    fn test_strip_nested_sequence() {
        let nested = "\x1b\x1b[0m[31mred";
        let once = strip_control_sequences(nested);
        assert_eq!(once, "red");
        assert_eq!(strip_control_sequences(&once), once);
    }

    #[test]
    fn test_has_escape_codes() {
        assert!(has_escape_codes("\x1b[1mbold"));
        assert!(has_escape_codes(osc8_link("a", "b")));
        assert!(!has_escape_codes("plain \x07"));
    }

    #[test]
    fn test_is_osc_terminated() {
        assert!(is_osc_terminated("\x1b]11;rgb:0/0/0\x07"));
        assert!(is_osc_terminated("\x1b]11;rgb:0/0/0\x1b\\"));
        assert!(!is_osc_terminated("\x1b]11;rgb:0/0"));
    }
}
