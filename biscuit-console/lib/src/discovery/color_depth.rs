//! How many colors the terminal can display.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::cache::ProcessCache;
use crate::discovery::context::DetectionContext;
use crate::utils::escape_codes::{is_osc_terminated, parse_color_response};

/// OSC 4;255: ask for the last 256-color palette entry. Terminals that
/// answer it are assumed to handle 24-bit color.
pub const PALETTE_QUERY: &str = "\x1b]4;255;?\x07";

/// The color depth of a terminal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum ColorDepth {
    /// 8 colors
    #[strum(serialize = "8")]
    #[serde(rename = "8")]
    Minimal,
    /// 16 colors (8 normal plus "bright" variants)
    #[strum(serialize = "16")]
    #[serde(rename = "16")]
    Basic,
    /// 256 color palette (8 bit)
    #[strum(serialize = "256")]
    #[serde(rename = "256")]
    Enhanced,
    /// 16 million colors (24 bit)
    #[strum(serialize = "truecolor")]
    #[serde(rename = "truecolor")]
    TrueColor,
}

impl ColorDepth {
    /// Number of distinct colors.
    pub const fn colors(self) -> u32 {
        match self {
            ColorDepth::Minimal => 8,
            ColorDepth::Basic => 16,
            ColorDepth::Enhanced => 256,
            ColorDepth::TrueColor => 16_777_216,
        }
    }
}

/// Interprets `COLORTERM`.
fn depth_from_colorterm(colorterm: &str) -> Option<ColorDepth> {
    let value = colorterm.trim().to_ascii_lowercase();
    matches!(value.as_str(), "truecolor" | "24bit").then_some(ColorDepth::TrueColor)
}

/// Interprets `TERM`. Rules are checked in order.
fn depth_from_term(term: &str) -> Option<ColorDepth> {
    let term = term.trim().to_ascii_lowercase();
    let is_xterm = term == "xterm" || term.starts_with("xterm-");

    if term.contains("256color") {
        Some(ColorDepth::Enhanced)
    } else if term.contains("16color") {
        Some(ColorDepth::Basic)
    } else if term == "linux" || term == "xterm-color" {
        Some(ColorDepth::Minimal)
    } else if term.ends_with("color") && !term.contains("xterm") {
        Some(ColorDepth::Minimal)
    } else if is_xterm {
        Some(ColorDepth::Basic)
    } else {
        None
    }
}

/// Detects the color depth once and remembers it.
///
/// ## Examples
///
/// ```
/// use std::sync::Arc;
/// use biscuit_console::discovery::color_depth::{ColorDepth, ColorDepthDetector};
/// use biscuit_console::discovery::context::DetectionContext;
/// use biscuit_console::env::MapEnv;
/// use biscuit_console::probe::NonInteractive;
/// use biscuit_console::query::SystemRunner;
///
/// let ctx = DetectionContext::new(
///     Arc::new(MapEnv::new().with("TERM", "screen-256color")),
///     Arc::new(SystemRunner),
///     Arc::new(NonInteractive),
/// );
/// assert_eq!(ColorDepthDetector::new().detect(&ctx), ColorDepth::Enhanced);
/// ```
#[derive(Debug, Default)]
pub struct ColorDepthDetector {
    cache: ProcessCache<ColorDepth>,
}

impl ColorDepthDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detect(&self, ctx: &DetectionContext) -> ColorDepth {
        self.cache.get_or_insert_with(|| Self::compute(ctx))
    }

    pub fn reset(&self) {
        self.cache.reset();
    }

    fn compute(ctx: &DetectionContext) -> ColorDepth {
        if let Some((colorterm, depth)) = ctx
            .env
            .var("COLORTERM")
            .and_then(|v| depth_from_colorterm(&v).map(|d| (v, d)))
        {
            tracing::debug!(
                color_depth = ?depth,
                source = "COLORTERM",
                colorterm = %colorterm,
                "Detected truecolor support from COLORTERM env var"
            );
            return depth;
        }

        if let Some((term, depth)) = ctx
            .env
            .var("TERM")
            .and_then(|v| depth_from_term(&v).map(|d| (v, d)))
        {
            tracing::debug!(color_depth = ?depth, source = "TERM", term = %term, "Detected color depth from TERM");
            return depth;
        }

        let answered = ctx
            .probe
            .probe(PALETTE_QUERY, ctx.options.probe_timeout, is_osc_terminated)
            .and_then(|reply| parse_color_response(&reply))
            .is_some();
        if answered {
            tracing::debug!(color_depth = ?ColorDepth::TrueColor, source = "osc4", "Terminal answered palette query");
            return ColorDepth::TrueColor;
        }

        tracing::debug!(color_depth = ?ColorDepth::Enhanced, source = "fallback", "Assuming 256 colors");
        ColorDepth::Enhanced
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::env::MapEnv;
    use crate::probe::NonInteractive;
    use crate::test_support::{FakeDevice, FakeRunner};

    fn detect(env: MapEnv) -> ColorDepth {
        let ctx = DetectionContext::new(Arc::new(env), Arc::new(FakeRunner::new()), Arc::new(NonInteractive));
        ColorDepthDetector::new().detect(&ctx)
    }

    #[test]
    fn test_colorterm_truecolor() {
        assert_eq!(detect(MapEnv::new().with("COLORTERM", " TrueColor ")), ColorDepth::TrueColor);
        assert_eq!(detect(MapEnv::new().with("COLORTERM", "24bit")), ColorDepth::TrueColor);
    }

    #[test]
    fn test_colorterm_other_value_falls_to_term() {
        let env = MapEnv::new().with("COLORTERM", "yes").with("TERM", "xterm");
        assert_eq!(detect(env), ColorDepth::Basic);
    }

    #[test]
    fn test_term_rules() {
        assert_eq!(depth_from_term("xterm-256color"), Some(ColorDepth::Enhanced));
        assert_eq!(depth_from_term("rxvt-16color"), Some(ColorDepth::Basic));
        assert_eq!(depth_from_term("linux"), Some(ColorDepth::Minimal));
        assert_eq!(depth_from_term("xterm-color"), Some(ColorDepth::Minimal));
        assert_eq!(depth_from_term("ansi-color"), Some(ColorDepth::Minimal));
        assert_eq!(depth_from_term("xterm"), Some(ColorDepth::Basic));
        assert_eq!(depth_from_term("xterm-kitty"), Some(ColorDepth::Basic));
        assert_eq!(depth_from_term("dumb"), None);
    }

    #[test]
    fn test_generic_color_rule_skips_any_xterm_mention() {
        assert_eq!(depth_from_term("rxvt-color"), Some(ColorDepth::Minimal));
        assert_eq!(depth_from_term("screen.xtermcolor"), None);
        assert_eq!(depth_from_term("rxvt-xterm-color"), None);
    }

    #[test]
    fn test_default_is_enhanced() {
        assert_eq!(detect(MapEnv::new()), ColorDepth::Enhanced);
        assert_eq!(detect(MapEnv::new().with("TERM", "dumb")), ColorDepth::Enhanced);
    }

    #[test]
    fn test_palette_probe_means_truecolor() {
        let device = Arc::new(
            FakeDevice::interactive().reply(PALETTE_QUERY, &["\x1b]4;255;rgb:eeee/eeee/eeee\x07"]),
        );
        let ctx = DetectionContext::new(Arc::new(MapEnv::new()), Arc::new(FakeRunner::new()), device);
        assert_eq!(ColorDepthDetector::new().detect(&ctx), ColorDepth::TrueColor);
    }

    #[test]
    fn test_garbled_palette_reply_is_ignored() {
        let device = Arc::new(FakeDevice::interactive().reply(PALETTE_QUERY, &["\x1b]4;255;nope\x07"]));
        let ctx = DetectionContext::new(Arc::new(MapEnv::new()), Arc::new(FakeRunner::new()), device);
        assert_eq!(ColorDepthDetector::new().detect(&ctx), ColorDepth::Enhanced);
    }

    #[test]
    fn test_memoized_until_reset() {
        let device = Arc::new(
            FakeDevice::interactive().reply(PALETTE_QUERY, &["\x1b]4;255;rgb:ff/ff/ff\x07"]),
        );
        let ctx = DetectionContext::new(Arc::new(MapEnv::new()), Arc::new(FakeRunner::new()), device.clone());
        let detector = ColorDepthDetector::new();

        assert_eq!(detector.detect(&ctx), ColorDepth::TrueColor);
        assert_eq!(detector.detect(&ctx), ColorDepth::TrueColor);
        assert_eq!(device.writes().len(), 1);

        detector.reset();
        detector.detect(&ctx);
        assert_eq!(device.writes().len(), 2);
    }

    #[test]
    fn test_colors_and_names() {
        assert_eq!(ColorDepth::Minimal.colors(), 8);
        assert_eq!(ColorDepth::TrueColor.colors(), 16_777_216);
        assert_eq!(ColorDepth::Enhanced.to_string(), "256");
        assert_eq!(serde_json::to_string(&ColorDepth::TrueColor).unwrap(), "\"truecolor\"");
    }
}
