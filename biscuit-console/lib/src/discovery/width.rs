//! Available character width.
//!
//! Sources, in priority order: the `COLUMNS` variable, the column count
//! the OS reports for the terminal, a `CSI 18 t` round trip, and finally
//! the caller's fallback.

use std::sync::LazyLock;

use regex::Regex;

use crate::cache::ProcessCache;
use crate::discovery::context::DetectionContext;

/// `CSI 18 t`: report the text area size in characters.
pub const SIZE_QUERY: &str = "\x1b[18t";

/// `CSI 8 ; rows ; cols t`
static SIZE_REPLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[8;(\d+);(\d+)t").expect("Invalid size reply regex"));

/// `CSI row ; col R` (cursor position report), accepted from terminals that
/// answer the size query with a CPR.
static CPR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[(\d+);(\d+)R").expect("Invalid CPR regex"));

/// Parses `COLUMNS`: trimmed, finite, positive and floored. A value that
/// floors to zero is rejected as well.
pub fn parse_columns(value: &str) -> Option<u32> {
    let parsed: f64 = value.trim().parse().ok()?;
    if !parsed.is_finite() || parsed <= 0.0 {
        return None;
    }
    let floored = parsed.floor();
    if floored < 1.0 || floored > f64::from(u32::MAX) {
        return None;
    }
    Some(floored as u32)
}

/// Extracts the column count from a size report or a cursor position report.
pub fn parse_size_reply(reply: &str) -> Option<u32> {
    let caps = SIZE_REPLY_RE
        .captures(reply)
        .or_else(|| CPR_RE.captures(reply))?;
    caps.get(2)?
        .as_str()
        .parse::<u32>()
        .ok()
        .filter(|cols| *cols > 0)
}

/// Detects the available width. Only a successful probe is memoized.
///
/// ## Examples
///
/// ```
/// use std::sync::Arc;
/// use biscuit_console::discovery::context::DetectionContext;
/// use biscuit_console::discovery::width::AvailableWidthDetector;
/// use biscuit_console::env::MapEnv;
/// use biscuit_console::probe::NonInteractive;
/// use biscuit_console::query::SystemRunner;
///
/// let ctx = DetectionContext::new(
///     Arc::new(MapEnv::new().with("COLUMNS", "120.7")),
///     Arc::new(SystemRunner),
///     Arc::new(NonInteractive),
/// );
/// assert_eq!(AvailableWidthDetector::new().detect(&ctx, 80), 120);
/// ```
#[derive(Debug, Default)]
pub struct AvailableWidthDetector {
    probe_cache: ProcessCache<u32>,
}

impl AvailableWidthDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The width, or `fallback` when no source reports one.
    ///
    /// The fallback is returned as given, without validation.
    pub fn detect(&self, ctx: &DetectionContext, fallback: u32) -> u32 {
        if let Some(raw) = ctx.env.var("COLUMNS") {
            match parse_columns(&raw) {
                Some(width) => {
                    tracing::debug!(width, source = "COLUMNS", "Detected width from env var");
                    return width;
                }
                None => tracing::debug!(columns = %raw, "Ignoring unusable COLUMNS value"),
            }
        }

        if let Some(width) = ctx.probe.device().columns().filter(|w| *w > 0) {
            tracing::debug!(width, source = "ioctl", "Detected width from terminal size");
            return u32::from(width);
        }

        if let Some(width) = self.probe_cache.get_or_try_insert_with(|| {
            let reply = ctx.probe.probe(SIZE_QUERY, ctx.options.probe_timeout, |r| {
                SIZE_REPLY_RE.is_match(r) || CPR_RE.is_match(r)
            })?;
            parse_size_reply(&reply)
        }) {
            tracing::debug!(width, source = "csi18t", "Detected width from terminal size report");
            return width;
        }

        tracing::debug!(width = fallback, source = "fallback", "Using fallback width");
        fallback
    }

    pub fn reset(&self) {
        self.probe_cache.reset();
    }
}
