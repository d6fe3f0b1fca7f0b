//! Light/dark background detection.
//!
//! The verdict comes from the first source in this list that answers:
//!
//! 1. `VITE_THEME` / `THEME` explicit overrides
//! 2. the terminal's own background color (OSC 11, then OSC 4;-2)
//! 3. `GTK_THEME` / `XDG_CURRENT_DESKTOP` hints
//! 4. the operating system's appearance setting
//! 5. `VITE_PREFERS` / `PREFERS` soft preferences
//!
//! ## Examples
//!
//! ```
//! use std::sync::Arc;
//! use biscuit_console::discovery::color_scheme::{ColorScheme, ColorSchemeDetector};
//! use biscuit_console::discovery::context::DetectionContext;
//! use biscuit_console::env::MapEnv;
//! use biscuit_console::probe::NonInteractive;
//! use biscuit_console::query::SystemRunner;
//!
//! let ctx = DetectionContext::new(
//!     Arc::new(MapEnv::new().with("THEME", "Dark")),
//!     Arc::new(SystemRunner),
//!     Arc::new(NonInteractive),
//! );
//! let detector = ColorSchemeDetector::new();
//! assert_eq!(detector.detect(&ctx), ColorScheme::Dark);
//! ```

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::cache::ProcessCache;
use crate::discovery::context::DetectionContext;
use crate::discovery::os_detection::OsType;
use crate::query::RunOptions;
use crate::utils::color::is_light_color;
use crate::utils::escape_codes::{is_osc_terminated, parse_color_response};

/// OSC 11: report the default background color.
pub const BACKGROUND_QUERY: &str = "\x1b]11;?\x1b\\";
/// OSC 4;-2: the background as a palette slot, for terminals without OSC 11.
pub const PALETTE_BACKGROUND_QUERY: &str = "\x1b]4;-2;?\x1b\\";

const WINDOWS_PERSONALIZE_KEY: &str =
    r"HKCU\Software\Microsoft\Windows\CurrentVersion\Themes\Personalize";

/// Whether the terminal background is light or dark.
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
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// Light background; text must be dark for contrast.
    Light,
    /// Dark background; text must be light for contrast.
    Dark,
    /// No source gave an answer.
    Unknown,
}

/// Parses an exact `light` / `dark` value.
fn scheme_from_word(value: &str) -> Option<ColorScheme> {
    match value.trim().to_ascii_lowercase().as_str() {
        "light" => Some(ColorScheme::Light),
        "dark" => Some(ColorScheme::Dark),
        _ => None,
    }
}

/// Looks for `dark` or `light` anywhere in a value such as `Adwaita:dark`.
fn scheme_from_hint(value: &str) -> Option<ColorScheme> {
    let lower = value.to_ascii_lowercase();
    if lower.contains("dark") {
        Some(ColorScheme::Dark)
    } else if lower.contains("light") {
        Some(ColorScheme::Light)
    } else {
        None
    }
}

/// Detects the color scheme. Only the terminal round trip is memoized;
/// environment and OS sources are consulted on every call.
#[derive(Debug, Default)]
pub struct ColorSchemeDetector {
    probe_cache: ProcessCache<Option<ColorScheme>>,
}

impl ColorSchemeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detect(&self, ctx: &DetectionContext) -> ColorScheme {
        if let Some(scheme) = Self::from_env(ctx, &["VITE_THEME", "THEME"], scheme_from_word) {
            return scheme;
        }

        if let Some(scheme) = self.from_terminal(ctx) {
            tracing::debug!(color_scheme = %scheme, source = "osc", "Detected color scheme from terminal background");
            return scheme;
        }

        if let Some(scheme) =
            Self::from_env(ctx, &["GTK_THEME", "XDG_CURRENT_DESKTOP"], scheme_from_hint)
        {
            return scheme;
        }

        if let Some(scheme) = Self::from_os(ctx) {
            tracing::debug!(color_scheme = %scheme, source = "os", os = %ctx.os, "Detected color scheme from OS setting");
            return scheme;
        }

        if let Some(scheme) = Self::from_env(ctx, &["VITE_PREFERS", "PREFERS"], scheme_from_word) {
            return scheme;
        }

        tracing::debug!(color_scheme = %ColorScheme::Unknown, source = "fallback", "No color scheme source answered");
        ColorScheme::Unknown
    }

    pub fn reset(&self) {
        self.probe_cache.reset();
    }

    fn from_env(
        ctx: &DetectionContext,
        keys: &[&'static str],
        parse: fn(&str) -> Option<ColorScheme>,
    ) -> Option<ColorScheme> {
        keys.iter().find_map(|&key| {
            let value = ctx.env.var(key)?;
            let scheme = parse(&value)?;
            tracing::debug!(color_scheme = %scheme, source = key, value = %value, "Detected color scheme from env var");
            Some(scheme)
        })
    }

    /// Queries the terminal at most once per detector.
    fn from_terminal(&self, ctx: &DetectionContext) -> Option<ColorScheme> {
        self.probe_cache.get_or_insert_with(|| {
            [BACKGROUND_QUERY, PALETTE_BACKGROUND_QUERY]
                .into_iter()
                .find_map(|query| {
                    let reply =
                        ctx.probe
                            .probe(query, ctx.options.probe_timeout, is_osc_terminated)?;
                    let rgb = parse_color_response(&reply)?;
                    tracing::trace!(query = ?query, ?rgb, "Terminal reported background color");
                    Some(is_light_color(rgb))
                })
        })
    }

    fn from_os(ctx: &DetectionContext) -> Option<ColorScheme> {
        let options = RunOptions::with_timeout(ctx.options.command_timeout).quiet();
        match ctx.os {
            OsType::MacOS => {
                let output = ctx.runner.run(
                    "defaults",
                    &["read", "-g", "AppleInterfaceStyle"],
                    &options,
                );
                match output.exit_code {
                    -1 => None,
                    0 if output.stdout.contains("Dark") => Some(ColorScheme::Dark),
                    // the key only exists in dark mode
                    _ => Some(ColorScheme::Light),
                }
            }
            OsType::Windows => {
                let output = ctx.runner.run(
                    "reg",
                    &["query", WINDOWS_PERSONALIZE_KEY, "/v", "AppsUseLightTheme"],
                    &options,
                );
                if !output.success() {
                    return None;
                }
                // any readable value other than 0x1 means apps use the dark theme
                if output.stdout.contains("0x1") {
                    Some(ColorScheme::Light)
                } else {
                    Some(ColorScheme::Dark)
                }
            }
            OsType::Linux => {
                let output = ctx.runner.run(
                    "gsettings",
                    &["get", "org.gnome.desktop.interface", "color-scheme"],
                    &options,
                );
                if output.success() {
                    scheme_from_hint(&output.stdout)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::env::MapEnv;
    use crate::probe::NonInteractive;
    use crate::test_support::{FakeDevice, FakeRunner};

    fn ctx(env: MapEnv, runner: FakeRunner, os: OsType) -> DetectionContext {
        DetectionContext::new(Arc::new(env), Arc::new(runner), Arc::new(NonInteractive)).with_os(os)
    }

    #[test]
    fn test_theme_override_wins() {
        let ctx = ctx(MapEnv::new().with("THEME", "LIGHT"), FakeRunner::new(), OsType::Linux);
        assert_eq!(ColorSchemeDetector::new().detect(&ctx), ColorScheme::Light);
    }

    #[test]
    fn test_vite_theme_precedes_theme() {
        let env = MapEnv::new().with("VITE_THEME", "dark").with("THEME", "light");
        let ctx = ctx(env, FakeRunner::new(), OsType::Linux);
        assert_eq!(ColorSchemeDetector::new().detect(&ctx), ColorScheme::Dark);
    }

    #[test]
    fn test_unrecognized_theme_value_is_skipped() {
        let env = MapEnv::new().with("THEME", "solarized").with("PREFERS", "light");
        let ctx = ctx(env, FakeRunner::new(), OsType::Unknown);
        assert_eq!(ColorSchemeDetector::new().detect(&ctx), ColorScheme::Light);
    }

    #[test]
    fn test_gtk_theme_hint() {
        let env = MapEnv::new().with("GTK_THEME", "Adwaita:dark");
        let ctx = ctx(env, FakeRunner::new(), OsType::Linux);
        assert_eq!(ColorSchemeDetector::new().detect(&ctx), ColorScheme::Dark);
    }

    #[test]
    fn test_macos_dark_mode() {
        let runner = FakeRunner::new().on("defaults read -g AppleInterfaceStyle", 0, "Dark", "");
        let ctx = ctx(MapEnv::new(), runner, OsType::MacOS);
        assert_eq!(ColorSchemeDetector::new().detect(&ctx), ColorScheme::Dark);
    }

    #[test]
    fn test_macos_missing_key_means_light() {
        let runner = FakeRunner::new().on(
            "defaults read -g AppleInterfaceStyle",
            1,
            "",
            "The domain/default pair of (kCFPreferencesAnyApplication, AppleInterfaceStyle) does not exist",
        );
        let ctx = ctx(MapEnv::new(), runner, OsType::MacOS);
        assert_eq!(ColorSchemeDetector::new().detect(&ctx), ColorScheme::Light);
    }

    #[test]
    fn test_macos_command_failure_falls_through() {
        let ctx = ctx(MapEnv::new().with("VITE_PREFERS", "dark"), FakeRunner::new(), OsType::MacOS);
        assert_eq!(ColorSchemeDetector::new().detect(&ctx), ColorScheme::Dark);
    }

    #[test]
    fn test_windows_registry() {
        let line = format!("reg query {WINDOWS_PERSONALIZE_KEY} /v AppsUseLightTheme");
        let runner = FakeRunner::new().on(
            &line,
            0,
            "\r\nHKEY_CURRENT_USER\\...\\Personalize\r\n    AppsUseLightTheme    REG_DWORD    0x0",
            "",
        );
        let ctx = ctx(MapEnv::new(), runner, OsType::Windows);
        assert_eq!(ColorSchemeDetector::new().detect(&ctx), ColorScheme::Dark);
    }

    #[test]
    fn test_windows_registry_light_and_unexpected_value() {
        let line = format!("reg query {WINDOWS_PERSONALIZE_KEY} /v AppsUseLightTheme");
        let light = FakeRunner::new().on(&line, 0, "    AppsUseLightTheme    REG_DWORD    0x1", "");
        let ctx_light = ctx(MapEnv::new(), light, OsType::Windows);
        assert_eq!(ColorSchemeDetector::new().detect(&ctx_light), ColorScheme::Light);

        let odd = FakeRunner::new().on(&line, 0, "    AppsUseLightTheme    REG_DWORD", "");
        let ctx_odd = ctx(MapEnv::new(), odd, OsType::Windows);
        assert_eq!(ColorSchemeDetector::new().detect(&ctx_odd), ColorScheme::Dark);

        let failed = FakeRunner::new().on(&line, 1, "", "ERROR: unable to find");
        let ctx_failed = ctx(MapEnv::new().with("PREFERS", "light"), failed, OsType::Windows);
        assert_eq!(ColorSchemeDetector::new().detect(&ctx_failed), ColorScheme::Light);
    }

    #[test]
    fn test_linux_gsettings() {
        let runner = FakeRunner::new().on(
            "gsettings get org.gnome.desktop.interface color-scheme",
            0,
            "'prefer-light'",
            "",
        );
        let ctx = ctx(MapEnv::new(), runner, OsType::Linux);
        assert_eq!(ColorSchemeDetector::new().detect(&ctx), ColorScheme::Light);
    }

    #[test]
    fn test_nothing_answers() {
        let ctx = ctx(MapEnv::new(), FakeRunner::new(), OsType::Linux);
        assert_eq!(ColorSchemeDetector::new().detect(&ctx), ColorScheme::Unknown);
    }

    #[test]
    fn test_osc11_light_background() {
        let device = Arc::new(
            FakeDevice::interactive().reply(BACKGROUND_QUERY, &["\x1b]11;rgb:ffff/ffff/ffff\x1b\\"]),
        );
        let ctx = DetectionContext::new(Arc::new(MapEnv::new()), Arc::new(FakeRunner::new()), device)
            .with_os(OsType::Unknown);
        assert_eq!(ColorSchemeDetector::new().detect(&ctx), ColorScheme::Light);
    }

    #[test]
    fn test_osc4_fallback_after_silent_osc11() {
        let device = Arc::new(
            FakeDevice::interactive()
                .reply(PALETTE_BACKGROUND_QUERY, &["\x1b]4;-2;rgb:1e/1e/1e\x07"]),
        );
        let ctx = DetectionContext::new(Arc::new(MapEnv::new()), Arc::new(FakeRunner::new()), device.clone())
            .with_os(OsType::Unknown);
        assert_eq!(ColorSchemeDetector::new().detect(&ctx), ColorScheme::Dark);
        assert_eq!(device.writes(), vec![BACKGROUND_QUERY, PALETTE_BACKGROUND_QUERY]);
    }

    #[test]
    fn test_probe_runs_once_but_overrides_still_apply() {
        let device = Arc::new(
            FakeDevice::interactive().reply(BACKGROUND_QUERY, &["\x1b]11;rgb:0000/0000/0000\x07"]),
        );
        let detector = ColorSchemeDetector::new();
        let plain = DetectionContext::new(Arc::new(MapEnv::new()), Arc::new(FakeRunner::new()), device.clone());
        assert_eq!(detector.detect(&plain), ColorScheme::Dark);
        assert_eq!(detector.detect(&plain), ColorScheme::Dark);
        assert_eq!(device.writes().len(), 1);

        let overridden = DetectionContext::new(
            Arc::new(MapEnv::new().with("THEME", "light")),
            Arc::new(FakeRunner::new()),
            device.clone(),
        );
        assert_eq!(detector.detect(&overridden), ColorScheme::Light);

        detector.reset();
        assert_eq!(detector.detect(&plain), ColorScheme::Dark);
        assert_eq!(device.writes().len(), 2);
    }

    #[test]
    fn test_scheme_display_and_parse() {
        assert_eq!(ColorScheme::Dark.to_string(), "dark");
        assert_eq!("LIGHT".parse::<ColorScheme>().unwrap(), ColorScheme::Light);
    }
}
