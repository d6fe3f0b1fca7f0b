//! Terminal application version detection and parsing.
//!
//! Terminals publish versions in several shapes: semver (`0.13.2`),
//! Konsole's `YYMMPP` (`250402`), WezTerm's build stamp
//! (`20230712-072601-f4abf8fd`) and plain build numbers (`465`). Parsing
//! tries one [`VersionStrategy`] after another; the first that matches wins.
//!
//! ## Examples
//!
//! ```
//! use biscuit_console::discovery::app_version::AppVersion;
//!
//! let konsole = AppVersion::parse("250402").unwrap();
//! assert_eq!((konsole.major, konsole.minor, konsole.patch), (25, 4, 2));
//! assert_eq!(konsole.to_string(), "25.04.2");
//!
//! let wezterm = AppVersion::parse("20230712-072601-f4abf8fd").unwrap();
//! assert_eq!(wezterm.to_string(), "20230712.72601.0");
//!
//! assert!(AppVersion::parse("not-a-version").is_none());
//! ```

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::cache::ProcessCache;
use crate::discovery::context::DetectionContext;
use crate::discovery::detection::{TerminalApp, detect_terminal_app};
use crate::discovery::os_detection::OsType;
use crate::query::RunOptions;

/// A parsed terminal version.
///
/// Equality, ordering and hashing only look at the three numbers. The
/// textual form keeps the zero padding of Konsole-style versions and of
/// semver components written with leading zeros (major below 100).
#[derive(Debug, Clone, Copy)]
pub struct AppVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    minor_width: usize,
    patch_width: usize,
}

impl AppVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            minor_width: 0,
            patch_width: 0,
        }
    }

    /// Parses a version string with the first [`VersionStrategy`] that matches.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        VersionStrategy::iter().find_map(|strategy| strategy.parse(raw))
    }
}

impl PartialEq for AppVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AppVersion {}

impl PartialOrd for AppVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AppVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl Hash for AppVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.major, self.minor, self.patch).hash(state);
    }
}

impl std::fmt::Display for AppVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{:0minor_width$}.{:0patch_width$}",
            self.major,
            self.minor,
            self.patch,
            minor_width = self.minor_width,
            patch_width = self.patch_width
        )
    }
}

impl Serialize for AppVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

static SEMVER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"v?(\d+)\.(\d+)(?:\.(\d+))?").expect("Invalid semver regex")
});

static YYMMPP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})(\d{2})(\d{2})$").expect("Invalid YYMMPP regex"));

static DATE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{8})-(\d{6})").expect("Invalid date-time regex"));

static BARE_INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)$").expect("Invalid integer regex"));

/// One way of reading a version string. Strategies are tried in
/// declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum VersionStrategy {
    /// `v?MAJOR.MINOR[.PATCH]`, ignoring anything after it (`-dev`, `+build`).
    SemVer,
    /// Exactly six digits, `YYMMPP` (Konsole).
    KonsoleYymmpp,
    /// `YYYYMMDD-HHMMSS` (WezTerm).
    DateTime,
    /// A single integer (Apple Terminal build numbers).
    BareInteger,
}

fn capture_u32(caps: &regex::Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index).map_or(Some(0), |m| m.as_str().parse().ok())
}

impl VersionStrategy {
    pub fn parse(self, raw: &str) -> Option<AppVersion> {
        match self {
            VersionStrategy::SemVer => parse_semver(raw),
            VersionStrategy::KonsoleYymmpp => parse_yymmpp(raw),
            VersionStrategy::DateTime => parse_date_time(raw),
            VersionStrategy::BareInteger => parse_bare_integer(raw),
        }
    }
}

/// Rendering width of a zero-padded component such as `04`; 0 otherwise.
fn padded_width(caps: &regex::Captures<'_>, index: usize) -> usize {
    caps.get(index)
        .map(|m| m.as_str())
        .filter(|digits| digits.len() > 1 && digits.starts_with('0'))
        .map_or(0, str::len)
}

pub fn parse_semver(raw: &str) -> Option<AppVersion> {
    let caps = SEMVER_RE.captures(raw)?;
    let version = AppVersion::new(
        capture_u32(&caps, 1)?,
        capture_u32(&caps, 2)?,
        capture_u32(&caps, 3)?,
    );
    if version.major >= 100 {
        return Some(version);
    }
    Some(AppVersion {
        minor_width: padded_width(&caps, 2),
        patch_width: padded_width(&caps, 3),
        ..version
    })
}

pub fn parse_yymmpp(raw: &str) -> Option<AppVersion> {
    let caps = YYMMPP_RE.captures(raw)?;
    Some(AppVersion {
        minor_width: 2,
        ..AppVersion::new(capture_u32(&caps, 1)?, capture_u32(&caps, 2)?, capture_u32(&caps, 3)?)
    })
}

pub fn parse_date_time(raw: &str) -> Option<AppVersion> {
    let caps = DATE_TIME_RE.captures(raw)?;
    Some(AppVersion::new(capture_u32(&caps, 1)?, capture_u32(&caps, 2)?, 0))
}

pub fn parse_bare_integer(raw: &str) -> Option<AppVersion> {
    let caps = BARE_INTEGER_RE.captures(raw)?;
    Some(AppVersion::new(capture_u32(&caps, 1)?, 0, 0))
}

/// The variable a terminal publishes its own version in.
fn version_var(app: TerminalApp) -> Option<&'static str> {
    match app {
        TerminalApp::Alacritty => Some("ALACRITTY_VERSION"),
        TerminalApp::WezTerm => Some("WEZTERM_VERSION"),
        TerminalApp::Kitty => Some("KITTY_VERSION"),
        TerminalApp::Konsole => Some("KONSOLE_VERSION"),
        _ => None,
    }
}

/// The executable that answers `--version`, by `PATH` name.
fn binary_name(app: TerminalApp) -> Option<&'static str> {
    match app {
        TerminalApp::WezTerm => Some("wezterm"),
        TerminalApp::Kitty => Some("kitty"),
        TerminalApp::Alacritty => Some("alacritty"),
        TerminalApp::Ghostty => Some("ghostty"),
        TerminalApp::Konsole => Some("konsole"),
        TerminalApp::PowerShell => Some("pwsh"),
        TerminalApp::Mintty => Some("mintty"),
        _ => None,
    }
}

/// Where the executable usually lives when it is not on `PATH`.
fn well_known_path(app: TerminalApp, os: OsType) -> Option<&'static str> {
    match (os, app) {
        (OsType::MacOS, TerminalApp::WezTerm) => {
            Some("/Applications/WezTerm.app/Contents/MacOS/wezterm")
        }
        (OsType::MacOS, TerminalApp::Kitty) => Some("/Applications/kitty.app/Contents/MacOS/kitty"),
        (OsType::MacOS, TerminalApp::Alacritty) => {
            Some("/Applications/Alacritty.app/Contents/MacOS/alacritty")
        }
        (OsType::MacOS, TerminalApp::Ghostty) => {
            Some("/Applications/Ghostty.app/Contents/MacOS/ghostty")
        }
        (OsType::Windows, TerminalApp::WezTerm) => Some(r"C:\Program Files\WezTerm\wezterm.exe"),
        (OsType::Windows, TerminalApp::Alacritty) => {
            Some(r"C:\Program Files\Alacritty\alacritty.exe")
        }
        (OsType::Windows, TerminalApp::PowerShell) => {
            Some(r"C:\Program Files\PowerShell\7\pwsh.exe")
        }
        (OsType::Windows, TerminalApp::Mintty) => Some(r"C:\Program Files\Git\usr\bin\mintty.exe"),
        _ => None,
    }
}

/// Detects the version of the current terminal. The answer, including
/// "no version", is memoized.
#[derive(Debug, Default)]
pub struct AppVersionDetector {
    cache: ProcessCache<Option<AppVersion>>,
}

impl AppVersionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detect(&self, ctx: &DetectionContext) -> Option<AppVersion> {
        self.cache.get_or_insert_with(|| {
            let app = detect_terminal_app(ctx.env.as_ref());
            Self::compute(ctx, app)
        })
    }

    pub fn reset(&self) {
        self.cache.reset();
    }

    fn compute(ctx: &DetectionContext, app: TerminalApp) -> Option<AppVersion> {
        let from_env = version_var(app)
            .into_iter()
            .chain(["TERM_PROGRAM_VERSION"])
            .find_map(|key| {
                let raw = ctx.env.non_empty(key)?;
                let version = AppVersion::parse(&raw)?;
                tracing::debug!(terminal_app = %app, source = key, %version, "Detected app version from env var");
                Some(version)
            });
        if from_env.is_some() || app == TerminalApp::Other {
            return from_env;
        }

        let options = RunOptions::with_timeout(ctx.options.command_timeout);
        let version = binary_name(app)
            .into_iter()
            .chain(well_known_path(app, ctx.os))
            .find_map(|binary| {
                let output = ctx.runner.run(binary, &["--version"], &options);
                let version = AppVersion::parse(&output.stdout)
                    .or_else(|| AppVersion::parse(&output.stderr))?;
                tracing::debug!(terminal_app = %app, source = "--version", binary, %version, "Detected app version from binary");
                Some(version)
            });

        if version.is_none() {
            tracing::debug!(terminal_app = %app, "Could not determine app version");
        }
        version
    }
}
