//! Terminal application identification.
//!
//! Identification only reads environment variables, so it is cheap and is
//! recomputed on every call.
//!
//! ## Examples
//!
//! ```
//! use biscuit_console::discovery::detection::{TerminalApp, detect_terminal_app};
//! use biscuit_console::env::MapEnv;
//!
//! let env = MapEnv::new().with("TERM_PROGRAM", "iTerm.app");
//! assert_eq!(detect_terminal_app(&env), TerminalApp::ITerm2);
//! assert_eq!(TerminalApp::ITerm2.to_string(), "iterm2");
//! ```

use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoStaticStr};

use crate::env::Environment;

/// A known terminal application.
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
    EnumCount,
    IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalApp {
    #[strum(serialize = "iterm2")]
    #[serde(rename = "iterm2")]
    ITerm2,
    #[strum(serialize = "wezterm")]
    #[serde(rename = "wezterm")]
    WezTerm,
    Kitty,
    Alacritty,
    Ghostty,
    Konsole,
    WindowsTerminal,
    #[strum(serialize = "powershell")]
    #[serde(rename = "powershell")]
    PowerShell,
    Cmd,
    #[strum(serialize = "conemu")]
    #[serde(rename = "conemu")]
    ConEmu,
    Mintty,
    AppleTerminal,
    Hyper,
    Warp,
    Other,
}

/// `TERM_PROGRAM` values (lowercased) with a known meaning.
const TERM_PROGRAM_LOOKUP: &[(&str, TerminalApp)] = &[
    ("iterm.app", TerminalApp::ITerm2),
    ("wezterm", TerminalApp::WezTerm),
    ("ghostty", TerminalApp::Ghostty),
    ("apple_terminal", TerminalApp::AppleTerminal),
    ("alacritty", TerminalApp::Alacritty),
    ("hyper", TerminalApp::Hyper),
    ("warpterminal", TerminalApp::Warp),
];

/// Substrings of `TERM` (lowercased), checked in order.
const TERM_PATTERNS: &[(&str, TerminalApp)] = &[
    ("kitty", TerminalApp::Kitty),
    ("alacritty", TerminalApp::Alacritty),
    ("iterm2", TerminalApp::ITerm2),
    ("mintty", TerminalApp::Mintty),
];

/// Variables whose mere presence identifies a terminal, checked in order.
const ENV_MARKERS: &[(TerminalApp, &[&str])] = &[
    (TerminalApp::WindowsTerminal, &["WT_SESSION", "WT_PROFILE_ID"]),
    (
        TerminalApp::WezTerm,
        &[
            "WEZTERM_CONFIG_DIR",
            "WEZTERM_CONFIG_FILE",
            "WEZTERM_EXECUTABLE",
            "WEZTERM_PANE",
            "WEZTERM_UNIX_SOCKET",
        ],
    ),
    (TerminalApp::ITerm2, &["ITERM_PROFILE", "ITERM_SESSION_ID"]),
    (
        TerminalApp::Alacritty,
        &["ALACRITTY_LOG", "ALACRITTY_SOCKET", "ALACRITTY_WINDOW_ID"],
    ),
    (
        TerminalApp::Kitty,
        &["KITTY_WINDOW_ID", "KITTY_PUBLIC_KEY", "KITTY_INSTALLATION_DIR", "KITTY_PID"],
    ),
    (TerminalApp::Konsole, &["KONSOLE_VERSION", "KONSOLE_DBUS_WINDOW"]),
    (
        TerminalApp::Ghostty,
        &["GHOSTTY_RESOURCES_DIR", "GHOSTTY_SHELL_FEATURES", "GHOSTTY_BIN_DIR"],
    ),
    (
        TerminalApp::PowerShell,
        &["PSModulePath", "POWERSHELL_DISTRIBUTION_CHANNEL"],
    ),
    (TerminalApp::ConEmu, &["ConEmuDir", "ConEmuBaseDir", "CMDER_ROOT"]),
    (TerminalApp::Mintty, &["MSYSTEM", "CHERE_INVOKING"]),
    (TerminalApp::Cmd, &["PROMPT", "COMSPEC"]),
];

/// Identifies the terminal application from the environment.
///
/// WSL is never reported here; inside WSL the hosting terminal (usually
/// Windows Terminal) is still identified through its own variables.
pub fn detect_terminal_app(env: &dyn Environment) -> TerminalApp {
    if let Some(program) = env.var("TERM_PROGRAM") {
        let program = program.to_lowercase();
        if let Some((_, app)) = TERM_PROGRAM_LOOKUP.iter().find(|(key, _)| *key == program) {
            tracing::debug!(terminal_app = %app, source = "TERM_PROGRAM", term_program = %program, "Detected terminal app");
            return *app;
        }
    }

    if let Some(term) = env.var("TERM") {
        let term = term.to_lowercase();
        if let Some((_, app)) = TERM_PATTERNS.iter().find(|(pattern, _)| term.contains(pattern)) {
            tracing::debug!(terminal_app = %app, source = "TERM", term = %term, "Detected terminal app");
            return *app;
        }
    }

    for (app, keys) in ENV_MARKERS {
        if let Some(key) = keys.iter().find(|key| env.has(key)) {
            tracing::debug!(terminal_app = %app, source = %key, "Detected terminal app from marker variable");
            return *app;
        }
    }

    tracing::debug!(terminal_app = %TerminalApp::Other, source = "fallback", "Unrecognized terminal");
    TerminalApp::Other
}

/// Whether the process runs inside Windows Subsystem for Linux.
pub fn is_running_in_wsl(env: &dyn Environment) -> bool {
    env.has("WSL_DISTRO_NAME")
        || env
            .proc_version()
            .is_some_and(|v| v.to_lowercase().contains("microsoft"))
}
