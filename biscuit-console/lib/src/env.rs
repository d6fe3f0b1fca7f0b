//! Read-only access to the process environment.
//!
//! Detectors never call `std::env` directly. They read through the
//! [`Environment`] trait so tests can hand them a [`MapEnv`] instead of
//! mutating the real process environment.

use std::collections::HashMap;

/// A source of environment variables and host facts.
pub trait Environment: Send + Sync {
    /// Returns the value of `key` if the variable is present.
    ///
    /// Presence is what matters to most detectors: a variable set to the
    /// empty string is `Some("")`, not `None`.
    fn var(&self, key: &str) -> Option<String>;

    /// Contents of `/proc/version`, if readable.
    fn proc_version(&self) -> Option<String>;

    /// Whether `key` is present, regardless of its value.
    fn has(&self, key: &str) -> bool {
        self.var(key).is_some()
    }

    /// Returns the value of `key` only when it is non-empty after trimming.
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key).filter(|v| !v.trim().is_empty())
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var_os(key).map(|v| v.to_string_lossy().into_owned())
    }

    fn proc_version(&self) -> Option<String> {
        std::fs::read_to_string("/proc/version").ok()
    }
}

/// A fixed, in-memory environment.
///
/// ## Examples
///
/// ```
/// use biscuit_console::env::{Environment, MapEnv};
///
/// let env = MapEnv::new()
///     .with("TERM_PROGRAM", "WezTerm")
///     .with("WT_SESSION", "");
///
/// assert_eq!(env.var("TERM_PROGRAM").as_deref(), Some("WezTerm"));
/// assert!(env.has("WT_SESSION"));
/// assert!(env.non_empty("WT_SESSION").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
    proc_version: Option<String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Sets what `/proc/version` would contain.
    pub fn with_proc_version(mut self, contents: impl Into<String>) -> Self {
        self.proc_version = Some(contents.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for MapEnv
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(MapEnv::new(), |env, (k, v)| env.with(k, v))
    }
}

impl Environment for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn proc_version(&self) -> Option<String> {
        self.proc_version.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_env_presence_includes_empty() {
        let env = MapEnv::new().with("PROMPT", "");
        assert!(env.has("PROMPT"));
        assert_eq!(env.var("PROMPT").as_deref(), Some(""));
        assert!(!env.has("COMSPEC"));
    }

    #[test]
    fn test_non_empty_filters_whitespace() {
        let env = MapEnv::new().with("THEME", "   ").with("VITE_THEME", "dark");
        assert!(env.non_empty("THEME").is_none());
        assert_eq!(env.non_empty("VITE_THEME").as_deref(), Some("dark"));
    }

    #[test]
    fn test_from_iterator() {
        let env: MapEnv = [("TERM", "xterm-256color"), ("COLORTERM", "truecolor")]
            .into_iter()
            .collect();
        assert_eq!(env.var("TERM").as_deref(), Some("xterm-256color"));
        assert_eq!(env.var("COLORTERM").as_deref(), Some("truecolor"));
    }

    #[test]
    fn test_proc_version() {
        let env = MapEnv::new().with_proc_version("Linux version 5.15.0-microsoft-standard-WSL2");
        assert!(env.proc_version().is_some_and(|v| v.contains("microsoft")));
        assert!(MapEnv::new().proc_version().is_none());
    }

    #[test]
    #[serial_test::serial]
    fn test_process_env_reads_real_environment() {
        // SAFETY: serialized with every other test touching the process env
        unsafe { std::env::set_var("BISCUIT_CONSOLE_TEST_VAR", "") };
        assert_eq!(ProcessEnv.var("BISCUIT_CONSOLE_TEST_VAR").as_deref(), Some(""));
        unsafe { std::env::remove_var("BISCUIT_CONSOLE_TEST_VAR") };
        assert!(ProcessEnv.var("BISCUIT_CONSOLE_TEST_VAR").is_none());
    }
}
