//! OSC 8 hyperlink support.

use crate::cache::ProcessCache;
use crate::discovery::app_version::AppVersionDetector;
use crate::discovery::context::DetectionContext;
use crate::discovery::detection::{TerminalApp, detect_terminal_app};

/// Whether Konsole renders OSC 8 links.
///
/// Konsole has shipped hyperlink support since 20.12, but it can be turned
/// off in the profile settings, so this is the one table entry that may
/// need correcting for a given install.
pub const KONSOLE_OSC8_SUPPORT: Option<bool> = Some(true);

/// The support table for terminals without version-specific rules.
///
/// `None` means "unknown", which only applies to [`TerminalApp::Other`].
pub fn link_support_for(app: TerminalApp) -> Option<bool> {
    match app {
        TerminalApp::ITerm2
        | TerminalApp::WezTerm
        | TerminalApp::Kitty
        // optimistic when the version is unknown
        | TerminalApp::Alacritty
        | TerminalApp::Ghostty
        | TerminalApp::WindowsTerminal
        | TerminalApp::Hyper
        | TerminalApp::Warp => Some(true),
        TerminalApp::Konsole => KONSOLE_OSC8_SUPPORT,
        TerminalApp::AppleTerminal
        | TerminalApp::Cmd
        | TerminalApp::PowerShell
        | TerminalApp::ConEmu
        | TerminalApp::Mintty => Some(false),
        TerminalApp::Other => None,
    }
}

/// Detects OSC 8 support once and remembers it.
///
/// ## Examples
///
/// ```
/// use std::sync::Arc;
/// use biscuit_console::discovery::app_version::AppVersionDetector;
/// use biscuit_console::discovery::context::DetectionContext;
/// use biscuit_console::discovery::link_support::LinkSupportDetector;
/// use biscuit_console::env::MapEnv;
/// use biscuit_console::probe::NonInteractive;
/// use biscuit_console::query::SystemRunner;
///
/// let ctx = DetectionContext::new(
///     Arc::new(MapEnv::new().with("TERM", "alacritty").with("ALACRITTY_VERSION", "0.12.3")),
///     Arc::new(SystemRunner),
///     Arc::new(NonInteractive),
/// );
/// let versions = AppVersionDetector::new();
/// assert_eq!(LinkSupportDetector::new().detect(&ctx, &versions), Some(false));
/// ```
#[derive(Debug, Default)]
pub struct LinkSupportDetector {
    cache: ProcessCache<Option<bool>>,
}

impl LinkSupportDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// `versions` supplies the Alacritty version; it keeps its own cache.
    pub fn detect(&self, ctx: &DetectionContext, versions: &AppVersionDetector) -> Option<bool> {
        self.cache.get_or_insert_with(|| {
            let app = detect_terminal_app(ctx.env.as_ref());

            let alacritty_version = (app == TerminalApp::Alacritty)
                .then(|| versions.detect(ctx))
                .flatten();
            if let Some(version) = alacritty_version {
                // OSC 8 arrived in Alacritty 0.13.0
                let supported = version.major > 0 || version.minor >= 13;
                tracing::debug!(terminal_app = %app, %version, supported, "Link support from Alacritty version");
                return Some(supported);
            }

            let supported = link_support_for(app);
            tracing::debug!(terminal_app = %app, ?supported, "Link support from table");
            supported
        })
    }

    pub fn reset(&self) {
        self.cache.reset();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::env::MapEnv;
    use crate::probe::NonInteractive;
    use crate::test_support::FakeRunner;
    use strum::IntoEnumIterator;

    fn detect(env: MapEnv) -> Option<bool> {
        let ctx = DetectionContext::new(Arc::new(env), Arc::new(FakeRunner::new()), Arc::new(NonInteractive));
        LinkSupportDetector::new().detect(&ctx, &AppVersionDetector::new())
    }

    fn alacritty(version: &str) -> Option<bool> {
        detect(MapEnv::new().with("TERM", "alacritty").with("ALACRITTY_VERSION", version))
    }

    #[test]
    fn test_alacritty_version_gate() {
        assert_eq!(alacritty("0.12.3"), Some(false));
        assert_eq!(alacritty("0.13.0"), Some(true));
        assert_eq!(alacritty("1.0.0"), Some(true));
    }

    #[test]
    fn test_alacritty_without_version_is_optimistic() {
        assert_eq!(detect(MapEnv::new().with("TERM", "alacritty")), Some(true));
    }

    #[test]
    fn test_other_is_unknown() {
        assert_eq!(detect(MapEnv::new()), None);
    }

    #[test]
    fn test_table() {
        assert_eq!(link_support_for(TerminalApp::Konsole), KONSOLE_OSC8_SUPPORT);
        assert_eq!(link_support_for(TerminalApp::AppleTerminal), Some(false));
        assert_eq!(link_support_for(TerminalApp::WindowsTerminal), Some(true));
        for app in TerminalApp::iter().filter(|a| *a != TerminalApp::Other) {
            assert!(link_support_for(app).is_some() || app == TerminalApp::Konsole, "{app}");
        }
    }

    #[test]
    fn test_cached_until_reset() {
        let ctx = DetectionContext::new(
            Arc::new(MapEnv::new().with("TERM_PROGRAM", "Apple_Terminal")),
            Arc::new(FakeRunner::new()),
            Arc::new(NonInteractive),
        );
        let versions = AppVersionDetector::new();
        let detector = LinkSupportDetector::new();
        assert_eq!(detector.detect(&ctx, &versions), Some(false));

        let other = DetectionContext::new(Arc::new(MapEnv::new()), Arc::new(FakeRunner::new()), Arc::new(NonInteractive));
        assert_eq!(detector.detect(&other, &versions), Some(false), "first answer is kept");

        detector.reset();
        assert_eq!(detector.detect(&other, &versions), None);
    }
}
