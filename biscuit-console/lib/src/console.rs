//! The `Console` aggregate: one context, one of each detector.
//!
//! ## Examples
//!
//! ```
//! use std::sync::Arc;
//! use biscuit_console::console::Console;
//! use biscuit_console::discovery::{ColorDepth, TerminalApp};
//! use biscuit_console::env::MapEnv;
//! use biscuit_console::probe::NonInteractive;
//!
//! let console = Console::builder()
//!     .env(MapEnv::new().with("TERM_PROGRAM", "WezTerm").with("COLORTERM", "truecolor"))
//!     .device(NonInteractive)
//!     .build();
//!
//! assert_eq!(console.terminal_app(), TerminalApp::WezTerm);
//! assert_eq!(console.color_depth(), ColorDepth::TrueColor);
//! assert_eq!(console.link_support(), Some(true));
//! ```

use std::sync::Arc;

use serde::Serialize;

use crate::discovery::app_version::{AppVersion, AppVersionDetector};
use crate::discovery::color_depth::{ColorDepth, ColorDepthDetector};
use crate::discovery::color_scheme::{ColorScheme, ColorSchemeDetector};
use crate::discovery::context::{DetectOptions, DetectionContext};
use crate::discovery::detection::{TerminalApp, detect_terminal_app, is_running_in_wsl};
use crate::discovery::link_support::LinkSupportDetector;
use crate::discovery::os_detection::{OsType, detect_os_type, os_arch};
use crate::discovery::programs::ProgramDetector;
use crate::discovery::width::AvailableWidthDetector;
use crate::env::{Environment, ProcessEnv};
use crate::error::Result;
use crate::probe::{TerminalDevice, TtyDevice};
use crate::query::{CommandRunner, SystemRunner};

/// Everything detected about the console at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsoleInfo {
    pub os: OsType,
    pub os_arch: String,
    pub is_wsl: bool,
    pub interactive: bool,
    pub terminal_app: TerminalApp,
    pub app_version: Option<AppVersion>,
    pub color_scheme: ColorScheme,
    pub color_depth: ColorDepth,
    pub colors: u32,
    pub available_width: u32,
    pub link_support: Option<bool>,
}

/// Capability detection for one console.
#[derive(Debug)]
pub struct Console {
    ctx: DetectionContext,
    color_scheme: ColorSchemeDetector,
    color_depth: ColorDepthDetector,
    width: AvailableWidthDetector,
    app_version: AppVersionDetector,
    link_support: LinkSupportDetector,
    programs: ProgramDetector,
}

impl Console {
    pub fn new(ctx: DetectionContext) -> Self {
        Self {
            ctx,
            color_scheme: ColorSchemeDetector::new(),
            color_depth: ColorDepthDetector::new(),
            width: AvailableWidthDetector::new(),
            app_version: AppVersionDetector::new(),
            link_support: LinkSupportDetector::new(),
            programs: ProgramDetector::new(),
        }
    }

    /// A console over the real process environment and `/dev/tty`.
    pub fn system() -> Self {
        Self::new(DetectionContext::system())
    }

    pub fn builder() -> ConsoleBuilder {
        ConsoleBuilder::default()
    }

    pub fn context(&self) -> &DetectionContext {
        &self.ctx
    }

    pub fn color_scheme(&self) -> ColorScheme {
        self.color_scheme.detect(&self.ctx)
    }

    pub fn color_depth(&self) -> ColorDepth {
        self.color_depth.detect(&self.ctx)
    }

    /// Available width, falling back to [`DetectOptions::fallback_width`].
    pub fn available_width(&self) -> u32 {
        self.width.detect(&self.ctx, self.ctx.options.fallback_width)
    }

    pub fn available_width_or(&self, fallback: u32) -> u32 {
        self.width.detect(&self.ctx, fallback)
    }

    pub fn terminal_app(&self) -> TerminalApp {
        detect_terminal_app(self.ctx.env.as_ref())
    }

    pub fn app_version(&self) -> Option<AppVersion> {
        self.app_version.detect(&self.ctx)
    }

    /// OSC 8 support; `None` when the terminal is not recognized.
    pub fn link_support(&self) -> Option<bool> {
        self.link_support.detect(&self.ctx, &self.app_version)
    }

    /// Whether `name` is an executable on the `PATH`.
    ///
    /// ## Errors
    ///
    /// Returns [`ConsoleError::InvalidProgramName`](crate::error::ConsoleError::InvalidProgramName)
    /// when `name` contains shell metacharacters.
    pub fn has_program(&self, name: &str) -> Result<bool> {
        self.programs.has_program(&self.ctx, name)
    }

    pub fn is_wsl(&self) -> bool {
        is_running_in_wsl(self.ctx.env.as_ref())
    }

    pub fn os(&self) -> OsType {
        self.ctx.os
    }

    pub fn is_interactive(&self) -> bool {
        self.ctx.probe.is_interactive()
    }

    /// Runs every detector and collects the results.
    pub fn snapshot(&self) -> ConsoleInfo {
        let color_depth = self.color_depth();
        ConsoleInfo {
            os: self.os(),
            os_arch: os_arch(),
            is_wsl: self.is_wsl(),
            interactive: self.is_interactive(),
            terminal_app: self.terminal_app(),
            app_version: self.app_version(),
            color_scheme: self.color_scheme(),
            color_depth,
            colors: color_depth.colors(),
            available_width: self.available_width(),
            link_support: self.link_support(),
        }
    }

    /// Clears every cache; the next call to each detector recomputes.
    pub fn reset(&self) {
        self.color_scheme.reset();
        self.color_depth.reset();
        self.width.reset();
        self.app_version.reset();
        self.link_support.reset();
        self.programs.reset();
        tracing::debug!("Console caches reset");
    }
}

/// Builds a [`Console`] with injected collaborators. Anything not set uses
/// the real system.
#[derive(Default)]
pub struct ConsoleBuilder {
    env: Option<Arc<dyn Environment>>,
    runner: Option<Arc<dyn CommandRunner>>,
    device: Option<Arc<dyn TerminalDevice>>,
    os: Option<OsType>,
    options: DetectOptions,
}

impl ConsoleBuilder {
    pub fn env(mut self, env: impl Environment + 'static) -> Self {
        self.env = Some(Arc::new(env));
        self
    }

    pub fn runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Some(Arc::new(runner));
        self
    }

    pub fn shared_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn device(mut self, device: impl TerminalDevice + 'static) -> Self {
        self.device = Some(Arc::new(device));
        self
    }

    pub fn shared_device(mut self, device: Arc<dyn TerminalDevice>) -> Self {
        self.device = Some(device);
        self
    }

    pub fn os(mut self, os: OsType) -> Self {
        self.os = Some(os);
        self
    }

    pub fn options(mut self, options: DetectOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Console {
        let env = self.env.unwrap_or_else(|| Arc::new(ProcessEnv));
        let runner = self.runner.unwrap_or_else(|| Arc::new(SystemRunner));
        let device = self
            .device
            .unwrap_or_else(|| Arc::new(TtyDevice::open()));
        let ctx = DetectionContext::new(env, runner, device)
            .with_os(self.os.unwrap_or_else(detect_os_type))
            .with_options(self.options);
        Console::new(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use crate::probe::NonInteractive;
    use crate::test_support::{FakeDevice, FakeRunner};

    fn console(env: MapEnv) -> Console {
        Console::builder()
            .env(env)
            .runner(FakeRunner::new())
            .device(NonInteractive)
            .os(OsType::Linux)
            .build()
    }

    #[test]
    fn test_snapshot_of_plain_pipe() {
        let info = console(MapEnv::new()).snapshot();
        assert_eq!(info.terminal_app, TerminalApp::Other);
        assert_eq!(info.app_version, None);
        assert_eq!(info.color_scheme, ColorScheme::Unknown);
        assert_eq!(info.color_depth, ColorDepth::Enhanced);
        assert_eq!(info.colors, 256);
        assert_eq!(info.available_width, 80);
        assert_eq!(info.link_support, None);
        assert!(!info.interactive);
        assert!(!info.is_wsl);
    }

    #[test]
    fn test_fallback_width_comes_from_options() {
        let console = Console::builder()
            .env(MapEnv::new())
            .device(NonInteractive)
            .options(DetectOptions {
                fallback_width: 100,
                ..DetectOptions::default()
            })
            .build();
        assert_eq!(console.available_width(), 100);
        assert_eq!(console.available_width_or(60), 60);
    }

    #[test]
    fn test_reset_clears_memoized_answers() {
        let device = Arc::new(FakeDevice::interactive().reply("\x1b]4;255;?\x07", &["\x1b]4;255;rgb:ff/ff/ff\x07"]));
        let console = Console::builder()
            .env(MapEnv::new())
            .runner(FakeRunner::new())
            .shared_device(device.clone())
            .build();

        assert_eq!(console.color_depth(), ColorDepth::TrueColor);
        assert_eq!(console.color_depth(), ColorDepth::TrueColor);
        assert_eq!(device.writes().iter().filter(|w| w.starts_with("\x1b]4;255")).count(), 1);

        console.reset();
        console.color_depth();
        assert_eq!(device.writes().iter().filter(|w| w.starts_with("\x1b]4;255")).count(), 2);
    }

    #[test]
    fn test_snapshot_serializes() {
        let info = console(MapEnv::new().with("KONSOLE_VERSION", "250402")).snapshot();
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["terminal_app"], "konsole");
        assert_eq!(json["app_version"], "25.04.2");
        assert_eq!(json["color_depth"], "256");
        assert_eq!(json["os"], "Linux");
    }

    #[test]
    fn test_has_program_goes_through_runner() {
        let console = Console::builder()
            .env(MapEnv::new())
            .runner(FakeRunner::new().on("which bat", 0, "/usr/bin/bat", ""))
            .device(NonInteractive)
            .os(OsType::Linux)
            .build();
        assert!(console.has_program("bat").unwrap());
        assert!(!console.has_program("cat5").unwrap());
        assert!(console.has_program("bat && rm").is_err());
    }
}
