//! Everything a detector reads from the outside world.

use std::sync::Arc;
use std::time::Duration;

use crate::discovery::os_detection::{OsType, detect_os_type};
use crate::env::{Environment, ProcessEnv};
use crate::probe::{DEFAULT_PROBE_TIMEOUT, RawModeProbe, TerminalDevice, TtyDevice};
use crate::query::{CommandRunner, DEFAULT_COMMAND_TIMEOUT, SystemRunner};

/// Width reported when nothing else knows better.
pub const DEFAULT_FALLBACK_WIDTH: u32 = 80;

/// Tunables shared by all detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectOptions {
    /// How long an interactive probe waits for the terminal to answer.
    pub probe_timeout: Duration,
    /// How long an external command may run before it is killed.
    pub command_timeout: Duration,
    /// Width used when no source reports one.
    pub fallback_width: u32,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            fallback_width: DEFAULT_FALLBACK_WIDTH,
        }
    }
}

/// The injected environment, command runner and terminal device.
///
/// ## Examples
///
/// ```
/// use std::sync::Arc;
/// use biscuit_console::discovery::context::DetectionContext;
/// use biscuit_console::discovery::os_detection::OsType;
/// use biscuit_console::env::MapEnv;
/// use biscuit_console::probe::NonInteractive;
/// use biscuit_console::query::SystemRunner;
///
/// let ctx = DetectionContext::new(
///     Arc::new(MapEnv::new().with("COLUMNS", "120")),
///     Arc::new(SystemRunner),
///     Arc::new(NonInteractive),
/// )
/// .with_os(OsType::Linux);
///
/// assert_eq!(ctx.os, OsType::Linux);
/// ```
pub struct DetectionContext {
    pub env: Arc<dyn Environment>,
    pub runner: Arc<dyn CommandRunner>,
    pub probe: RawModeProbe,
    pub os: OsType,
    pub options: DetectOptions,
}

impl std::fmt::Debug for DetectionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionContext")
            .field("probe", &self.probe)
            .field("os", &self.os)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl DetectionContext {
    pub fn new(
        env: Arc<dyn Environment>,
        runner: Arc<dyn CommandRunner>,
        device: Arc<dyn TerminalDevice>,
    ) -> Self {
        Self {
            env,
            runner,
            probe: RawModeProbe::new(device),
            os: detect_os_type(),
            options: DetectOptions::default(),
        }
    }

    /// The real process environment, `std::process` and `/dev/tty`.
    pub fn system() -> Self {
        Self::new(
            Arc::new(ProcessEnv),
            Arc::new(SystemRunner),
            Arc::new(TtyDevice::open()),
        )
    }

    pub fn with_os(mut self, os: OsType) -> Self {
        self.os = os;
        self
    }

    pub fn with_options(mut self, options: DetectOptions) -> Self {
        self.options = options;
        self
    }
}
