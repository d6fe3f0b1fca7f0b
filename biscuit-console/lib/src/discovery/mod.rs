//! Terminal capability detection.
//!
//! Each capability has a detector that owns its own cache and walks a
//! priority-ordered list of sources: explicit overrides, environment
//! variables, platform commands, interactive terminal queries and finally
//! a static default. All of them read the outside world through a
//! [`DetectionContext`](context::DetectionContext).

pub mod app_version;
pub mod color_depth;
pub mod color_scheme;
pub mod context;
pub mod detection;
pub mod link_support;
pub mod os_detection;
pub mod programs;
pub mod width;

pub use app_version::{AppVersion, AppVersionDetector};
pub use color_depth::{ColorDepth, ColorDepthDetector};
pub use color_scheme::{ColorScheme, ColorSchemeDetector};
pub use context::{DetectOptions, DetectionContext};
pub use detection::{TerminalApp, detect_terminal_app, is_running_in_wsl};
pub use link_support::{KONSOLE_OSC8_SUPPORT, LinkSupportDetector};
pub use os_detection::{OsType, detect_os_type, os_arch};
pub use programs::ProgramDetector;
pub use width::AvailableWidthDetector;
