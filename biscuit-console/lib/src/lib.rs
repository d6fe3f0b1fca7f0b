//! # biscuit-console
//!
//! Terminal capability detection and escape-sequence utilities for CLI tools.
//!
//! - **Color scheme**: light or dark background, from overrides, the
//!   terminal itself (OSC 11), desktop hints or the OS appearance setting
//! - **Color depth**: 8, 16, 256 or 24-bit color
//! - **Width**: available columns, with a caller-supplied fallback
//! - **Terminal identity**: which terminal app is running, and its version
//! - **Hyperlinks**: whether OSC 8 links are rendered
//! - **Programs**: whether an executable is on the `PATH`
//! - **Formatting**: colored text, boxes, hyperlinks, and stripping all of
//!   it back out
//!
//! ## Quick Start
//!
//! ```no_run
//! use biscuit_console::console;
//!
//! let console = console();
//! println!("Running in {}", console.terminal_app());
//! println!("{} columns, {} colors", console.available_width(), console.color_depth().colors());
//!
//! if console.link_support() == Some(true) {
//!     println!("{}", biscuit_console::utils::links::link("docs", "https://docs.rs"));
//! }
//! ```
//!
//! ## Modules
//!
//! - [`console`] - The [`Console`](console::Console) aggregate and [`console()`]
//! - [`discovery`] - One detector per capability
//! - [`probe`] - Raw-mode request/response round trips with the terminal
//! - [`query`] - Running platform commands with a timeout
//! - [`env`] - Environment access, swappable in tests
//! - [`cache`] - Process-lifetime memo cells
//! - [`utils`] - Escape codes, colors, styling, boxes and links

use std::sync::LazyLock;

pub mod cache;
pub mod console;
pub mod discovery;
pub mod env;
pub mod error;
pub mod probe;
pub mod query;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use error::{ConsoleError, Result};

static CONSOLE: LazyLock<console::Console> = LazyLock::new(console::Console::system);

/// The process-wide console over the real environment and `/dev/tty`.
///
/// Created on first use. Call [`Console::reset`](console::Console::reset)
/// to forget what it has detected.
pub fn console() -> &'static console::Console {
    &CONSOLE
}
