//! Interactive terminal queries.
//!
//! This is the only part of the crate that touches the live terminal.

pub mod device;
pub mod raw_mode;

pub use device::{NonInteractive, TerminalDevice, TtyDevice};
pub use raw_mode::{DEFAULT_PROBE_TIMEOUT, RawModeProbe};
