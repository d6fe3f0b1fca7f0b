//! Operating system identification.
//!
//! The color scheme detector needs to know which native theme query to run
//! (`defaults`, `reg` or `gsettings`), which binaries exist at which
//! well-known paths, and whether `which` or `where` finds programs.
//!
//! ## Examples
//!
//! ```
//! use biscuit_console::discovery::os_detection::{detect_os_type, os_arch, OsType};
//!
//! let os = detect_os_type();
//! if os == OsType::MacOS {
//!     println!("Running on macOS ({})", os_arch());
//! }
//! ```

use std::env;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// The detected operating system type.
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
pub enum OsType {
    Windows,
    Linux,
    #[strum(serialize = "macOS")]
    MacOS,
    FreeBSD,
    NetBSD,
    OpenBSD,
    #[strum(serialize = "DragonFly BSD")]
    DragonFly,
    #[strum(serialize = "illumos")]
    Illumos,
    Android,
    #[strum(serialize = "iOS")]
    Ios,
    Unknown,
}

impl OsType {
    /// Maps a `std::env::consts::OS` value to an `OsType`.
    pub fn from_target(os: &str) -> Self {
        match os {
            "windows" => OsType::Windows,
            "linux" => OsType::Linux,
            "macos" => OsType::MacOS,
            "freebsd" => OsType::FreeBSD,
            "netbsd" => OsType::NetBSD,
            "openbsd" => OsType::OpenBSD,
            "dragonfly" => OsType::DragonFly,
            "illumos" | "solaris" => OsType::Illumos,
            "android" => OsType::Android,
            "ios" => OsType::Ios,
            _ => OsType::Unknown,
        }
    }

    pub fn is_windows(self) -> bool {
        self == OsType::Windows
    }
}

/// Detect the operating system this binary was built for.
pub fn detect_os_type() -> OsType {
    OsType::from_target(env::consts::OS)
}

/// The `os/arch` pair, e.g. `linux/x86_64` or `macos/aarch64`.
pub fn os_arch() -> String {
    format!("{}/{}", env::consts::OS, env::consts::ARCH)
}
