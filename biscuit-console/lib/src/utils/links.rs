//! OSC8 hyperlink builders.
//!
//! These only build the escape sequence. Whether the terminal will render
//! it as a clickable link is answered by
//! [`LinkSupportDetector`](crate::discovery::link_support::LinkSupportDetector).

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ConsoleError, Result};
use crate::utils::escape_codes::osc8_link;

static LINE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+):(\d+)$").expect("Invalid line suffix regex"));

/// Links `text` to an arbitrary URI.
pub fn link<T: AsRef<str>, U: AsRef<str>>(text: T, uri: U) -> String {
    osc8_link(text, uri)
}

/// Links `text` to a web URL.
///
/// When `url` is `None` the text itself is the target. A target without a
/// scheme gets `https://` prepended.
///
/// ## Examples
///
/// ```
/// use biscuit_console::utils::links::url_link;
///
/// assert_eq!(
///     url_link("example.com", None),
///     "\x1b]8;;https://example.com\x1b\\example.com\x1b]8;;\x1b\\"
/// );
/// ```
pub fn url_link<T: AsRef<str>>(text: T, url: Option<&str>) -> String {
    let target = url.unwrap_or(text.as_ref());
    let target = if target.contains("://") {
        target.to_string()
    } else {
        format!("https://{target}")
    };
    osc8_link(text, target)
}

/// Links `text` to a file on disk.
///
/// - `None` returns the text unchanged (not clickable).
/// - A leading `file://` is ignored.
/// - A trailing `:<line>` is kept on the link target.
/// - The path is made absolute against the current directory. If that does
///   not exist and the path starts with `/`, it is retried as relative to
///   the current directory (so `/src/lib.rs` can mean "the project's
///   `src/lib.rs`").
///
/// ## Errors
///
/// Returns [`ConsoleError::InvalidFilePath`] when neither candidate exists.
pub fn file_link<T: AsRef<str>>(text: T, path: Option<&str>) -> Result<String> {
    let Some(path) = path else {
        return Ok(text.as_ref().to_string());
    };

    let clean = path.strip_prefix("file://").unwrap_or(path);
    let (file, line) = match LINE_SUFFIX_RE.captures(clean) {
        Some(caps) => (
            caps.get(1).map_or(clean, |m| m.as_str()),
            caps.get(2).map(|m| m.as_str()),
        ),
        None => (clean, None),
    };

    let mut full = std::path::absolute(file)?;
    if !full.exists() {
        if let Some(relative) = file.strip_prefix('/') {
            full = std::path::absolute(relative)?;
        }
    }

    if !full.exists() {
        tracing::debug!(path = %full.display(), "File link target does not exist");
        return Err(ConsoleError::InvalidFilePath(full));
    }

    let target = match line {
        Some(line) => format!("file://{}:{line}", display_path(&full)),
        None => format!("file://{}", display_path(&full)),
    };
    Ok(osc8_link(text, target))
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
