//! Executable presence on the `PATH`.
//!
//! Names are passed to `which` (or `where` on Windows) as a single
//! argument, never through a shell, but names containing shell
//! metacharacters are still refused outright so that a caller can't be
//! tricked into asking about `foo; rm -rf ~`.
//!
//! ## Examples
//!
//! ```
//! use std::sync::Arc;
//! use biscuit_console::discovery::context::DetectionContext;
//! use biscuit_console::discovery::programs::ProgramDetector;
//! use biscuit_console::env::MapEnv;
//! use biscuit_console::error::ConsoleError;
//! use biscuit_console::probe::NonInteractive;
//! use biscuit_console::query::SystemRunner;
//!
//! let ctx = DetectionContext::new(
//!     Arc::new(MapEnv::new()),
//!     Arc::new(SystemRunner),
//!     Arc::new(NonInteractive),
//! );
//! let programs = ProgramDetector::new();
//!
//! assert!(!programs.has_program(&ctx, "   ").unwrap());
//! assert!(matches!(
//!     programs.has_program(&ctx, "ls; whoami"),
//!     Err(ConsoleError::InvalidProgramName { character: ';', .. })
//! ));
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::discovery::context::DetectionContext;
use crate::error::{ConsoleError, Result};
use crate::query::RunOptions;

/// Characters a program name may never contain, besides C0 controls.
const DISALLOWED: &[char] = &['&', ';', '\\', '$', '>', '<', '\'', '"', '`'];

/// Checks a program name, returning the first offending character.
pub fn validate_program_name(name: &str) -> Result<()> {
    match name
        .chars()
        .find(|c| DISALLOWED.contains(c) || u32::from(*c) < 0x20)
    {
        Some(character) => Err(ConsoleError::InvalidProgramName {
            name: name.to_string(),
            character,
        }),
        None => Ok(()),
    }
}

/// Looks up executables and remembers every answer.
///
/// Lookups are case-sensitive. The cache lock is held across the lookup,
/// so concurrent first calls never start more than one subprocess.
#[derive(Debug, Default)]
pub struct ProgramDetector {
    cache: Mutex<HashMap<String, bool>>,
}

impl ProgramDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` resolves to an executable.
    ///
    /// ## Errors
    ///
    /// Returns [`ConsoleError::InvalidProgramName`] for names with shell
    /// metacharacters or control characters. No subprocess is started.
    pub fn has_program(&self, ctx: &DetectionContext, name: &str) -> Result<bool> {
        validate_program_name(name)?;
        if name.trim().is_empty() {
            return Ok(false);
        }

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(found) = cache.get(name) {
            return Ok(*found);
        }

        let finder = if ctx.os.is_windows() { "where" } else { "which" };
        let output = ctx.runner.run(
            finder,
            &[name],
            &RunOptions::with_timeout(ctx.options.command_timeout).quiet(),
        );
        let found = output.success();
        tracing::debug!(program = %name, found, finder, "Looked up program");

        cache.insert(name.to_string(), found);
        Ok(found)
    }

    pub fn reset(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
