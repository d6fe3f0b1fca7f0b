//! Single request/response round trips against the terminal.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::probe::device::TerminalDevice;

/// Default time to wait for a terminal to answer a query.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(100);

const READ_CHUNK: usize = 256;

/// Pause after an empty read that returned before the deadline (a hung up
/// tty polls readable forever).
const EMPTY_READ_BACKOFF: Duration = Duration::from_millis(5);

/// Sends a query to the terminal in raw mode and collects the reply.
///
/// Only one probe runs at a time per `RawModeProbe`: the gate is held for
/// the whole round trip, so replies to two queries can never interleave on
/// the same input stream.
pub struct RawModeProbe {
    device: Arc<dyn TerminalDevice>,
    gate: Mutex<()>,
}

impl std::fmt::Debug for RawModeProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawModeProbe")
            .field("interactive", &self.device.is_interactive())
            .finish_non_exhaustive()
    }
}

/// Restores the terminal mode when dropped.
struct RestoreGuard<'a> {
    device: &'a dyn TerminalDevice,
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.device.restore_mode() {
            tracing::warn!(error = %e, "Failed to restore terminal mode after probe");
        }
    }
}

impl RawModeProbe {
    pub fn new(device: Arc<dyn TerminalDevice>) -> Self {
        Self {
            device,
            gate: Mutex::new(()),
        }
    }

    /// The underlying device.
    pub fn device(&self) -> &dyn TerminalDevice {
        self.device.as_ref()
    }

    pub fn is_interactive(&self) -> bool {
        self.device.is_interactive()
    }

    /// Writes `query` and accumulates the reply until `is_complete` accepts it.
    ///
    /// Returns `None` without touching the device when it is not
    /// interactive, and `None` when the reply is incomplete at `timeout`.
    /// Input is decoded lossily as UTF-8. The previous input mode is restored
    /// on every path out of this function, and a failure to restore it is
    /// logged, never returned.
    ///
    /// ## Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use biscuit_console::probe::{NonInteractive, RawModeProbe, DEFAULT_PROBE_TIMEOUT};
    ///
    /// let probe = RawModeProbe::new(Arc::new(NonInteractive));
    /// let reply = probe.probe("\x1b]11;?\x1b\\", DEFAULT_PROBE_TIMEOUT, |r| r.ends_with('\x07'));
    /// assert!(reply.is_none());
    /// ```
    pub fn probe(
        &self,
        query: &str,
        timeout: Duration,
        is_complete: impl Fn(&str) -> bool,
    ) -> Option<String> {
        if !self.device.is_interactive() {
            tracing::trace!(query = ?query, "Skipping probe: terminal is not interactive");
            return None;
        }

        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);

        if let Err(e) = self.device.enter_raw_mode() {
            tracing::debug!(error = %e, "Failed to enter raw mode");
            if let Err(e) = self.device.restore_mode() {
                tracing::warn!(error = %e, "Failed to restore terminal mode");
            }
            return None;
        }
        let _restore = RestoreGuard {
            device: self.device.as_ref(),
        };

        if let Err(e) = self.device.write_query(query.as_bytes()) {
            tracing::debug!(error = %e, query = ?query, "Failed to write probe query");
            return None;
        }

        let deadline = Instant::now() + timeout;
        let mut received = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::debug!(
                    query = ?query,
                    received = ?String::from_utf8_lossy(&received),
                    ?timeout,
                    "Probe timed out"
                );
                return None;
            }

            match self.device.read_timeout(&mut chunk, remaining) {
                Ok(0) => std::thread::sleep(remaining.min(EMPTY_READ_BACKOFF)),
                Ok(n) => {
                    received.extend_from_slice(&chunk[..n]);
                    let text = String::from_utf8_lossy(&received);
                    if is_complete(&text) {
                        tracing::trace!(query = ?query, response = ?text, "Probe completed");
                        return Some(text.into_owned());
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Failed to read probe response");
                    return None;
                }
            }
        }
    }
}
