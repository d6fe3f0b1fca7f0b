//! The terminal device used by interactive probes.
//!
//! [`TerminalDevice`] is the narrow capability the probe needs: check for a
//! TTY, switch input modes, write a query and read the reply with a
//! timeout. The real implementation talks to `/dev/tty`; tests substitute
//! a scripted fake.

use std::io;
use std::time::Duration;

use terminal_size::{Width, terminal_size};

/// Access to the controlling terminal.
pub trait TerminalDevice: Send + Sync {
    /// Whether both standard input and standard output are attached to a
    /// terminal. Nothing else on this trait is called when this is false.
    fn is_interactive(&self) -> bool;

    /// Records the current input mode and switches to raw input
    /// (no line buffering, no echo).
    fn enter_raw_mode(&self) -> io::Result<()>;

    /// Restores the mode recorded by [`enter_raw_mode`](Self::enter_raw_mode).
    ///
    /// A no-op when no mode was recorded.
    fn restore_mode(&self) -> io::Result<()>;

    /// Writes a query sequence and flushes it.
    fn write_query(&self, query: &[u8]) -> io::Result<()>;

    /// Reads whatever input arrives within `timeout`.
    ///
    /// Returns `Ok(0)` when nothing arrived in time.
    fn read_timeout(&self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;

    /// The column count the terminal reports for the output stream.
    fn columns(&self) -> Option<u16>;
}

/// A device that is never interactive (pipes, CI, tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

impl TerminalDevice for NonInteractive {
    fn is_interactive(&self) -> bool {
        false
    }

    fn enter_raw_mode(&self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "not a terminal"))
    }

    fn restore_mode(&self) -> io::Result<()> {
        Ok(())
    }

    fn write_query(&self, _query: &[u8]) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "not a terminal"))
    }

    fn read_timeout(&self, _buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
        Ok(0)
    }

    fn columns(&self) -> Option<u16> {
        None
    }
}

/// Reported column count of the real terminal, via `terminal_size`.
fn reported_columns() -> Option<u16> {
    terminal_size().map(|(Width(w), _)| w).filter(|w| *w > 0)
}

#[cfg(unix)]
pub use unix::TtyDevice;

#[cfg(unix)]
mod unix {
    use std::fs::{File, OpenOptions};
    use std::io::{self, IsTerminal, Write};
    use std::os::unix::io::AsRawFd;
    use std::sync::{Mutex, PoisonError};
    use std::time::Duration;

    use super::{TerminalDevice, reported_columns};

    /// The controlling terminal, opened through `/dev/tty`.
    pub struct TtyDevice {
        tty: Option<File>,
        saved: Mutex<Option<libc::termios>>,
    }

    impl std::fmt::Debug for TtyDevice {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("TtyDevice")
                .field("tty", &self.tty)
                .finish_non_exhaustive()
        }
    }

    impl Default for TtyDevice {
        fn default() -> Self {
            Self::open()
        }
    }

    impl TtyDevice {
        /// Opens `/dev/tty`. Failure is not an error: the device just
        /// reports itself as non-interactive.
        pub fn open() -> Self {
            let tty = OpenOptions::new()
                .read(true)
                .write(true)
                .open("/dev/tty")
                .inspect_err(|e| tracing::debug!(error = %e, "Failed to open /dev/tty"))
                .ok();
            Self {
                tty,
                saved: Mutex::new(None),
            }
        }

        fn tty(&self) -> io::Result<&File> {
            self.tty
                .as_ref()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no controlling terminal"))
        }
    }

    impl TerminalDevice for TtyDevice {
        fn is_interactive(&self) -> bool {
            self.tty.is_some() && io::stdin().is_terminal() && io::stdout().is_terminal()
        }

        fn enter_raw_mode(&self) -> io::Result<()> {
            let fd = self.tty()?.as_raw_fd();

            let mut original: libc::termios = unsafe { std::mem::zeroed() };
            // SAFETY: fd is an open terminal and `original` is a valid termios
            if unsafe { libc::tcgetattr(fd, &mut original) } != 0 {
                return Err(io::Error::last_os_error());
            }

            let mut raw = original;
            raw.c_lflag &= !(libc::ICANON | libc::ECHO);
            raw.c_cc[libc::VMIN] = 0;
            raw.c_cc[libc::VTIME] = 0;

            // SAFETY: as above
            if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &raw) } != 0 {
                return Err(io::Error::last_os_error());
            }

            *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = Some(original);
            Ok(())
        }

        fn restore_mode(&self) -> io::Result<()> {
            let Some(original) = self
                .saved
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
            else {
                return Ok(());
            };
            let fd = self.tty()?.as_raw_fd();
            // SAFETY: fd is an open terminal and `original` came from tcgetattr
            if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &original) } != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        }

        fn write_query(&self, query: &[u8]) -> io::Result<()> {
            let mut tty = self.tty()?;
            tty.write_all(query)?;
            tty.flush()
        }

        fn read_timeout(&self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
            let fd = self.tty()?.as_raw_fd();
            let mut pfd = libc::pollfd {
                fd,
                events: libc::POLLIN,
                revents: 0,
            };
            let millis = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);

            // SAFETY: one valid pollfd
            let ready = unsafe { libc::poll(&mut pfd, 1, millis) };
            if ready < 0 {
                let err = io::Error::last_os_error();
                return if err.kind() == io::ErrorKind::Interrupted {
                    Ok(0)
                } else {
                    Err(err)
                };
            }
            if ready == 0 || pfd.revents & libc::POLLIN == 0 {
                return Ok(0);
            }

            // SAFETY: buf is valid for buf.len() bytes
            let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
            if n < 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(n as usize)
        }

        fn columns(&self) -> Option<u16> {
            reported_columns()
        }
    }
}

#[cfg(not(unix))]
pub use fallback::TtyDevice;

#[cfg(not(unix))]
mod fallback {
    use std::io;
    use std::time::Duration;

    use super::{NonInteractive, TerminalDevice, reported_columns};

    /// On platforms without termios the device only reports its size;
    /// interactive probes are skipped.
    #[derive(Debug, Default)]
    pub struct TtyDevice;

    impl TtyDevice {
        pub fn open() -> Self {
            Self
        }
    }

    impl TerminalDevice for TtyDevice {
        fn is_interactive(&self) -> bool {
            false
        }

        fn enter_raw_mode(&self) -> io::Result<()> {
            NonInteractive.enter_raw_mode()
        }

        fn restore_mode(&self) -> io::Result<()> {
            Ok(())
        }

        fn write_query(&self, query: &[u8]) -> io::Result<()> {
            NonInteractive.write_query(query)
        }

        fn read_timeout(&self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
            NonInteractive.read_timeout(buf, timeout)
        }

        fn columns(&self) -> Option<u16> {
            reported_columns()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_interactive_device() {
        let device = NonInteractive;
        assert!(!device.is_interactive());
        assert!(device.enter_raw_mode().is_err());
        assert!(device.restore_mode().is_ok());
        assert!(device.write_query(b"\x1b[18t").is_err());
        let mut buf = [0u8; 8];
        assert_eq!(device.read_timeout(&mut buf, Duration::from_millis(1)).unwrap(), 0);
        assert_eq!(device.columns(), None);
    }

    #[test]
    fn test_tty_device_open_never_panics() {
        let device = TtyDevice::open();
        // under `cargo test` stdout is usually captured, so this is mostly false
        let _ = device.is_interactive();
        assert!(device.restore_mode().is_ok());
    }
}
