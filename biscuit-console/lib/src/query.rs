//! Synchronous external-command execution.
//!
//! The version detector, the executable-presence detector and the OS color
//! scheme queries all need to run a short-lived program and look at its exit
//! code and output. They go through [`CommandRunner`] so that tests can
//! substitute canned results.
//!
//! A runner never returns an error. Spawn failures, signals and timeouts all
//! collapse to an exit code of `-1`.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// Default timeout for platform queries.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(1000);

/// How often a running child is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Options for a single command invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Hard limit; the child is killed when it elapses.
    pub timeout: Duration,
    /// Send the child's stderr to the null device.
    pub discard_stderr: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_COMMAND_TIMEOUT,
            discard_stderr: false,
        }
    }
}

impl RunOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    pub fn quiet(mut self) -> Self {
        self.discard_stderr = true;
        self
    }
}

/// The result of running an external command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Exit code, or `-1` when there is none (spawn failure, signal, timeout).
    pub exit_code: i32,
    /// Standard output with one trailing newline removed.
    pub stdout: String,
    /// Standard error with one trailing newline removed.
    pub stderr: String,
}

impl CommandOutput {
    /// The output of a command that could not be run at all.
    pub fn failed() -> Self {
        Self {
            exit_code: -1,
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs external commands.
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &str, args: &[&str], options: &RunOptions) -> CommandOutput;
}

/// Runs commands with [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &str, args: &[&str], options: &RunOptions) -> CommandOutput {
        let stderr = if options.discard_stderr {
            Stdio::null()
        } else {
            Stdio::piped()
        };

        let mut child = match Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(stderr)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!(command, error = %e, "Failed to spawn command");
                return CommandOutput::failed();
            }
        };

        let deadline = Instant::now() + options.timeout;

        // Drain both pipes on their own threads so a chatty child can't
        // block on a full pipe while we wait for it.
        let (tx, rx) = mpsc::channel();
        let mut open = 0;
        if let Some(out) = child.stdout.take() {
            spawn_reader(out, Stream::Stdout, tx.clone());
            open += 1;
        }
        if let Some(err) = child.stderr.take() {
            spawn_reader(err, Stream::Stderr, tx.clone());
            open += 1;
        }
        drop(tx);

        let Some(exit_code) = wait_with_deadline(&mut child, deadline, options.timeout, command)
        else {
            // a grandchild may still hold the pipes open; leave the readers detached
            return CommandOutput::failed();
        };

        let (stdout, stderr) = collect_output(&rx, open, deadline, command);

        tracing::trace!(command, ?args, exit_code, "Command finished");

        CommandOutput {
            exit_code,
            stdout: trim_trailing_newline(&stdout).to_string(),
            stderr: trim_trailing_newline(&stderr).to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

enum Chunk {
    Data(Stream, Vec<u8>),
    Closed,
}

fn spawn_reader<R: Read + Send + 'static>(mut source: R, stream: Stream, tx: Sender<Chunk>) {
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            // a read error just truncates what we captured
            match source.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send(Chunk::Data(stream, buf[..n].to_vec())).is_err() {
                        return;
                    }
                }
            }
        }
        let _ = tx.send(Chunk::Closed);
    });
}

/// Gathers pipe output until every reader reaches EOF or `deadline` passes.
///
/// Background processes started by the child inherit its pipes and can keep
/// them open indefinitely; whatever arrived before the deadline is kept.
fn collect_output(
    rx: &Receiver<Chunk>,
    mut open: usize,
    deadline: Instant,
    command: &str,
) -> (String, String) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    while open > 0 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(Chunk::Data(Stream::Stdout, bytes)) => stdout.extend_from_slice(&bytes),
            Ok(Chunk::Data(Stream::Stderr, bytes)) => stderr.extend_from_slice(&bytes),
            Ok(Chunk::Closed) => open -= 1,
            Err(RecvTimeoutError::Timeout) => {
                tracing::debug!(command, "Output still open at deadline; keeping partial output");
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    (
        String::from_utf8_lossy(&stdout).into_owned(),
        String::from_utf8_lossy(&stderr).into_owned(),
    )
}

/// Waits for `child` until `deadline`.
///
/// Returns `None` when the child had to be killed.
fn wait_with_deadline(
    child: &mut Child,
    deadline: Instant,
    timeout: Duration,
    command: &str,
) -> Option<i32> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status.code().unwrap_or(-1)),
            Ok(None) if Instant::now() >= deadline => {
                tracing::debug!(command, ?timeout, "Command timed out; killing it");
                break;
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                tracing::debug!(command, error = %e, "Failed to wait on command");
                break;
            }
        }
    }
    let _ = child.kill();
    let _ = child.wait();
    None
}

/// Removes exactly one trailing `\n` (or `\r\n`).
pub fn trim_trailing_newline(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}
