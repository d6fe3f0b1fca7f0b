//! Scripted fakes for the device and command runner.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::probe::device::TerminalDevice;
use crate::query::{CommandOutput, CommandRunner, RunOptions};

/// A terminal that answers known queries with canned chunks.
#[derive(Default)]
pub(crate) struct FakeDevice {
    interactive: bool,
    fail_raw_mode: bool,
    fail_restore: bool,
    columns: Option<u16>,
    read_delay: Duration,
    replies: HashMap<String, Vec<String>>,
    pending: Mutex<VecDeque<Vec<u8>>>,
    writes: Mutex<Vec<String>>,
    enters: AtomicUsize,
    restores: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl FakeDevice {
    pub fn interactive() -> Self {
        Self {
            interactive: true,
            ..Self::default()
        }
    }

    pub fn non_interactive() -> Self {
        Self::default()
    }

    /// Answer `query` with `chunks`, delivered one per read.
    pub fn reply(mut self, query: &str, chunks: &[&str]) -> Self {
        self.replies.insert(
            query.to_string(),
            chunks.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    pub fn with_columns(mut self, columns: u16) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    pub fn failing_raw_mode(mut self) -> Self {
        self.fail_raw_mode = true;
        self
    }

    pub fn failing_restore(mut self) -> Self {
        self.fail_restore = true;
        self
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub fn enters(&self) -> usize {
        self.enters.load(Ordering::SeqCst)
    }

    pub fn restores(&self) -> usize {
        self.restores.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_raw(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

impl TerminalDevice for FakeDevice {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn enter_raw_mode(&self) -> io::Result<()> {
        if self.fail_raw_mode {
            return Err(io::Error::other("tcsetattr failed"));
        }
        self.enters.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        Ok(())
    }

    fn restore_mode(&self) -> io::Result<()> {
        self.restores.fetch_add(1, Ordering::SeqCst);
        let _ = self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if self.fail_restore {
            return Err(io::Error::other("tcsetattr failed"));
        }
        Ok(())
    }

    fn write_query(&self, query: &[u8]) -> io::Result<()> {
        let query = String::from_utf8_lossy(query).into_owned();
        if let Some(chunks) = self.replies.get(&query) {
            let mut pending = self.pending.lock().unwrap();
            pending.extend(chunks.iter().map(|c| c.as_bytes().to_vec()));
        }
        self.writes.lock().unwrap().push(query);
        Ok(())
    }

    fn read_timeout(&self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        if !self.read_delay.is_zero() {
            std::thread::sleep(self.read_delay.min(timeout));
        }
        let next = self.pending.lock().unwrap().pop_front();
        match next {
            Some(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                Ok(n)
            }
            None => {
                std::thread::sleep(timeout.min(Duration::from_millis(2)));
                Ok(0)
            }
        }
    }

    fn columns(&self) -> Option<u16> {
        self.columns
    }
}

/// A command runner with canned outputs keyed by the full command line.
///
/// Unknown command lines produce a failed (`-1`) output.
#[derive(Default)]
pub(crate) struct FakeRunner {
    outputs: HashMap<String, CommandOutput>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the output for `command_line` (command and args joined by spaces).
    pub fn on(mut self, command_line: &str, exit_code: i32, stdout: &str, stderr: &str) -> Self {
        self.outputs.insert(
            command_line.to_string(),
            CommandOutput {
                exit_code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, command: &str, args: &[&str], _options: &RunOptions) -> CommandOutput {
        let line = std::iter::once(command)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().unwrap().push(line.clone());
        self.outputs
            .get(&line)
            .cloned()
            .unwrap_or_else(CommandOutput::failed)
    }
}
