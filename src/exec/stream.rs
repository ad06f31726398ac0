//! Streaming child process with terminate-on-drop.
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{ExecEvent, OutputLine, OutputStream};
use crate::error::ExecError;

/// How often a blocked consumer re-checks the cancel flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Time a child gets to exit after SIGTERM before it is killed.
const TERMINATE_GRACE: Duration = Duration::from_secs(3);

/// A running child whose output is read line by line.
///
/// On Unix the child leads its own process group, so terminating the stream
/// also reaches every process a shell script started. Two reader threads forward stdout and stderr lines over a channel; the
/// iterator yields them as they arrive and ends with a single
/// [`ExecEvent::Exited`] once both pipes have closed and the child has been
/// reaped. Dropping the stream early terminates the child.
#[derive(Debug)]
pub struct ChildStream {
    child: Child,
    label: String,
    lines: Receiver<OutputLine>,
    readers: Vec<JoinHandle<()>>,
    cancel: Option<Arc<AtomicBool>>,
    finished: bool,
}

impl ChildStream {
    /// Spawn `command` with stdin closed and both output pipes captured,
    /// in a new process group.
    ///
    /// `label` names the process in logs and errors.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::LaunchFailed`] if the process or its reader
    /// threads cannot be started.
    pub fn spawn(
        mut command: Command,
        label: &str,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<Self, ExecError> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt as _;
            command.process_group(0);
        }

        let child = command.spawn().map_err(|source| ExecError::LaunchFailed {
            program: label.to_string(),
            source,
        })?;
        tracing::debug!("spawned '{label}' (pid {})", child.id());

        let (tx, lines) = mpsc::channel();
        let mut stream = Self {
            readers: Vec::with_capacity(2),
            child,
            label: label.to_string(),
            lines,
            cancel,
            finished: false,
        };

        let stdout = stream.child.stdout.take();
        let stderr = stream.child.stderr.take();
        for (pipe, kind) in [
            (stdout.map(|p| Box::new(p) as Box<dyn Read + Send>), OutputStream::Stdout),
            (stderr.map(|p| Box::new(p) as Box<dyn Read + Send>), OutputStream::Stderr),
        ] {
            let Some(pipe) = pipe else { continue };
            match spawn_reader(pipe, kind, tx.clone()) {
                Ok(handle) => stream.readers.push(handle),
                Err(source) => {
                    // Dropping `stream` terminates the child.
                    return Err(ExecError::LaunchFailed {
                        program: label.to_string(),
                        source,
                    });
                }
            }
        }

        Ok(stream)
    }

    /// OS process id of the child.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    fn join_readers(&mut self) {
        for handle in self.readers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("output reader for '{}' panicked", self.label);
            }
        }
    }

    /// Ask the process group to stop, then force it after [`TERMINATE_GRACE`].
    ///
    /// The group is killed even when the direct child exits in time, since
    /// pipeline members can outlive the shell that started them.
    fn terminate(&mut self) {
        let pgid = self.child.id();
        if matches!(self.child.try_wait(), Ok(Some(_))) {
            signal_group(pgid, true);
            return;
        }
        tracing::debug!("terminating '{}' (process group {pgid})", self.label);

        if signal_group(pgid, false) {
            let deadline = Instant::now() + TERMINATE_GRACE;
            while Instant::now() < deadline {
                if matches!(self.child.try_wait(), Ok(Some(_))) {
                    signal_group(pgid, true);
                    return;
                }
                thread::sleep(Duration::from_millis(50));
            }
        }

        signal_group(pgid, true);
        if let Err(e) = self.child.kill() {
            tracing::debug!("kill '{}' returned error (may have exited): {e}", self.label);
        }
        if let Err(e) = self.child.wait() {
            tracing::warn!("failed to reap '{}' after kill: {e}", self.label);
        }
    }
}

impl Iterator for ChildStream {
    type Item = ExecEvent;

    fn next(&mut self) -> Option<ExecEvent> {
        if self.finished {
            return None;
        }

        loop {
            if self.is_cancelled() {
                self.terminate();
                self.finished = true;
                return Some(ExecEvent::Exited { code: None });
            }
            match self.lines.recv_timeout(POLL_INTERVAL) {
                Ok(line) => return Some(ExecEvent::Line(line)),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.join_readers();
        let code = match self.child.wait() {
            Ok(status) => status.code(),
            Err(e) => {
                tracing::warn!("failed to wait for '{}': {e}", self.label);
                None
            }
        };
        self.finished = true;
        Some(ExecEvent::Exited { code })
    }
}

impl Drop for ChildStream {
    fn drop(&mut self) {
        if !self.finished {
            self.terminate();
        }
    }
}

fn spawn_reader(
    pipe: Box<dyn Read + Send>,
    stream: OutputStream,
    tx: Sender<OutputLine>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("{stream}-reader"))
        .spawn(move || read_lines(pipe, stream, &tx))
}

/// Forward each line of `pipe` until EOF, an I/O error, or a gone receiver.
///
/// Binary data is decoded lossily and a trailing CR is trimmed.
fn read_lines<R: Read>(pipe: R, stream: OutputStream, tx: &Sender<OutputLine>) {
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let raw = buf.strip_suffix(b"\n").unwrap_or(&buf);
                let text = String::from_utf8_lossy(raw);
                let line = OutputLine {
                    stream,
                    text: text.trim_end_matches('\r').to_string(),
                };
                if tx.send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!("{stream} read error, stopping: {e}");
                break;
            }
        }
    }
}

/// Send SIGTERM, or SIGKILL when `force`, to every process in `pgid`.
///
/// Returns `false` if the group is already gone.
#[cfg(unix)]
fn signal_group(pgid: u32, force: bool) -> bool {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pgid) else {
        return false;
    };
    let sig = if force { Signal::SIGKILL } else { Signal::SIGTERM };
    signal::kill(Pid::from_raw(-raw), sig).is_ok()
}

#[cfg(not(unix))]
const fn signal_group(_pgid: u32, _force: bool) -> bool {
    false
}
