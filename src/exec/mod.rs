//! Host boundary: command presence probes and streamed child processes.
//!
//! Everything that touches `PATH` or spawns a process goes through the
//! [`Executor`] trait so operations can be exercised in tests with a
//! recording double instead of a real package manager.
mod stream;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub use stream::ChildStream;

use crate::error::ExecError;
use crate::resources::plan::InstallPlan;

/// Which pipe a line of output was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    /// The child's standard output.
    Stdout,
    /// The child's standard error.
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// One line of child output, without its line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    /// Pipe the line came from.
    pub stream: OutputStream,
    /// Line text, decoded as lossy UTF-8.
    pub text: String,
}

/// An event produced while a plan runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    /// A line of output, in the order the child wrote it to that pipe.
    Line(OutputLine),
    /// The child has exited. Always the last event of a stream.
    ///
    /// `code` is `None` when the child was ended by a signal.
    Exited {
        /// Exit status code, if any.
        code: Option<i32>,
    },
}

/// Lazy, finite sequence of events from one running plan.
///
/// Dropping the stream before [`ExecEvent::Exited`] terminates the child.
pub type ExecStream = Box<dyn Iterator<Item = ExecEvent> + Send>;

/// Boundary between the engine and the host.
pub trait Executor: Send + Sync + fmt::Debug {
    /// Whether a command named `program` resolves on `PATH`.
    ///
    /// Absence is a normal `false`, never an error.
    fn which(&self, program: &str) -> bool;

    /// Start `plan` and return its event stream.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::LaunchFailed`] if the process cannot be started.
    fn spawn(&self, plan: &InstallPlan) -> Result<ExecStream, ExecError>;
}

/// Executor backed by the real `PATH` and real child processes.
#[derive(Debug, Clone, Default)]
pub struct SystemExecutor {
    cancel: Option<Arc<AtomicBool>>,
}

impl SystemExecutor {
    /// Executor without a cancel flag.
    #[must_use]
    pub const fn new() -> Self {
        Self { cancel: None }
    }

    /// Terminate running children as soon as `flag` becomes `true`.
    #[must_use]
    pub fn with_cancel(flag: Arc<AtomicBool>) -> Self {
        Self { cancel: Some(flag) }
    }
}

impl Executor for SystemExecutor {
    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn spawn(&self, plan: &InstallPlan) -> Result<ExecStream, ExecError> {
        let stream = ChildStream::spawn(plan.to_command(), &plan.to_string(), self.cancel.clone())?;
        Ok(Box::new(stream))
    }
}
