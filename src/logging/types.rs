//! Operation records and the [`Log`] trait operations write through.
use std::fmt;

use crate::exec::OutputLine;

/// Target for stage headers.
pub(super) const STAGE: &str = "jumpstart::stage";
/// Target for "would run" lines in a dry run.
pub(super) const DRY_RUN: &str = "jumpstart::dry_run";
/// Target for lines relayed from a child process.
pub(super) const OUTPUT: &str = "jumpstart::output";

/// How an operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    /// Every step was taken; exit codes are in the detail.
    Ok,
    /// Nothing configured for the operation.
    NotApplicable,
    /// The confirmation gate said no.
    Declined,
    /// Plans were shown, nothing was started.
    DryRun,
    /// The run was dropped before its summary.
    Cancelled,
    /// Planning failed, or at least one item could not be launched.
    Failed,
}

impl OperationStatus {
    /// One-character mark used in the run summary.
    #[must_use]
    pub const fn mark(self) -> char {
        match self {
            Self::Ok => '✓',
            Self::NotApplicable => '·',
            Self::Declined => '○',
            Self::DryRun => '~',
            Self::Cancelled => '!',
            Self::Failed => '✗',
        }
    }

    const fn color(self) -> &'static str {
        match self {
            Self::Ok => "\x1b[32m",
            Self::NotApplicable => "\x1b[2m",
            Self::Declined | Self::Cancelled => "\x1b[33m",
            Self::DryRun => "\x1b[36m",
            Self::Failed => "\x1b[31m",
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ok => "ok",
            Self::NotApplicable => "not applicable",
            Self::Declined => "declined",
            Self::DryRun => "dry run",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        })
    }
}

/// Outcome of one operation, kept for the end-of-run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord {
    /// Operation name, e.g. "Install tools".
    pub name: String,
    /// How it ended.
    pub status: OperationStatus,
    /// Counts or the error that stopped it.
    pub detail: Option<String>,
}

impl OperationRecord {
    /// Coloured summary line: mark, name, and detail in parentheses.
    #[must_use]
    pub fn summary_line(&self) -> String {
        let detail = self
            .detail
            .as_deref()
            .map_or_else(String::new, |d| format!(" ({d})"));
        format!(
            "{}{} {}{detail}\x1b[0m",
            self.status.color(),
            self.status.mark(),
            self.name
        )
    }
}

/// Sink for everything an operation reports.
///
/// Operations only see this trait, so tests can run them against a
/// [`Logger`](super::Logger) without a subscriber installed.
pub trait Log: Send + Sync {
    /// Section header.
    fn stage(&self, msg: &str);
    /// Normal progress.
    fn info(&self, msg: &str);
    /// Detail for the log file and `--verbose`.
    fn debug(&self, msg: &str);
    /// Something the user should look at.
    fn warn(&self, msg: &str);
    /// Something failed.
    fn error(&self, msg: &str);
    /// A step that would have run.
    fn dry_run(&self, msg: &str);
    /// One line relayed from a child process.
    fn output(&self, line: &OutputLine);
    /// Remember how an operation ended.
    fn record(&self, name: &str, status: OperationStatus, detail: Option<&str>);
}
