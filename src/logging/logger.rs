//! The [`Logger`]: `tracing` events plus a record of every operation.
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::types::{DRY_RUN, Log, OUTPUT, OperationRecord, OperationStatus, STAGE};
use super::utils::log_path;
use crate::exec::{OutputLine, OutputStream};

/// Routes messages to `tracing` and remembers how each operation ended.
///
/// The file sink itself is installed by
/// [`init_subscriber`](super::init_subscriber); the logger only knows where
/// it is so the summary can point at it.
#[derive(Debug)]
pub struct Logger {
    records: Mutex<Vec<OperationRecord>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Logger for the subcommand `command` (names the log file).
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            log_file: log_path(command),
        }
    }

    /// Where this run's log file lives, if one could be created.
    #[must_use]
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Every operation recorded so far, in order.
    #[must_use]
    pub fn records(&self) -> Vec<OperationRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of operations that ended [`OperationStatus::Failed`].
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.status == OperationStatus::Failed)
            .count()
    }

    /// Log one line per recorded operation under a "Summary" stage.
    ///
    /// Silent when nothing was recorded.
    pub fn print_summary(&self) {
        let records = self.records();
        if records.is_empty() {
            return;
        }
        self.stage("Summary");
        for record in &records {
            self.info(&record.summary_line());
        }
        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mfull log: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE, "{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN, "{msg}");
    }

    fn output(&self, line: &OutputLine) {
        let stderr = line.stream == OutputStream::Stderr;
        tracing::info!(target: OUTPUT, stderr, "{}", line.text);
    }

    fn record(&self, name: &str, status: OperationStatus, detail: Option<&str>) {
        self.debug(&format!("{name}: {status}"));
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(OperationRecord {
                name: name.to_string(),
                status,
                detail: detail.map(String::from),
            });
    }
}
