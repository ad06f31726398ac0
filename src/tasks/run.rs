//! The running phase of an operation: a lazy sequence of progress events.
use std::fmt::{self, Write as _};

use super::Context;
use crate::exec::{ExecEvent, ExecStream, OutputLine};
use crate::logging::OperationStatus;
use crate::resources::plan::InstallPlan;

/// One queued unit of work, decided before the operation starts running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The item is already on the host; nothing is compiled or spawned.
    AlreadyPresent {
        /// Item name.
        item: String,
    },
    /// The item's compiled plan is to be executed.
    Execute {
        /// Item name.
        item: String,
        /// Fully resolved plan.
        plan: InstallPlan,
    },
}

/// Counters for one operation run.
///
/// # Examples
///
/// ```
/// use jumpstart::tasks::RunStats;
///
/// let stats = RunStats { ran: 2, already_present: 3, ..RunStats::default() };
/// assert_eq!(stats.summary(false), "2 ran, 3 already present");
/// assert_eq!(stats.summary(true), "2 would run, 3 already present");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Plans executed (or, in a dry run, that would have been).
    pub ran: u32,
    /// Items skipped because they were already present.
    pub already_present: u32,
    /// Executed plans that reported a non-zero or missing exit code.
    pub non_zero: u32,
    /// Plans whose process could not be started.
    pub failed: u32,
}

impl RunStats {
    /// Format the summary string (e.g. "1 ran, 4 already present, 1 failed to launch").
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would run" } else { "ran" };
        let mut text = format!("{} {verb}, {} already present", self.ran, self.already_present);
        if self.non_zero > 0 {
            let _ = write!(text, ", {} exited non-zero", self.non_zero);
        }
        if self.failed > 0 {
            let _ = write!(text, ", {} failed to launch", self.failed);
        }
        text
    }
}

/// Progress reported while an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The item was already present and was skipped.
    AlreadyPresent {
        /// Item name.
        item: String,
    },
    /// Dry run: the plan that would have been executed.
    WouldRun {
        /// Item name.
        item: String,
        /// The compiled plan.
        plan: InstallPlan,
    },
    /// The item's process was started.
    Started {
        /// Item name.
        item: String,
        /// The compiled plan.
        plan: InstallPlan,
    },
    /// A line of output from the running process.
    Output(OutputLine),
    /// The item's process exited.
    Finished {
        /// Item name.
        item: String,
        /// Exit code; `None` when ended by a signal.
        code: Option<i32>,
    },
    /// The item's process could not be started. The queue continues.
    LaunchFailed {
        /// Item name.
        item: String,
        /// Human-readable cause.
        message: String,
    },
    /// Final event of every completed run.
    Summary {
        /// Totals for the run.
        stats: RunStats,
        /// Whether the run was a dry run.
        dry_run: bool,
    },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyPresent { item } => write!(f, "{item}: already present"),
            Self::WouldRun { item, plan } => write!(f, "{item}: would run {plan}"),
            Self::Started { item, plan } => write!(f, "{item}: running {plan}"),
            Self::Output(line) => f.write_str(&line.text),
            Self::Finished {
                item,
                code: Some(code),
            } => write!(f, "{item}: completed with code {code}"),
            Self::Finished { item, code: None } => write!(f, "{item}: terminated by signal"),
            Self::LaunchFailed { item, message } => write!(f, "{item}: {message}"),
            Self::Summary { stats, dry_run } => f.write_str(&stats.summary(*dry_run)),
        }
    }
}

struct Running {
    item: String,
    stream: ExecStream,
}

/// An operation past confirmation, executing its steps one at a time.
///
/// Steps are consumed front to back by index; the step list itself is never
/// modified. Nothing happens until the run is iterated. Every event is also
/// logged, so a caller that only drains the run still leaves a full record.
///
/// Dropping the run before its [`ProgressEvent::Summary`] terminates the
/// in-flight process and records the operation as cancelled.
pub struct OperationRun {
    name: String,
    steps: Vec<Step>,
    next_step: usize,
    running: Option<Running>,
    stats: RunStats,
    ctx: Context,
    recheck: bool,
    completed: bool,
}

impl fmt::Debug for OperationRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationRun")
            .field("name", &self.name)
            .field("steps", &self.steps.len())
            .field("next_step", &self.next_step)
            .field("running", &self.running.as_ref().map(|r| &r.item))
            .field("stats", &self.stats)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

impl OperationRun {
    pub(super) fn new(name: &str, steps: Vec<Step>, ctx: Context) -> Self {
        Self {
            name: name.to_string(),
            steps,
            next_step: 0,
            running: None,
            stats: RunStats::default(),
            ctx,
            recheck: false,
            completed: false,
        }
    }

    /// Probe each item again before launching it once an earlier step has
    /// run, and skip it if it appeared in the meantime.
    #[must_use]
    pub(super) fn with_presence_recheck(mut self) -> Self {
        self.recheck = true;
        self
    }

    /// Name of the operation.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The queued steps, in execution order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Totals so far.
    #[must_use]
    pub const fn stats(&self) -> RunStats {
        self.stats
    }

    fn poll_running(&mut self) -> Option<ProgressEvent> {
        let mut running = self.running.take()?;
        match running.stream.next() {
            Some(ExecEvent::Line(line)) => {
                self.ctx.log.output(&line);
                self.running = Some(running);
                Some(ProgressEvent::Output(line))
            }
            Some(ExecEvent::Exited { code }) => Some(self.finish_item(running.item, code)),
            None => Some(self.finish_item(running.item, None)),
        }
    }

    fn finish_item(&mut self, item: String, code: Option<i32>) -> ProgressEvent {
        match code {
            Some(0) => self.ctx.log.debug(&format!("{item}: exited with code 0")),
            Some(code) => {
                self.stats.non_zero += 1;
                self.ctx.log.info(&format!("{item}: exited with code {code}"));
            }
            None => {
                self.stats.non_zero += 1;
                self.ctx.log.warn(&format!("{item}: terminated by signal"));
            }
        }
        ProgressEvent::Finished { item, code }
    }

    fn start_step(&mut self, step: Step) -> ProgressEvent {
        match step {
            Step::AlreadyPresent { item } => {
                self.ctx.log.debug(&format!("ok: {item} (already present)"));
                self.stats.already_present += 1;
                ProgressEvent::AlreadyPresent { item }
            }
            Step::Execute { item, plan } if self.ctx.dry_run => {
                self.ctx.log.dry_run(&format!("would run: {plan}"));
                self.stats.ran += 1;
                ProgressEvent::WouldRun { item, plan }
            }
            Step::Execute { item, .. }
                if self.recheck && self.stats.ran > 0 && self.ctx.executor.which(&item) =>
            {
                self.ctx
                    .log
                    .debug(&format!("ok: {item} (provided by an earlier step)"));
                self.stats.already_present += 1;
                ProgressEvent::AlreadyPresent { item }
            }
            Step::Execute { item, plan } => match self.ctx.executor.spawn(&plan) {
                Ok(stream) => {
                    self.ctx.log.info(&format!("{item}: {plan}"));
                    self.stats.ran += 1;
                    self.running = Some(Running {
                        item: item.clone(),
                        stream,
                    });
                    ProgressEvent::Started { item, plan }
                }
                Err(e) => {
                    self.ctx.log.error(&format!("{item}: {e}"));
                    self.stats.failed += 1;
                    ProgressEvent::LaunchFailed {
                        item,
                        message: e.to_string(),
                    }
                }
            },
        }
    }

    fn complete(&mut self) -> ProgressEvent {
        self.completed = true;
        let summary = self.stats.summary(self.ctx.dry_run);
        self.ctx.log.info(&summary);

        let status = if self.stats.failed > 0 {
            OperationStatus::Failed
        } else if self.ctx.dry_run {
            OperationStatus::DryRun
        } else {
            OperationStatus::Ok
        };
        self.ctx.log.record(&self.name, status, Some(&summary));

        ProgressEvent::Summary {
            stats: self.stats,
            dry_run: self.ctx.dry_run,
        }
    }
}

impl Iterator for OperationRun {
    type Item = ProgressEvent;

    fn next(&mut self) -> Option<ProgressEvent> {
        if self.completed {
            return None;
        }
        if let Some(event) = self.poll_running() {
            return Some(event);
        }
        if let Some(step) = self.steps.get(self.next_step).cloned() {
            self.next_step += 1;
            return Some(self.start_step(step));
        }
        Some(self.complete())
    }
}

impl Drop for OperationRun {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let remaining = self.steps.len() - self.next_step;
        if let Some(running) = self.running.take() {
            self.ctx
                .log
                .warn(&format!("{}: stopping {}", self.name, running.item));
            // Dropping the stream terminates the child.
            drop(running);
        }
        let message = format!("cancelled, {remaining} item(s) not started");
        self.ctx.log.warn(&format!("{}: {message}", self.name));
        self.ctx
            .log
            .record(&self.name, OperationStatus::Cancelled, Some(&message));
    }
}
