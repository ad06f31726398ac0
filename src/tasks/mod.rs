//! Provisioning operations and the confirm-then-run state machine.
//!
//! Every operation moves through the same states:
//!
//! ```text
//! Idle ──▶ AwaitingConfirmation ──▶ Aborted
//!                   │
//!                   ▼
//!               Running ──▶ Completed
//! ```
//!
//! [`run_operation`] covers `Idle` to `Running`: it asks the gate, and only
//! after consent probes presence and compiles plans. The returned
//! [`OperationRun`] is the `Running` state; draining it to its summary event
//! is `Completed`.
pub mod install;
pub mod registry;
pub mod upgrade;

mod context;
mod run;

pub use context::Context;
pub use run::{OperationRun, ProgressEvent, RunStats, Step};

use crate::confirm::Confirm;
use crate::error::JumpstartError;
use crate::logging::OperationStatus;

/// A named provisioning operation.
pub trait Operation: Send + Sync {
    /// Human-readable operation name.
    fn name(&self) -> &'static str;

    /// Question put to the confirmation gate.
    fn prompt(&self, _ctx: &Context) -> String {
        format!("{}?", self.name())
    }

    /// Whether there is anything for this operation to do.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Probe presence and compile a step for every item, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if a plan cannot be resolved (unknown manager, no
    /// manager on the host). No process has been started at that point.
    fn plan(&self, ctx: &Context) -> Result<Vec<Step>, JumpstartError>;

    /// Whether each item is probed again right before it runs, once an
    /// earlier step has changed the host.
    fn recheck_presence(&self) -> bool {
        false
    }
}

/// How an operation left the confirmation stage.
#[derive(Debug)]
pub enum Outcome {
    /// Nothing configured for this operation.
    NotApplicable,
    /// The gate said no. Zero items were processed.
    Declined,
    /// Consent given; iterate the run to execute it.
    Started(OperationRun),
}

impl Outcome {
    /// The run, if the operation started.
    #[must_use]
    pub fn into_run(self) -> Option<OperationRun> {
        match self {
            Self::Started(run) => Some(run),
            Self::NotApplicable | Self::Declined => None,
        }
    }
}

/// Take `op` from idle through confirmation to a ready-to-drain run.
///
/// Declining is a normal outcome, not an error, and happens before any
/// probe or compilation.
///
/// # Errors
///
/// Returns an error if planning fails. The failure is also recorded in the
/// logger's summary.
pub fn run_operation(
    op: &dyn Operation,
    ctx: &Context,
    gate: &dyn Confirm,
) -> Result<Outcome, JumpstartError> {
    if !op.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping: {} (nothing configured)", op.name()));
        ctx.log
            .record(op.name(), OperationStatus::NotApplicable, None);
        return Ok(Outcome::NotApplicable);
    }

    ctx.log.stage(op.name());

    if !gate.confirm(&op.prompt(ctx), true) {
        ctx.log.info("declined, nothing done");
        ctx.log.record(op.name(), OperationStatus::Declined, None);
        return Ok(Outcome::Declined);
    }

    match op.plan(ctx) {
        Ok(steps) => {
            let run = OperationRun::new(op.name(), steps, ctx.clone());
            let run = if op.recheck_presence() {
                run.with_presence_recheck()
            } else {
                run
            };
            Ok(Outcome::Started(run))
        }
        Err(e) => {
            ctx.log.error(&format!("{}: {e}", op.name()));
            ctx.log
                .record(op.name(), OperationStatus::Failed, Some(&e.to_string()));
            Err(e)
        }
    }
}
