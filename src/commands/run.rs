//! Command: run one or more actions by id.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::cli::{GlobalOpts, RunOpts};
use crate::confirm::{Confirm, FixedAnswer, TerminalPrompt};
use crate::error::ActionError;
use crate::exec::SystemExecutor;
use crate::logging::{Log as _, Logger};
use crate::tasks::OperationRun;

/// Run the requested actions in order.
///
/// A planning failure stops only its own action; the next id still runs.
/// Ctrl-C stops the current action, terminating its child, and skips the
/// rest.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, an id is unknown,
/// the run was interrupted, or any action recorded a failure.
pub fn run(global: &GlobalOpts, opts: &RunOpts, log: &Arc<Logger>) -> Result<()> {
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&cancel);
        // A second Ctrl-C (e.g. while blocked on a prompt) exits at once.
        ctrlc::set_handler(move || {
            if flag.swap(true, Ordering::SeqCst) {
                std::process::exit(130);
            }
        })
        .context("installing Ctrl-C handler")?;
    }

    let executor = Arc::new(SystemExecutor::with_cancel(Arc::clone(&cancel)));
    let setup = CommandSetup::init(global, log, executor)?;
    let registry = setup.session.actions()?;

    // Reject typos before anything runs.
    if let Some(unknown) = opts.ids.iter().find(|id| registry.get(id).is_none()) {
        return Err(ActionError::UnknownAction(unknown.clone()).into());
    }

    let gate: Box<dyn Confirm> = if opts.yes {
        Box::new(FixedAnswer(true))
    } else {
        Box::new(TerminalPrompt::stdio())
    };

    for id in &opts.ids {
        if cancel.load(Ordering::SeqCst) {
            break;
        }
        match registry.invoke(id, gate.as_ref()) {
            Ok(outcome) => {
                if let Some(run) = outcome.into_run() {
                    drain(run, &cancel);
                }
            }
            // Already logged and recorded by the operation.
            Err(e) => log.debug(&format!("{id}: {e}")),
        }
    }

    log.print_summary();

    if cancel.load(Ordering::SeqCst) {
        anyhow::bail!("interrupted");
    }
    let count = log.failure_count();
    if count > 0 {
        anyhow::bail!("{count} action(s) failed");
    }
    Ok(())
}

/// Consume `run` to its summary, or until `cancel` is set.
///
/// Every event is logged by the run itself. Stopping early drops the run,
/// which terminates the in-flight child.
fn drain(mut run: OperationRun, cancel: &AtomicBool) {
    while !cancel.load(Ordering::SeqCst) {
        if run.next().is_none() {
            break;
        }
    }
}
