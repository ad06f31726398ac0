//! Command: show the action table.
use std::sync::Arc;

use anyhow::{Context as _, Result};

use super::open_session;
use crate::cli::{GlobalOpts, ListOpts};
use crate::exec::SystemExecutor;
use crate::logging::{Log as _, Logger};
use crate::tasks::registry::ActionInfo;

/// Print every action the current configuration offers.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn run(global: &GlobalOpts, opts: &ListOpts, log: &Arc<Logger>) -> Result<()> {
    let session = open_session(global, log, Arc::new(SystemExecutor::new()))?;
    let actions = session.actions()?.describe();

    if opts.json {
        let json = serde_json::to_string_pretty(&actions).context("serializing action table")?;
        emit(&json);
        return Ok(());
    }

    log.stage("Actions");
    for line in table(&actions) {
        log.info(&line);
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn emit(text: &str) {
    println!("{text}");
}

/// Render the action table, one padded row per action.
#[must_use]
pub fn table(actions: &[ActionInfo]) -> Vec<String> {
    let width = actions.iter().map(|a| a.group.len()).max().unwrap_or(0);
    actions
        .iter()
        .map(|a| format!("{:<4}{:<width$}  {}", a.id, a.group, a.verb))
        .collect()
}
