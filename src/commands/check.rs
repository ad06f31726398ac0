//! Command: validate the configuration and report what is already present.
use std::sync::Arc;

use anyhow::Result;
use rayon::prelude::*;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::config::ProvisionItem;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Log as _, Logger};
use crate::resources::item::ItemResource;
use crate::resources::{Resource, ResourceState};

/// Load the configuration, show its warnings, the resolved managers, and
/// the presence of every item. Never changes the host.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    let executor = Arc::new(SystemExecutor::new());
    let setup = CommandSetup::init(global, log, executor.clone())?;
    let session = &setup.session;
    let config = session.config();

    log.stage("Package managers");
    let default = session.default_manager();
    if default.is_none() {
        log.warn("default: none found; native items and system upgrade cannot run");
    } else {
        log.info(&format!("default: {default}"));
    }
    match session.context().resolver.resolve_named(&config.packaged_manager) {
        Ok(manager) => log.info(&format!("packaged: {manager}")),
        Err(e) => log.warn(&format!("packaged: {e}")),
    }

    for (section, items) in [("Tools", &config.tools), ("Applications", &config.applications)] {
        if items.is_empty() {
            continue;
        }
        log.stage(section);
        for line in presence_report(items, executor.as_ref()) {
            log.info(&line);
        }
    }
    Ok(())
}

/// One line per item: present or missing, in configuration order.
#[must_use]
pub fn presence_report(items: &[ProvisionItem], executor: &dyn Executor) -> Vec<String> {
    items
        .par_iter()
        .map(|item| {
            let resource = ItemResource::new(item, executor);
            let mark = match resource.current_state() {
                ResourceState::Correct => "present",
                ResourceState::Missing => "missing",
            };
            format!("{mark:<8}{}", resource.description())
        })
        .collect()
}
