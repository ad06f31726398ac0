//! Install operations for the `tools` and `applications` sections.
use super::{Context, Operation, Step};
use crate::config::ProvisionItem;
use crate::error::JumpstartError;
use crate::resources::item::ItemResource;
use crate::resources::{Resource, ResourceState};

/// Install every configured tool that is not already on `PATH`.
#[derive(Debug)]
pub struct InstallTools;

impl Operation for InstallTools {
    fn name(&self) -> &'static str {
        "Install tools"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.tools.is_empty()
    }

    fn plan(&self, ctx: &Context) -> Result<Vec<Step>, JumpstartError> {
        plan_items(ctx, &ctx.config.tools)
    }

    fn recheck_presence(&self) -> bool {
        true
    }
}

/// Install every configured application that is not already on `PATH`.
#[derive(Debug)]
pub struct InstallApplications;

impl Operation for InstallApplications {
    fn name(&self) -> &'static str {
        "Install applications"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.applications.is_empty()
    }

    fn plan(&self, ctx: &Context) -> Result<Vec<Step>, JumpstartError> {
        plan_items(ctx, &ctx.config.applications)
    }

    fn recheck_presence(&self) -> bool {
        true
    }
}

/// Probe every item, then compile a plan for each missing one, in
/// configuration order.
///
/// These probes can go stale once the first step runs; the run re-probes
/// later items before launching them (see [`Operation::recheck_presence`]).
///
/// Present items are never compiled. The first resolution error aborts the
/// whole operation before anything has been spawned.
fn plan_items(ctx: &Context, items: &[ProvisionItem]) -> Result<Vec<Step>, JumpstartError> {
    let states = probe_all(ctx, items);

    items
        .iter()
        .zip(states)
        .map(|(item, state)| match state {
            ResourceState::Correct => Ok(Step::AlreadyPresent {
                item: item.name.clone(),
            }),
            ResourceState::Missing => {
                let resource = ItemResource::new(item, ctx.executor.as_ref());
                let plan = resource.plan(&ctx.resolver, &ctx.config.packaged_manager)?;
                ctx.log
                    .debug(&format!("planned: {} -> {plan}", resource.description()));
                Ok(Step::Execute {
                    item: item.name.clone(),
                    plan,
                })
            }
        })
        .collect()
}

/// Presence of each item, in the same order as `items`.
fn probe_all(ctx: &Context, items: &[ProvisionItem]) -> Vec<ResourceState> {
    let probe = |item: &ProvisionItem| {
        let resource = ItemResource::new(item, ctx.executor.as_ref());
        let state = resource.current_state();
        ctx.log
            .debug(&format!("check: {} -> {state:?}", resource.description()));
        state
    };

    if ctx.parallel {
        use rayon::prelude::*;
        items.par_iter().map(probe).collect()
    } else {
        items.iter().map(probe).collect()
    }
}
