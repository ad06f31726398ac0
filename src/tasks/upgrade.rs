//! Upgrade every package through the host default manager.
use super::{Context, Operation, Step};
use crate::error::JumpstartError;
use crate::resources::plan;

/// Run the default manager's upgrade command with `sudo`.
///
/// Always offered: the `[system]` directive carries no parameters, and the
/// upgrade needs nothing from the document. It is never retried with other
/// arguments; a failing upgrade is reported through its exit code.
#[derive(Debug)]
pub struct UpgradeSystem;

impl Operation for UpgradeSystem {
    fn name(&self) -> &'static str {
        "Upgrade system"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn plan(&self, ctx: &Context) -> Result<Vec<Step>, JumpstartError> {
        let manager = ctx.resolver.resolve_default();
        let plan = plan::upgrade_plan(&manager)?;
        ctx.log.debug(&format!("planned: upgrade via {manager} -> {plan}"));
        Ok(vec![Step::Execute {
            item: manager.name.to_string(),
            plan,
        }])
    }
}
