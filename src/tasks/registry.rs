//! Addressable provisioning actions, dispatched by short id.
use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use super::install::{InstallApplications, InstallTools};
use super::upgrade::UpgradeSystem;
use super::{Context, Operation, Outcome, run_operation};
use crate::confirm::Confirm;
use crate::error::{ActionError, JumpstartError};

type Invoke = Box<dyn Fn(&dyn Confirm) -> Result<Outcome, JumpstartError> + Send + Sync>;

/// One entry in the action table.
pub struct ProvisionAction {
    /// Display category (e.g. "Tools").
    pub group: &'static str,
    /// Human label (e.g. "install").
    pub verb: &'static str,
    /// Stable short token used for dispatch.
    pub id: &'static str,
    invoke: Invoke,
}

impl fmt::Debug for ProvisionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisionAction")
            .field("group", &self.group)
            .field("verb", &self.verb)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl ProvisionAction {
    /// Build an action from an arbitrary closure.
    #[must_use]
    pub fn new(
        group: &'static str,
        verb: &'static str,
        id: &'static str,
        invoke: impl Fn(&dyn Confirm) -> Result<Outcome, JumpstartError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            group,
            verb,
            id,
            invoke: Box::new(invoke),
        }
    }

    /// Build an action that runs `op` against a snapshot of `ctx`.
    #[must_use]
    pub fn for_operation<O>(
        group: &'static str,
        verb: &'static str,
        id: &'static str,
        op: O,
        ctx: &Context,
    ) -> Self
    where
        O: Operation + 'static,
    {
        let ctx = ctx.clone();
        Self::new(group, verb, id, move |gate| run_operation(&op, &ctx, gate))
    }

    /// Run the action, asking `gate` for consent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation cannot be planned.
    pub fn invoke(&self, gate: &dyn Confirm) -> Result<Outcome, JumpstartError> {
        (self.invoke)(gate)
    }
}

/// Serializable row of the action table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionInfo {
    /// Display category.
    pub group: &'static str,
    /// Human label.
    pub verb: &'static str,
    /// Dispatch token.
    pub id: &'static str,
}

/// An ordered set of actions with unique ids.
#[derive(Debug)]
pub struct ActionRegistry {
    actions: Vec<ProvisionAction>,
}

impl ActionRegistry {
    /// Build a registry, rejecting duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::DuplicateId`] naming the first repeated id.
    pub fn new(actions: Vec<ProvisionAction>) -> Result<Self, ActionError> {
        let mut seen = HashSet::new();
        for action in &actions {
            if !seen.insert(action.id) {
                return Err(ActionError::DuplicateId(action.id.to_string()));
            }
        }
        Ok(Self { actions })
    }

    /// The standard action set bound to `ctx`: install tools, install
    /// applications, upgrade system.
    ///
    /// # Errors
    ///
    /// Returns an error only if the built-in ids collide.
    pub fn standard(ctx: &Context) -> Result<Self, ActionError> {
        Self::new(vec![
            ProvisionAction::for_operation("Tools", "install", "ti", InstallTools, ctx),
            ProvisionAction::for_operation("Applications", "install", "ai", InstallApplications, ctx),
            ProvisionAction::for_operation("System", "upgrade", "su", UpgradeSystem, ctx),
        ])
    }

    /// Look an action up by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ProvisionAction> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// Dispatch `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::UnknownAction`] if no action has that id, or
    /// the operation's own planning error.
    pub fn invoke(&self, id: &str, gate: &dyn Confirm) -> Result<Outcome, JumpstartError> {
        let action = self
            .get(id)
            .ok_or_else(|| ActionError::UnknownAction(id.to_string()))?;
        action.invoke(gate)
    }

    /// The action table, in registration order.
    #[must_use]
    pub fn describe(&self) -> Vec<ActionInfo> {
        self.actions
            .iter()
            .map(|a| ActionInfo {
                group: a.group,
                verb: a.verb,
                id: a.id,
            })
            .collect()
    }

    /// Number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
