//! Per-item check-then-act resource.
use super::package_manager::{HostResolver, PackageManager};
use super::plan::{self, InstallPlan};
use super::{Resource, ResourceState};
use crate::config::{ItemKind, ProvisionItem};
use crate::error::ResolveError;
use crate::exec::Executor;

/// One configured item, checked through the host's command lookup.
#[derive(Debug)]
pub struct ItemResource<'a> {
    /// The configured item.
    pub item: &'a ProvisionItem,
    executor: &'a dyn Executor,
}

impl<'a> ItemResource<'a> {
    /// Wrap `item`, probing through `executor`.
    #[must_use]
    pub const fn new(item: &'a ProvisionItem, executor: &'a dyn Executor) -> Self {
        Self { item, executor }
    }

    /// Resolve the manager for this item and compile its plan.
    ///
    /// Native items always use the host default; packaged items use
    /// `packaged_manager`, looked up by name; custom items need no manager.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnknownManager`] if `packaged_manager` is not in
    /// the catalog, or [`ResolveError::NoManager`] if the host has no default
    /// manager for a native item.
    pub fn plan(
        &self,
        resolver: &HostResolver,
        packaged_manager: &str,
    ) -> Result<InstallPlan, ResolveError> {
        let manager = match self.item.kind {
            ItemKind::Native => resolver.resolve_default(),
            ItemKind::Packaged { .. } => resolver.resolve_named(packaged_manager)?,
            ItemKind::Custom { .. } => PackageManager::NONE,
        };
        plan::compile(self.item, &manager)
    }
}

impl Resource for ItemResource<'_> {
    fn description(&self) -> String {
        format!("{} ({})", self.item.name, self.item.kind)
    }

    fn current_state(&self) -> ResourceState {
        if self.executor.which(&self.item.name) {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::resources::test_helpers::RecordingExecutor;

    #[test]
    fn present_command_is_correct() {
        let exec = RecordingExecutor::new().with_present(&["git"]);
        let item = ProvisionItem::native("git");
        let resource = ItemResource::new(&item, &exec);
        assert_eq!(resource.current_state(), ResourceState::Correct);
        assert!(!resource.needs_change());
    }

    #[test]
    fn absent_command_is_missing() {
        let exec = RecordingExecutor::new();
        let item = ProvisionItem::custom("rustup", "true");
        let resource = ItemResource::new(&item, &exec);
        assert_eq!(resource.current_state(), ResourceState::Missing);
        assert!(resource.needs_change());
        assert_eq!(resource.description(), "rustup (custom)");
    }

    #[test]
    fn native_item_uses_host_default() {
        let exec = Arc::new(RecordingExecutor::new().with_present(&["apt"]));
        let resolver = HostResolver::new(exec.clone());
        let item = ProvisionItem::native("git");
        let plan = ItemResource::new(&item, exec.as_ref())
            .plan(&resolver, "flatpak")
            .unwrap();
        assert_eq!(plan.argv().unwrap(), ["sudo", "apt", "install", "-y", "git"]);
    }

    #[test]
    fn packaged_item_uses_named_manager_even_if_absent() {
        let exec = Arc::new(RecordingExecutor::new().with_present(&["apt"]));
        let resolver = HostResolver::new(exec.clone());
        let item = ProvisionItem::packaged("org.gimp.GIMP", false);
        let plan = ItemResource::new(&item, exec.as_ref())
            .plan(&resolver, "flatpak")
            .unwrap();
        assert_eq!(plan.argv().unwrap()[0], "flatpak");
    }

    #[test]
    fn packaged_item_with_unknown_manager_fails() {
        let exec = Arc::new(RecordingExecutor::new());
        let resolver = HostResolver::new(exec.clone());
        let item = ProvisionItem::packaged("x", false);
        let err = ItemResource::new(&item, exec.as_ref())
            .plan(&resolver, "snap")
            .unwrap_err();
        assert_eq!(err, ResolveError::UnknownManager("snap".to_string()));
    }

    #[test]
    fn native_item_without_host_manager_fails() {
        let exec = Arc::new(RecordingExecutor::new());
        let resolver = HostResolver::new(exec.clone());
        let item = ProvisionItem::native("git");
        let err = ItemResource::new(&item, exec.as_ref())
            .plan(&resolver, "flatpak")
            .unwrap_err();
        assert_eq!(err, ResolveError::NoManager);
    }
}
