//! Package manager catalog and host resolution.
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::error::ResolveError;
use crate::exec::Executor;

/// Describes one package manager: how to invoke it to upgrade everything and
/// to install a single package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PackageManager {
    /// Executable name, also used as the catalog identifier.
    pub name: &'static str,
    /// Arguments that upgrade every installed package.
    pub upgrade_args: &'static [&'static str],
    /// Arguments that install one package (the package name is appended).
    pub install_args: &'static [&'static str],
}

impl PackageManager {
    /// Sentinel returned when no catalog manager is available on the host.
    ///
    /// Plans are never compiled against it; see [`compile`](super::plan::compile).
    pub const NONE: Self = Self {
        name: "",
        upgrade_args: &[],
        install_args: &[],
    };

    /// Whether this is the [`NONE`](Self::NONE) sentinel.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("<none>")
        } else {
            f.write_str(self.name)
        }
    }
}

/// Known managers in preference order: distro-native first, then the
/// cross-platform and universal ones.
///
/// Every entry runs non-interactively; consent is obtained once per
/// operation before anything is spawned.
pub const CATALOG: &[PackageManager] = &[
    PackageManager {
        name: "pacman",
        upgrade_args: &["-Syu", "--noconfirm"],
        install_args: &["-S", "--noconfirm"],
    },
    PackageManager {
        name: "dnf",
        upgrade_args: &["upgrade", "-y"],
        install_args: &["install", "-y"],
    },
    PackageManager {
        name: "apt",
        upgrade_args: &["upgrade", "-y"],
        install_args: &["install", "-y"],
    },
    PackageManager {
        name: "zypper",
        upgrade_args: &["--non-interactive", "update"],
        install_args: &["--non-interactive", "install"],
    },
    PackageManager {
        name: "brew",
        upgrade_args: &["upgrade"],
        install_args: &["install"],
    },
    PackageManager {
        name: "flatpak",
        upgrade_args: &["update", "-y"],
        install_args: &["install", "-y"],
    },
];

/// Picks the package manager to use on this host.
///
/// The default manager is probed once and cached until
/// [`invalidate`](Self::invalidate) is called.
pub struct HostResolver {
    catalog: &'static [PackageManager],
    executor: Arc<dyn Executor>,
    cached: Mutex<Option<PackageManager>>,
}

impl fmt::Debug for HostResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostResolver")
            .field("catalog", &self.catalog.len())
            .field("executor", &"<dyn Executor>")
            .field("cached", &self.cached)
            .finish()
    }
}

impl HostResolver {
    /// Resolver over the built-in [`CATALOG`].
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self::with_catalog(CATALOG, executor)
    }

    /// Resolver over an arbitrary catalog.
    #[must_use]
    pub const fn with_catalog(
        catalog: &'static [PackageManager],
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            catalog,
            executor,
            cached: Mutex::new(None),
        }
    }

    /// The catalog this resolver searches.
    #[must_use]
    pub const fn catalog(&self) -> &'static [PackageManager] {
        self.catalog
    }

    /// First catalog entry whose executable is on `PATH`.
    ///
    /// Probing stops at the first hit. Returns [`PackageManager::NONE`] when
    /// nothing matches; callers must treat that as "no manager available".
    pub fn resolve_default(&self) -> PackageManager {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(manager) = *cached {
            return manager;
        }

        let manager = self
            .catalog
            .iter()
            .copied()
            .find(|m| {
                let present = self.executor.which(m.name);
                tracing::debug!("probe {}: {}", m.name, if present { "found" } else { "absent" });
                present
            })
            .unwrap_or(PackageManager::NONE);

        if manager.is_none() {
            tracing::warn!("no supported package manager found on this host");
        } else {
            tracing::debug!("default package manager: {manager}");
        }
        *cached = Some(manager);
        manager
    }

    /// Look up a manager by identifier without probing the host.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnknownManager`] if no catalog entry has that
    /// identifier.
    pub fn resolve_named(&self, name: &str) -> Result<PackageManager, ResolveError> {
        self.catalog
            .iter()
            .copied()
            .find(|m| m.name == name)
            .ok_or_else(|| ResolveError::UnknownManager(name.to_string()))
    }

    /// Forget the cached default so the next call probes again.
    pub fn invalidate(&self) {
        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::RecordingExecutor;

    static ABC: [PackageManager; 3] = [
        PackageManager {
            name: "a-pm",
            upgrade_args: &["up"],
            install_args: &["in"],
        },
        PackageManager {
            name: "b-pm",
            upgrade_args: &["up"],
            install_args: &["in"],
        },
        PackageManager {
            name: "c-pm",
            upgrade_args: &["up"],
            install_args: &["in"],
        },
    ];

    #[test]
    fn resolve_default_returns_first_present() {
        let exec = Arc::new(RecordingExecutor::new().with_present(&["b-pm", "c-pm"]));
        let resolver = HostResolver::with_catalog(&ABC, exec.clone());

        assert_eq!(resolver.resolve_default().name, "b-pm");
        // Short-circuits: c-pm is never probed.
        assert_eq!(exec.probes(), vec!["a-pm", "b-pm"]);
    }

    #[test]
    fn resolve_default_without_match_is_none_sentinel() {
        let exec = Arc::new(RecordingExecutor::new());
        let resolver = HostResolver::with_catalog(&ABC, exec);
        let manager = resolver.resolve_default();
        assert!(manager.is_none());
        assert_eq!(manager, PackageManager::NONE);
    }

    #[test]
    fn resolve_default_is_cached_until_invalidated() {
        let exec = Arc::new(RecordingExecutor::new().with_present(&["a-pm"]));
        let resolver = HostResolver::with_catalog(&ABC, exec.clone());

        resolver.resolve_default();
        resolver.resolve_default();
        assert_eq!(exec.probes().len(), 1);

        resolver.invalidate();
        resolver.resolve_default();
        assert_eq!(exec.probes().len(), 2);
    }

    #[test]
    fn resolve_named_does_not_probe() {
        let exec = Arc::new(RecordingExecutor::new());
        let resolver = HostResolver::new(exec.clone());
        let flatpak = resolver.resolve_named("flatpak").unwrap();
        assert_eq!(flatpak.install_args, &["install", "-y"]);
        assert!(exec.probes().is_empty());
    }

    #[test]
    fn resolve_named_unknown_fails() {
        let resolver = HostResolver::new(Arc::new(RecordingExecutor::new()));
        assert_eq!(
            resolver.resolve_named("snap"),
            Err(ResolveError::UnknownManager("snap".to_string()))
        );
    }

    #[test]
    fn catalog_prefers_native_managers() {
        let names: Vec<&str> = CATALOG.iter().map(|m| m.name).collect();
        assert_eq!(names, ["pacman", "dnf", "apt", "zypper", "brew", "flatpak"]);
    }

    #[test]
    fn catalog_entries_are_complete() {
        for manager in CATALOG {
            assert!(!manager.is_none());
            assert!(!manager.install_args.is_empty(), "{manager}");
            assert!(!manager.upgrade_args.is_empty(), "{manager}");
        }
    }

    #[test]
    fn display_of_sentinel() {
        assert_eq!(PackageManager::NONE.to_string(), "<none>");
        assert_eq!(CATALOG[2].to_string(), "apt");
    }
}
