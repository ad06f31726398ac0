//! Compiling items into executable install plans.
use std::fmt;
use std::process::Command;

use crate::config::{ItemKind, ProvisionItem};
use crate::error::ResolveError;

use super::package_manager::PackageManager;

/// A fully resolved command, ready to hand to an
/// [`Executor`](crate::exec::Executor). No lookup happens after compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallPlan {
    /// A program and its arguments, run directly without a shell.
    Argv {
        /// Program to execute.
        program: String,
        /// Arguments, in order.
        args: Vec<String>,
    },
    /// A literal command line run through the platform shell.
    Shell {
        /// Command line, passed verbatim.
        command: String,
    },
}

impl InstallPlan {
    fn from_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        let mut words = words.into_iter().map(str::to_string);
        let program = words.next().unwrap_or_default();
        Self::Argv {
            program,
            args: words.collect(),
        }
    }

    /// Program followed by its arguments, for [`InstallPlan::Argv`].
    #[must_use]
    pub fn argv(&self) -> Option<Vec<&str>> {
        match self {
            Self::Argv { program, args } => Some(
                std::iter::once(program.as_str())
                    .chain(args.iter().map(String::as_str))
                    .collect(),
            ),
            Self::Shell { .. } => None,
        }
    }

    /// The literal command line, for [`InstallPlan::Shell`].
    #[must_use]
    pub fn shell_line(&self) -> Option<&str> {
        match self {
            Self::Shell { command } => Some(command),
            Self::Argv { .. } => None,
        }
    }

    /// Build the process command for this plan.
    ///
    /// Shell plans run under `sh -c` (or `cmd /C` on Windows).
    #[must_use]
    pub fn to_command(&self) -> Command {
        match self {
            Self::Argv { program, args } => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
            Self::Shell { command } => {
                #[cfg(windows)]
                let mut cmd = {
                    let mut c = Command::new("cmd");
                    c.arg("/C");
                    c
                };
                #[cfg(not(windows))]
                let mut cmd = {
                    let mut c = Command::new("sh");
                    c.arg("-c");
                    c
                };
                cmd.arg(command);
                cmd
            }
        }
    }
}

impl fmt::Display for InstallPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argv { program, args } => {
                f.write_str(program)?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                Ok(())
            }
            Self::Shell { command } => f.write_str(command),
        }
    }
}

/// Compile one item against an already resolved manager.
///
/// For native items `manager` must be the host default; for packaged items it
/// must be the universal manager named by the document. Custom items ignore
/// it. Pure: no probing, no I/O.
///
/// # Errors
///
/// Returns [`ResolveError::NoManager`] if a native or packaged item is
/// compiled against the [`PackageManager::NONE`] sentinel.
pub fn compile(item: &ProvisionItem, manager: &PackageManager) -> Result<InstallPlan, ResolveError> {
    match &item.kind {
        ItemKind::Custom { command } => Ok(InstallPlan::Shell {
            command: command.clone(),
        }),
        _ if manager.is_none() => Err(ResolveError::NoManager),
        ItemKind::Native => Ok(InstallPlan::from_words(
            ["sudo", manager.name]
                .into_iter()
                .chain(manager.install_args.iter().copied())
                .chain([item.name.as_str()]),
        )),
        ItemKind::Packaged { upgrade_on_install } => {
            let upgrade: &[&str] = if *upgrade_on_install {
                manager.upgrade_args
            } else {
                &[]
            };
            Ok(InstallPlan::from_words(
                [manager.name]
                    .into_iter()
                    .chain(manager.install_args.iter().copied())
                    .chain(upgrade.iter().copied())
                    .chain([item.name.as_str()]),
            ))
        }
    }
}

/// Plan that upgrades every package through `manager`, with `sudo`.
///
/// # Errors
///
/// Returns [`ResolveError::NoManager`] for the [`PackageManager::NONE`]
/// sentinel.
pub fn upgrade_plan(manager: &PackageManager) -> Result<InstallPlan, ResolveError> {
    if manager.is_none() {
        return Err(ResolveError::NoManager);
    }
    Ok(InstallPlan::from_words(
        ["sudo", manager.name]
            .into_iter()
            .chain(manager.upgrade_args.iter().copied()),
    ))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::package_manager::CATALOG;

    const APT: PackageManager = PackageManager {
        name: "apt",
        upgrade_args: &["upgrade"],
        install_args: &["install"],
    };

    const FLATPAK: PackageManager = PackageManager {
        name: "flatpak",
        upgrade_args: &["update", "-y"],
        install_args: &["install", "-y"],
    };

    #[test]
    fn native_item_runs_sudo_manager_install_name() {
        let plan = compile(&ProvisionItem::native("git"), &APT).unwrap();
        assert_eq!(plan.argv().unwrap(), ["sudo", "apt", "install", "git"]);
        assert_eq!(plan.to_string(), "sudo apt install git");
    }

    #[test]
    fn native_item_keeps_install_args_order_for_every_catalog_entry() {
        let item = ProvisionItem::native("curl");
        for manager in CATALOG {
            let argv: Vec<String> = compile(&item, manager)
                .unwrap()
                .argv()
                .unwrap()
                .into_iter()
                .map(String::from)
                .collect();
            let mut expected = vec!["sudo".to_string(), manager.name.to_string()];
            expected.extend(manager.install_args.iter().map(|a| (*a).to_string()));
            expected.push("curl".to_string());
            assert_eq!(argv, expected, "manager {manager}");
        }
    }

    #[test]
    fn packaged_item_has_no_sudo() {
        let plan = compile(&ProvisionItem::packaged("org.gimp.GIMP", false), &FLATPAK).unwrap();
        assert_eq!(
            plan.argv().unwrap(),
            ["flatpak", "install", "-y", "org.gimp.GIMP"]
        );
    }

    #[test]
    fn packaged_item_with_upgrade_inserts_upgrade_args_after_install_args() {
        let plan = compile(&ProvisionItem::packaged("org.gimp.GIMP", true), &FLATPAK).unwrap();
        assert_eq!(
            plan.argv().unwrap(),
            ["flatpak", "install", "-y", "update", "-y", "org.gimp.GIMP"]
        );
    }

    #[test]
    fn custom_item_is_literal_shell_line_for_any_manager() {
        let cmd = "curl -fsSL https://example.invalid/i.sh | sh -s -- -y > /dev/null";
        let item = ProvisionItem::custom("thing", cmd);
        for manager in CATALOG.iter().chain([&PackageManager::NONE]) {
            let plan = compile(&item, manager).unwrap();
            assert_eq!(plan.shell_line(), Some(cmd));
            assert!(plan.argv().is_none());
        }
    }

    #[test]
    fn sentinel_manager_is_rejected() {
        assert_eq!(
            compile(&ProvisionItem::native("git"), &PackageManager::NONE),
            Err(ResolveError::NoManager)
        );
        assert_eq!(
            compile(
                &ProvisionItem::packaged("org.gimp.GIMP", true),
                &PackageManager::NONE
            ),
            Err(ResolveError::NoManager)
        );
        assert_eq!(
            upgrade_plan(&PackageManager::NONE),
            Err(ResolveError::NoManager)
        );
    }

    #[test]
    fn upgrade_plan_uses_sudo_and_upgrade_args() {
        let plan = upgrade_plan(&APT).unwrap();
        assert_eq!(plan.argv().unwrap(), ["sudo", "apt", "upgrade"]);
    }

    #[cfg(unix)]
    #[test]
    fn shell_plan_command_uses_sh() {
        let plan = InstallPlan::Shell {
            command: "echo hi".to_string(),
        };
        let cmd = plan.to_command();
        assert_eq!(cmd.get_program(), "sh");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["-c", "echo hi"]);
    }

    #[test]
    fn argv_plan_command_has_no_shell() {
        let plan = compile(&ProvisionItem::native("git"), &APT).unwrap();
        let cmd = plan.to_command();
        assert_eq!(cmd.get_program(), "sudo");
        assert_eq!(cmd.get_args().count(), 3);
    }
}
