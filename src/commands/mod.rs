//! Subcommand entry points and the setup they share.

/// `jumpstart check`: presence report.
pub mod check;
/// `jumpstart completions`: shell completion scripts.
pub mod completions;
/// `jumpstart list`: the action table.
pub mod list;
/// `jumpstart run`: invoke actions by id.
pub mod run;
/// `jumpstart version`.
pub mod version;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::exec::Executor;
use crate::logging::{Log, Logger};
use crate::session::ProvisioningSession;

/// Documents looked for in the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILES: &[&str] = &["jumpstart.toml", "config.yaml"];

/// Locate the configuration document.
///
/// An explicit `--config` (or `JUMPSTART_CONFIG`) wins; otherwise the first
/// of [`DEFAULT_CONFIG_FILES`] found in `cwd` is used.
///
/// # Errors
///
/// Returns an error if the explicit path does not exist or no default
/// document is found.
pub fn resolve_config_path(global: &GlobalOpts, cwd: &Path) -> Result<PathBuf> {
    if let Some(path) = &global.config {
        return dunce::canonicalize(path)
            .with_context(|| format!("config file not found: {}", path.display()));
    }

    DEFAULT_CONFIG_FILES
        .iter()
        .map(|name| cwd.join(name))
        .find(|candidate| candidate.is_file())
        .map(|found| dunce::canonicalize(&found).unwrap_or(found))
        .with_context(|| {
            format!(
                "no configuration found in {}: pass --config or create {}",
                cwd.display(),
                DEFAULT_CONFIG_FILES.join(" or ")
            )
        })
}

/// Open a session over the resolved configuration without any console
/// output beyond debug lines.
///
/// # Errors
///
/// Returns an error if the configuration cannot be located or loaded.
pub fn open_session(
    global: &GlobalOpts,
    log: &Arc<Logger>,
    executor: Arc<dyn Executor>,
) -> Result<ProvisioningSession> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    let path = resolve_config_path(global, &cwd)?;
    let log = Arc::clone(log) as Arc<dyn Log>;
    let session = ProvisioningSession::open(&path, executor, log)?
        .with_dry_run(global.dry_run)
        .with_parallel(global.parallel);
    Ok(session)
}

/// Shared state produced by the common command setup sequence.
#[derive(Debug)]
pub struct CommandSetup {
    /// Session over the loaded configuration.
    pub session: ProvisioningSession,
}

impl CommandSetup {
    /// Load the configuration and report its lint warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be located or loaded.
    pub fn init(global: &GlobalOpts, log: &Arc<Logger>, executor: Arc<dyn Executor>) -> Result<Self> {
        log.info(&format!("jumpstart {}", version::version()));

        log.stage("Loading configuration");
        let session = open_session(global, log, executor)?;
        let config = session.config();
        log.info(&format!(
            "loaded {}: {} application(s), {} tool(s)",
            config.origin,
            config.applications.len(),
            config.tools.len()
        ));
        log.debug(&format!("packaged manager: {}", config.packaged_manager));

        let warnings = session.validate();
        if !warnings.is_empty() {
            log.warn(&format!(
                "found {} configuration warning(s):",
                warnings.len()
            ));
            for warning in &warnings {
                log.warn(&format!(
                    "  {} [{}]: {}",
                    warning.source, warning.item, warning.message
                ));
            }
        }

        Ok(Self { session })
    }
}
