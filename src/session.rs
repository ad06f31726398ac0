//! A provisioning session: one loaded configuration and one host.
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Config, ValidationWarning};
use crate::confirm::Confirm;
use crate::error::{ActionError, ConfigError, JumpstartError};
use crate::exec::Executor;
use crate::logging::Log;
use crate::resources::package_manager::{HostResolver, PackageManager};
use crate::tasks::registry::ActionRegistry;
use crate::tasks::{Context, Outcome};

/// Owns the configuration and the cached host resolution.
///
/// The configuration is only ever replaced as a whole. Operations that were
/// started before a replacement keep working against the snapshot they were
/// built from.
pub struct ProvisioningSession {
    source: Option<PathBuf>,
    config: Arc<Config>,
    resolver: Arc<HostResolver>,
    executor: Arc<dyn Executor>,
    log: Arc<dyn Log>,
    dry_run: bool,
    parallel: bool,
}

impl fmt::Debug for ProvisioningSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisioningSession")
            .field("source", &self.source)
            .field("config", &self.config.origin)
            .field("resolver", &self.resolver)
            .field("dry_run", &self.dry_run)
            .field("parallel", &self.parallel)
            .finish_non_exhaustive()
    }
}

impl ProvisioningSession {
    /// Load `path` and start a session over it.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or is malformed.
    pub fn open(
        path: &Path,
        executor: Arc<dyn Executor>,
        log: Arc<dyn Log>,
    ) -> Result<Self, ConfigError> {
        let config = Config::load(path)?;
        log.debug(&format!(
            "loaded {}: {} application(s), {} tool(s)",
            config.origin,
            config.applications.len(),
            config.tools.len()
        ));
        let mut session = Self::new(config, executor, log);
        session.source = Some(path.to_path_buf());
        Ok(session)
    }

    /// Start a session over an already-built configuration.
    #[must_use]
    pub fn new(config: Config, executor: Arc<dyn Executor>, log: Arc<dyn Log>) -> Self {
        Self {
            source: None,
            config: Arc::new(config),
            resolver: Arc::new(HostResolver::new(Arc::clone(&executor))),
            executor,
            log,
            dry_run: false,
            parallel: true,
        }
    }

    /// Use a custom resolver (alternate catalog).
    #[must_use]
    pub fn with_resolver(mut self, resolver: HostResolver) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Preview operations instead of running them.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run presence probes concurrently (the default) or in order.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The current configuration snapshot.
    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Replace the configuration, returning the previous snapshot.
    pub fn replace_config(&mut self, config: Config) -> Arc<Config> {
        self.log.debug(&format!("configuration replaced by {}", config.origin));
        std::mem::replace(&mut self.config, Arc::new(config))
    }

    /// Re-read the file the session was opened from.
    ///
    /// A session built from an in-memory configuration has nothing to
    /// reload and is left unchanged. On error the current configuration is
    /// kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or is malformed.
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        let Some(path) = self.source.clone() else {
            self.log.debug("reload: session has no source file");
            return Ok(());
        };
        let config = Config::load(&path)?;
        self.replace_config(config);
        Ok(())
    }

    /// Operation context bound to the current snapshot.
    #[must_use]
    pub fn context(&self) -> Context {
        Context::new(
            Arc::clone(&self.config),
            Arc::clone(&self.resolver),
            Arc::clone(&self.executor),
            Arc::clone(&self.log),
        )
        .with_dry_run(self.dry_run)
        .with_parallel(self.parallel)
    }

    /// The action table, built fresh from the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if two actions share an id.
    pub fn actions(&self) -> Result<ActionRegistry, ActionError> {
        ActionRegistry::standard(&self.context())
    }

    /// Dispatch one action by id.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown id or a planning failure. Errors stop
    /// only the requested operation; the session stays usable.
    pub fn invoke(&self, id: &str, gate: &dyn Confirm) -> Result<Outcome, JumpstartError> {
        self.actions()?.invoke(id, gate)
    }

    /// The host's default package manager, probed once per session.
    #[must_use]
    pub fn default_manager(&self) -> PackageManager {
        self.resolver.resolve_default()
    }

    /// Drop the cached default so the next use probes again.
    pub fn invalidate_manager(&self) {
        self.log.debug("package manager cache invalidated");
        self.resolver.invalidate();
    }

    /// Non-fatal lint warnings for the current snapshot.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationWarning> {
        self.config.validate(self.resolver.catalog())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::ProvisionItem;
    use crate::config::test_helpers::write_temp_config;
    use crate::confirm::FixedAnswer;
    use crate::logging::Logger;
    use crate::resources::test_helpers::RecordingExecutor;

    fn session(config: Config, present: &[&str]) -> (ProvisioningSession, Arc<RecordingExecutor>) {
        let exec = Arc::new(RecordingExecutor::new().with_present(present));
        let log = Arc::new(Logger::new("test"));
        (ProvisioningSession::new(config, exec.clone(), log), exec)
    }

    fn one_tool(name: &str) -> Config {
        Config {
            tools: vec![ProvisionItem::custom(name, format!("install {name}"))],
            ..Config::default()
        }
    }

    #[test]
    fn running_operation_keeps_its_snapshot() {
        let (mut session, exec) = session(one_tool("x"), &[]);
        let run = session
            .invoke("ti", &FixedAnswer(true))
            .unwrap()
            .into_run()
            .unwrap();

        let previous = session.replace_config(Config::default());
        assert_eq!(previous.tools.len(), 1);
        assert!(session.config().tools.is_empty());

        drop(run.collect::<Vec<_>>());
        assert_eq!(exec.spawned().len(), 1);
        assert_eq!(exec.spawned()[0].to_string(), "install x");
    }

    #[test]
    fn actions_follow_replacement() {
        let (mut session, exec) = session(Config::default(), &[]);
        session.replace_config(one_tool("y"));
        let run = session
            .invoke("ti", &FixedAnswer(true))
            .unwrap()
            .into_run()
            .unwrap();
        drop(run.collect::<Vec<_>>());
        assert_eq!(exec.spawned()[0].to_string(), "install y");
    }

    #[test]
    fn default_manager_is_probed_once_until_invalidated() {
        let (session, exec) = session(Config::default(), &["apt"]);
        assert_eq!(session.default_manager().name, "apt");
        assert_eq!(session.default_manager().name, "apt");
        let first = exec.probes().len();

        session.invalidate_manager();
        assert_eq!(session.default_manager().name, "apt");
        assert_eq!(exec.probes().len(), first * 2);
    }

    #[test]
    fn unknown_action_leaves_session_usable() {
        let (session, _) = session(one_tool("x"), &["x"]);
        assert!(session.invoke("nope", &FixedAnswer(true)).is_err());
        assert!(session.invoke("ti", &FixedAnswer(true)).is_ok());
    }

    #[test]
    fn reload_picks_up_file_changes() {
        let (_dir, path) = write_temp_config("jumpstart.toml", "");
        let exec = Arc::new(RecordingExecutor::new());
        let log = Arc::new(Logger::new("test"));
        let mut session = ProvisioningSession::open(&path, exec, log).unwrap();
        assert!(session.config().tools.is_empty());

        std::fs::write(&path, "[[tools]]\nname = \"z\"\ncmd = \"install z\"\n").unwrap();
        session.reload().unwrap();
        assert_eq!(session.config().tools[0].name, "z");
    }

    #[test]
    fn failed_reload_keeps_current_config() {
        let (_dir, path) = write_temp_config(
            "jumpstart.toml",
            "[[tools]]\nname = \"z\"\ncmd = \"install z\"\n",
        );
        let exec = Arc::new(RecordingExecutor::new());
        let log = Arc::new(Logger::new("test"));
        let mut session = ProvisioningSession::open(&path, exec, log).unwrap();

        std::fs::write(&path, "[[tools]]\nname = \"z\"\n").unwrap();
        assert!(session.reload().is_err());
        assert_eq!(session.config().tools.len(), 1);
    }

    #[test]
    fn custom_catalog_compiles_exact_plan() {
        static APT_ONLY: [PackageManager; 1] = [PackageManager {
            name: "apt",
            upgrade_args: &["upgrade"],
            install_args: &["install"],
        }];
        let config = Config {
            applications: vec![ProvisionItem::native("git")],
            ..Config::default()
        };
        let exec = Arc::new(RecordingExecutor::new().with_present(&["apt"]));
        let session = ProvisioningSession::new(config, exec.clone(), Arc::new(Logger::new("test")))
            .with_resolver(HostResolver::with_catalog(&APT_ONLY, exec.clone()));

        let run = session
            .invoke("ai", &FixedAnswer(true))
            .unwrap()
            .into_run()
            .unwrap();
        drop(run.collect::<Vec<_>>());
        assert_eq!(exec.spawned()[0].argv().unwrap(), ["sudo", "apt", "install", "git"]);
    }

    #[test]
    fn dry_run_flows_into_context() {
        let (session, _) = session(Config::default(), &[]);
        assert!(session.with_dry_run(true).context().dry_run);
    }
}
