//! Shared state handed to every operation.
use std::sync::Arc;

use crate::config::Config;
use crate::exec::Executor;
use crate::logging::Log;
use crate::resources::package_manager::HostResolver;

/// Shared context for operation execution.
///
/// Cheap to clone: every field is an `Arc` or a flag. A running operation
/// keeps its own clone, so replacing the session's config never affects an
/// operation that has already started.
#[derive(Clone)]
pub struct Context {
    /// Configuration snapshot the operation works from.
    pub config: Arc<Config>,
    /// Package manager resolution with the session's cached default.
    pub resolver: Arc<HostResolver>,
    /// Presence probes and process spawning.
    pub executor: Arc<dyn Executor>,
    /// Logger for output and operation recording.
    pub log: Arc<dyn Log>,
    /// Compile plans but do not start any process.
    pub dry_run: bool,
    /// Run an operation's presence probes concurrently.
    pub parallel: bool,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config.origin)
            .field("resolver", &self.resolver)
            .field("executor", &"<dyn Executor>")
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl Context {
    /// Creates a new context for operation execution.
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        resolver: Arc<HostResolver>,
        executor: Arc<dyn Executor>,
        log: Arc<dyn Log>,
    ) -> Self {
        Self {
            config,
            resolver,
            executor,
            log,
            dry_run: false,
            parallel: true,
        }
    }

    /// Create a copy of this context that previews instead of executing.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Create a copy of this context with presence probes run in order on
    /// the calling thread.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create a copy of this context bound to a different configuration.
    #[must_use]
    pub fn with_config(&self, config: Arc<Config>) -> Self {
        Self {
            config,
            ..self.clone()
        }
    }
}
