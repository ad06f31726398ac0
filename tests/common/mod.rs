// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed configuration document, a fluent
// builder, and a recording executor so each integration test can set up an
// isolated session without touching the host.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use jumpstart::error::ExecError;
use jumpstart::exec::{ExecEvent, ExecStream, Executor};
use jumpstart::logging::Logger;
use jumpstart::resources::plan::InstallPlan;
use jumpstart::session::ProvisioningSession;

/// An isolated configuration document backed by a [`tempfile::TempDir`].
///
/// The directory is automatically deleted when dropped.
pub struct IntegrationTestContext {
    /// Temporary directory holding the document.
    pub root: tempfile::TempDir,
    /// Path of the written document.
    pub config_path: PathBuf,
}

impl IntegrationTestContext {
    /// Path to the temporary directory.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Open a session over the document with `executor`.
    pub fn open(&self, executor: Arc<dyn Executor>) -> ProvisioningSession {
        ProvisioningSession::open(&self.config_path, executor, Arc::new(Logger::new("test")))
            .expect("open session")
    }
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    filename: String,
    content: String,
}

impl TestContextBuilder {
    /// Begin building an empty TOML document.
    pub fn new() -> Self {
        Self {
            filename: "jumpstart.toml".to_string(),
            content: String::new(),
        }
    }

    /// Write `content` as a TOML document.
    pub fn with_toml(mut self, content: &str) -> Self {
        "jumpstart.toml".clone_into(&mut self.filename);
        content.clone_into(&mut self.content);
        self
    }

    /// Write `content` as a YAML document.
    pub fn with_yaml(mut self, content: &str) -> Self {
        "config.yaml".clone_into(&mut self.filename);
        content.clone_into(&mut self.content);
        self
    }

    /// Write the document and return the context.
    pub fn build(self) -> IntegrationTestContext {
        let root = tempfile::tempdir().expect("create temp dir");
        let config_path = root.path().join(&self.filename);
        std::fs::write(&config_path, &self.content).expect("write config document");
        IntegrationTestContext { root, config_path }
    }
}

/// Executor that answers `which` from a fixed set and records spawned plans.
///
/// Every spawn exits immediately with code `0` and no output.
#[derive(Debug, Default)]
pub struct FakeHost {
    present: HashSet<String>,
    spawned: Mutex<Vec<InstallPlan>>,
}

impl FakeHost {
    /// A host where only `present` resolve on `PATH`.
    pub fn with_present(present: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            present: present.iter().map(|p| (*p).to_string()).collect(),
            spawned: Mutex::new(Vec::new()),
        })
    }

    /// Spawned plans rendered as command lines, in order.
    pub fn spawned(&self) -> Vec<String> {
        self.spawned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

impl Executor for FakeHost {
    fn which(&self, program: &str) -> bool {
        self.present.contains(program)
    }

    fn spawn(&self, plan: &InstallPlan) -> Result<ExecStream, ExecError> {
        self.spawned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(plan.clone());
        Ok(Box::new(std::iter::once(ExecEvent::Exited { code: Some(0) })))
    }
}

/// A document in the older YAML style, with every section under one root.
pub const LEGACY_YAML: &str = "\
myjumpstarter:
  applications:
    - name: git
      type: native
    - name: org.gimp.GIMP
      type: flatpak
      upgrade: true
  tools:
    - name: rustup
      cmd: curl https://sh.rustup.rs -sSf | sh -s -- -y
  system: {}
";
