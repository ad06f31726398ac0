//! Declarative environment provisioning engine.
//!
//! Reads a document listing tools, applications, and a system upgrade
//! directive, then installs whatever is missing through the host's package
//! manager, a universal manager, or literal shell commands.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: parse and validate the provisioning document
//! - **[`resources`]**: manager catalog, host resolution, plan compilation, presence checks
//! - **[`exec`]**: child processes with streamed output
//! - **[`tasks`]**: confirm-then-run operations and the action registry
//! - **[`session`]**: one configuration, one host, one cached resolution
//! - **[`commands`]**: top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod confirm;
pub mod error;
pub mod exec;
pub mod logging;
pub mod resources;
pub mod session;
pub mod tasks;
