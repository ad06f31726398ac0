//! Domain-specific error types for the provisioning engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Engine modules return typed errors (e.g., [`ConfigError`], [`ResolveError`])
//! while command handlers at the CLI boundary convert them to [`anyhow::Error`]
//! via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! JumpstartError
//! ├── Config(ConfigError)   : unreadable document, malformed items
//! ├── Resolve(ResolveError) : unknown or unavailable package manager
//! ├── Action(ActionError)   : registry construction and dispatch
//! └── Exec(ExecError)       : child process could not be started
//! ```
//!
//! A non-zero exit code is deliberately absent from this hierarchy: it is
//! reported as data in [`ExecEvent::Exited`](crate::exec::ExecEvent::Exited).

use thiserror::Error;

/// Top-level error type for the provisioning engine.
///
/// Aggregates domain-specific sub-errors and is convertible to
/// [`anyhow::Error`] for use at CLI command boundaries.
#[derive(Error, Debug)]
pub enum JumpstartError {
    /// Configuration-related error (reading, parsing, item validation).
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Package manager resolution error.
    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// Action registry error (duplicate or unknown identifier).
    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    /// Process launch error.
    #[error("Execution error: {0}")]
    Exec(#[from] ExecError),
}

/// Errors that arise while loading the provisioning document.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration source could not be read.
    #[error("cannot read config file {path}: {source}")]
    Unreadable {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration source was read but is not a valid document.
    #[error("cannot parse config {origin}: {message}")]
    Parse {
        /// File path or other description of the source.
        origin: String,
        /// Parser diagnostic.
        message: String,
    },

    /// An item has no `kind`.
    #[error("{section} item '{name}' has no kind (expected native, packaged or custom)")]
    MissingKind {
        /// Document section holding the item (`applications`, `tools`).
        section: String,
        /// Item name.
        name: String,
    },

    /// An item has a `kind` value that is not recognised.
    #[error("{section} item '{name}' has unknown kind '{kind}'")]
    UnknownKind {
        /// Document section holding the item.
        section: String,
        /// Item name.
        name: String,
        /// The unrecognised value.
        kind: String,
    },

    /// A custom item has no command to run.
    #[error("{section} item '{name}' is custom but has no cmd")]
    MissingCommand {
        /// Document section holding the item.
        section: String,
        /// Item name.
        name: String,
    },

    /// An item has an empty name.
    #[error("{section} item #{index} has an empty name")]
    EmptyName {
        /// Document section holding the item.
        section: String,
        /// Zero-based position of the item within its section.
        index: usize,
    },
}

/// Errors that arise while picking a package manager for the host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The requested manager is not part of the catalog.
    #[error("unknown package manager '{0}'")]
    UnknownManager(String),

    /// No catalog manager was found on this host.
    #[error("no supported package manager found on this host")]
    NoManager,
}

/// Errors that arise from the action registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// No registered action has the requested identifier.
    #[error("unknown action '{0}'")]
    UnknownAction(String),

    /// Two actions were registered with the same identifier.
    #[error("duplicate action id '{0}'")]
    DuplicateId(String),
}

/// Errors that arise when starting a child process.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The process could not be started (binary missing, permission denied).
    #[error("failed to launch '{program}': {source}")]
    LaunchFailed {
        /// Program (or shell line) that was being started.
        program: String,
        /// Underlying I/O error from the spawn call.
        source: std::io::Error,
    },
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    // -----------------------------------------------------------------------
    // ConfigError
    // -----------------------------------------------------------------------

    #[test]
    fn config_error_unreadable_display() {
        let e = ConfigError::Unreadable {
            path: "/home/u/jumpstart.toml".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(e.to_string().contains("/home/u/jumpstart.toml"));
        assert!(e.to_string().contains("cannot read config file"));
    }

    #[test]
    fn config_error_unreadable_has_source() {
        use std::error::Error as StdError;
        let e = ConfigError::Unreadable {
            path: "jumpstart.toml".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert!(e.source().is_some());
    }

    #[test]
    fn config_error_missing_kind_display() {
        let e = ConfigError::MissingKind {
            section: "applications".to_string(),
            name: "git".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "applications item 'git' has no kind (expected native, packaged or custom)"
        );
    }

    #[test]
    fn config_error_unknown_kind_display() {
        let e = ConfigError::UnknownKind {
            section: "applications".to_string(),
            name: "git".to_string(),
            kind: "snap".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "applications item 'git' has unknown kind 'snap'"
        );
    }

    #[test]
    fn config_error_empty_name_display() {
        let e = ConfigError::EmptyName {
            section: "tools".to_string(),
            index: 2,
        };
        assert_eq!(e.to_string(), "tools item #2 has an empty name");
    }

    // -----------------------------------------------------------------------
    // ResolveError / ActionError
    // -----------------------------------------------------------------------

    #[test]
    fn resolve_error_display() {
        assert_eq!(
            ResolveError::UnknownManager("snap".to_string()).to_string(),
            "unknown package manager 'snap'"
        );
        assert_eq!(
            ResolveError::NoManager.to_string(),
            "no supported package manager found on this host"
        );
    }

    #[test]
    fn action_error_display() {
        assert_eq!(
            ActionError::UnknownAction("zz".to_string()).to_string(),
            "unknown action 'zz'"
        );
        assert_eq!(
            ActionError::DuplicateId("ti".to_string()).to_string(),
            "duplicate action id 'ti'"
        );
    }

    #[test]
    fn exec_error_launch_failed_display() {
        let e = ExecError::LaunchFailed {
            program: "frobnicate".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(e.to_string().starts_with("failed to launch 'frobnicate'"));
    }

    // -----------------------------------------------------------------------
    // JumpstartError conversions
    // -----------------------------------------------------------------------

    #[test]
    fn jumpstart_error_from_sub_errors() {
        let e: JumpstartError = ResolveError::NoManager.into();
        assert!(e.to_string().contains("Resolution error"));

        let e: JumpstartError = ActionError::UnknownAction("x".to_string()).into();
        assert!(e.to_string().contains("Action error"));

        let e: JumpstartError = ConfigError::EmptyName {
            section: "tools".to_string(),
            index: 0,
        }
        .into();
        assert!(e.to_string().contains("Configuration error"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<JumpstartError>();
        assert_send_sync::<ConfigError>();
        assert_send_sync::<ResolveError>();
        assert_send_sync::<ActionError>();
        assert_send_sync::<ExecError>();
    }

    #[test]
    fn errors_convert_to_anyhow() {
        let _e: anyhow::Error = ResolveError::NoManager.into();
        let _e: anyhow::Error = ActionError::DuplicateId("a".to_string()).into();
    }
}
