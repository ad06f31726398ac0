//! Typed provisioning document: applications, tools, and the system directive.
//!
//! The document is read once per session, deserialized into raw `serde`
//! structs by [`loader`], and converted into [`Config`] with every required
//! field checked eagerly, so a malformed item fails the load instead of
//! surfacing halfway through an operation.
pub mod loader;
pub mod validation;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::resources::package_manager::PackageManager;

pub use loader::DocumentFormat;
pub use validation::ValidationWarning;

/// Default universal manager used for `packaged` items.
pub const DEFAULT_PACKAGED_MANAGER: &str = "flatpak";

/// How a single item is provisioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    /// Installed through the host's default package manager, with `sudo`.
    Native,
    /// Installed through the universal manager named by
    /// [`Config::packaged_manager`].
    Packaged {
        /// Append the manager's upgrade arguments to the install command.
        upgrade_on_install: bool,
    },
    /// Installed by running a literal shell command.
    Custom {
        /// Command line handed to `sh -c`.
        command: String,
    },
}

impl ItemKind {
    /// Short label used in logs and listings.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Packaged { .. } => "packaged",
            Self::Custom { .. } => "custom",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One thing to provision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionItem {
    /// Command name or package identifier; never empty.
    pub name: String,
    /// Provisioning mechanism.
    pub kind: ItemKind,
}

impl ProvisionItem {
    /// A native package installed with the host default manager.
    #[must_use]
    pub fn native(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ItemKind::Native,
        }
    }

    /// A package installed with the universal manager.
    #[must_use]
    pub fn packaged(name: impl Into<String>, upgrade_on_install: bool) -> Self {
        Self {
            name: name.into(),
            kind: ItemKind::Packaged { upgrade_on_install },
        }
    }

    /// An item installed by a literal shell command.
    #[must_use]
    pub fn custom(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ItemKind::Custom {
                command: command.into(),
            },
        }
    }
}

/// The `[system]` upgrade directive. It takes no parameters: the upgrade
/// always targets the host default package manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[allow(clippy::empty_structs_with_brackets)] // `[system]` is an empty table, not a unit
pub struct SystemDirective {}

/// All loaded configuration for one provisioning session.
///
/// Owned by the session and replaced as a whole on reload; operations hold
/// an `Arc<Config>` snapshot and never see a half-updated document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where the document came from (file path or `"<inline>"`).
    pub origin: String,
    /// Catalog identifier of the manager used for `packaged` items.
    pub packaged_manager: String,
    /// Applications, in document order.
    pub applications: Vec<ProvisionItem>,
    /// Tools, in document order. Every tool is a [`ItemKind::Custom`] item.
    pub tools: Vec<ProvisionItem>,
    /// System upgrade directive, if the document declares one.
    pub system: Option<SystemDirective>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: "<default>".to_string(),
            packaged_manager: DEFAULT_PACKAGED_MANAGER.to_string(),
            applications: Vec::new(),
            tools: Vec::new(),
            system: None,
        }
    }
}

impl Config {
    /// Read and validate the document at `path`.
    ///
    /// The format is chosen from the file extension (see
    /// [`DocumentFormat::from_path`]).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Unreadable`] if the file cannot be read,
    /// [`ConfigError::Parse`] if it is not a valid document, and one of the
    /// item variants if an item is malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = loader::read_document(path)?;
        Self::from_raw(raw, path.display().to_string())
    }

    /// Parse and validate a document held in memory.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`], minus the I/O failure.
    pub fn parse(text: &str, format: DocumentFormat, origin: &str) -> Result<Self, ConfigError> {
        let raw = loader::parse_document(text, format, origin)?;
        Self::from_raw(raw, origin.to_string())
    }

    /// Run the non-fatal lint checks against `catalog`.
    #[must_use]
    pub fn validate(&self, catalog: &[PackageManager]) -> Vec<ValidationWarning> {
        validation::validate_all(self, catalog)
    }

    fn from_raw(raw: loader::RawDocument, origin: String) -> Result<Self, ConfigError> {
        let applications = raw
            .applications
            .into_iter()
            .enumerate()
            .map(|(index, app)| app.into_item(index))
            .collect::<Result<Vec<_>, _>>()?;
        let tools = raw
            .tools
            .into_iter()
            .enumerate()
            .map(|(index, tool)| tool.into_item(index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            origin,
            packaged_manager: raw
                .packaged_manager
                .unwrap_or_else(|| DEFAULT_PACKAGED_MANAGER.to_string()),
            applications,
            tools,
            system: raw.system,
        })
    }
}
