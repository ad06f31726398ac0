//! Document reading and format detection (TOML or YAML).
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{ProvisionItem, SystemDirective};
use crate::error::ConfigError;

/// Serialization format of a provisioning document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// TOML (`jumpstart.toml`).
    Toml,
    /// YAML (`config.yaml`).
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from the file extension; anything that is not
    /// `.yaml`/`.yml` is read as TOML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Toml,
        }
    }
}

/// Document as written by the user, before item validation.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct RawDocument {
    pub(super) packaged_manager: Option<String>,
    #[serde(default)]
    pub(super) applications: Vec<RawApplication>,
    #[serde(default)]
    pub(super) tools: Vec<RawTool>,
    pub(super) system: Option<SystemDirective>,
}

/// One entry of the `applications` list.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct RawApplication {
    name: String,
    #[serde(alias = "type")]
    kind: Option<String>,
    #[serde(default)]
    upgrade: bool,
    cmd: Option<String>,
}

/// One entry of the `tools` list.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct RawTool {
    name: String,
    cmd: Option<String>,
}

const APPLICATIONS: &str = "applications";
const TOOLS: &str = "tools";

fn checked_name(name: String, section: &str, index: usize) -> Result<String, ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::EmptyName {
            section: section.to_string(),
            index,
        });
    }
    Ok(name)
}

fn required_cmd(cmd: Option<String>, section: &str, name: &str) -> Result<String, ConfigError> {
    cmd.filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingCommand {
            section: section.to_string(),
            name: name.to_string(),
        })
}

impl RawApplication {
    pub(super) fn into_item(self, index: usize) -> Result<ProvisionItem, ConfigError> {
        let name = checked_name(self.name, APPLICATIONS, index)?;
        let Some(kind) = self.kind else {
            return Err(ConfigError::MissingKind {
                section: APPLICATIONS.to_string(),
                name,
            });
        };
        match kind.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(ProvisionItem::native(name)),
            // "flatpak" is the kind name used by older documents.
            "packaged" | "flatpak" => Ok(ProvisionItem::packaged(name, self.upgrade)),
            "custom" => {
                let cmd = required_cmd(self.cmd, APPLICATIONS, &name)?;
                Ok(ProvisionItem::custom(name, cmd))
            }
            "" => Err(ConfigError::MissingKind {
                section: APPLICATIONS.to_string(),
                name,
            }),
            _ => Err(ConfigError::UnknownKind {
                section: APPLICATIONS.to_string(),
                name,
                kind,
            }),
        }
    }
}

impl RawTool {
    pub(super) fn into_item(self, index: usize) -> Result<ProvisionItem, ConfigError> {
        let name = checked_name(self.name, TOOLS, index)?;
        let cmd = required_cmd(self.cmd, TOOLS, &name)?;
        Ok(ProvisionItem::custom(name, cmd))
    }
}

fn deserialize<T: DeserializeOwned + Default>(
    text: &str,
    format: DocumentFormat,
    origin: &str,
) -> Result<T, ConfigError> {
    let parse_err = |message: String| ConfigError::Parse {
        origin: origin.to_string(),
        message,
    };
    match format {
        DocumentFormat::Toml => toml::from_str(text).map_err(|e| parse_err(e.to_string())),
        DocumentFormat::Yaml => {
            let value: serde_yaml::Value =
                serde_yaml::from_str(text).map_err(|e| parse_err(e.to_string()))?;
            match unwrap_legacy_root(value) {
                // An empty YAML stream is `null`, not an empty mapping.
                serde_yaml::Value::Null => Ok(T::default()),
                value => serde_yaml::from_value(value).map_err(|e| parse_err(e.to_string())),
            }
        }
    }
}

/// Older YAML documents nest every section under a single root key.
const LEGACY_ROOT: &str = "myjumpstarter";

fn unwrap_legacy_root(value: serde_yaml::Value) -> serde_yaml::Value {
    match value {
        serde_yaml::Value::Mapping(mut map) if map.len() == 1 => {
            match map.remove(LEGACY_ROOT) {
                Some(inner) => inner,
                None => serde_yaml::Value::Mapping(map),
            }
        }
        other => other,
    }
}

/// Parse a document held in memory.
pub(super) fn parse_document(
    text: &str,
    format: DocumentFormat,
    origin: &str,
) -> Result<RawDocument, ConfigError> {
    deserialize(text, format, origin)
}

/// Read and parse the document at `path`.
pub(super) fn read_document(path: &Path) -> Result<RawDocument, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.display().to_string(),
        source,
    })?;
    parse_document(
        &text,
        DocumentFormat::from_path(path),
        &path.display().to_string(),
    )
}
