//! Non-fatal lint checks run over a loaded [`Config`].
//!
//! Malformed items are rejected at load time; the checks here flag documents
//! that load fine but probably do not say what the user meant.
use std::collections::HashSet;

use super::{Config, ItemKind, ProvisionItem};
use crate::resources::package_manager::PackageManager;

/// A validation warning detected after configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The configuration section (e.g., "applications", "tools").
    pub source: String,
    /// The specific item or key that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Warning about `item` in `source`.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            item: item.into(),
            message: message.into(),
        }
    }
}

/// Trait for configuration validators.
pub trait ConfigValidator {
    /// Validate the configuration and return any warnings found.
    fn validate(&self) -> Vec<ValidationWarning>;
}

/// Checks within one item section.
#[derive(Debug)]
pub struct SectionValidator<'a> {
    section: &'static str,
    items: &'a [ProvisionItem],
}

impl<'a> SectionValidator<'a> {
    /// Validator for the items of one section.
    #[must_use]
    pub const fn new(section: &'static str, items: &'a [ProvisionItem]) -> Self {
        Self { section, items }
    }
}

impl ConfigValidator for SectionValidator<'_> {
    fn validate(&self) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();

        for item in self.items {
            if !seen.insert(item.name.as_str()) {
                warnings.push(ValidationWarning::new(
                    self.section,
                    &item.name,
                    "listed more than once; it will be processed again",
                ));
            }

            let is_package = matches!(item.kind, ItemKind::Native | ItemKind::Packaged { .. });
            if is_package && item.name.chars().any(char::is_whitespace) {
                warnings.push(ValidationWarning::new(
                    self.section,
                    &item.name,
                    "package name contains whitespace; list each package separately",
                ));
            }
        }

        warnings
    }
}

/// Checks that the universal manager named by the document exists.
#[derive(Debug)]
pub struct PackagedManagerValidator<'a> {
    manager: &'a str,
    applications: &'a [ProvisionItem],
    catalog: &'a [PackageManager],
}

impl<'a> PackagedManagerValidator<'a> {
    /// Validator for the configured packaged manager name.
    #[must_use]
    pub const fn new(
        manager: &'a str,
        applications: &'a [ProvisionItem],
        catalog: &'a [PackageManager],
    ) -> Self {
        Self {
            manager,
            applications,
            catalog,
        }
    }
}

impl ConfigValidator for PackagedManagerValidator<'_> {
    fn validate(&self) -> Vec<ValidationWarning> {
        let has_packaged = self
            .applications
            .iter()
            .any(|item| matches!(item.kind, ItemKind::Packaged { .. }));
        if !has_packaged || self.catalog.iter().any(|m| m.name == self.manager) {
            return Vec::new();
        }

        let known: Vec<&str> = self.catalog.iter().map(|m| m.name).collect();
        vec![ValidationWarning::new(
            "packaged_manager",
            self.manager,
            format!(
                "not a known package manager (expected one of: {}); packaged applications will fail",
                known.join(", ")
            ),
        )]
    }
}

/// Checks between the `tools` and `applications` sections.
#[derive(Debug)]
pub struct CrossSectionValidator<'a> {
    applications: &'a [ProvisionItem],
    tools: &'a [ProvisionItem],
}

impl<'a> CrossSectionValidator<'a> {
    /// Validator comparing names across both sections.
    #[must_use]
    pub const fn new(applications: &'a [ProvisionItem], tools: &'a [ProvisionItem]) -> Self {
        Self {
            applications,
            tools,
        }
    }
}

impl ConfigValidator for CrossSectionValidator<'_> {
    fn validate(&self) -> Vec<ValidationWarning> {
        let app_names: HashSet<&str> = self.applications.iter().map(|a| a.name.as_str()).collect();
        self.tools
            .iter()
            .filter(|tool| app_names.contains(tool.name.as_str()))
            .map(|tool| {
                ValidationWarning::new(
                    "tools",
                    &tool.name,
                    "also listed under applications; both entries will run",
                )
            })
            .collect()
    }
}

/// Validate all configuration and return collected warnings.
#[must_use]
pub fn validate_all(config: &Config, catalog: &[PackageManager]) -> Vec<ValidationWarning> {
    let validators: Vec<Box<dyn ConfigValidator + '_>> = vec![
        Box::new(SectionValidator::new("applications", &config.applications)),
        Box::new(SectionValidator::new("tools", &config.tools)),
        Box::new(PackagedManagerValidator::new(
            &config.packaged_manager,
            &config.applications,
            catalog,
        )),
        Box::new(CrossSectionValidator::new(
            &config.applications,
            &config.tools,
        )),
    ];

    validators
        .iter()
        .flat_map(|validator| validator.validate())
        .collect()
}
