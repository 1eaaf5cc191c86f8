//! Document assembly.
//!
//! Assembly runs in two passes over the discovered templates. The first
//! merges every export table; the second finalizes each template against the
//! user data bag layered over those exports, so a dependency declared by
//! authoring key or by logical key resolves to the logical key of its target.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cfgen_core::{DataBag, ExportMap, FinalizedResource, Template};

use crate::error::{BuildError, BuildResult};

/// Template format version written into every document.
pub const FORMAT_VERSION: &str = "2010-09-09";

/// Serialization format of the assembled document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(BuildError::Config(format!("Unknown output format: {}", other))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Options controlling assembly.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    pub description: Option<String>,
    /// Fail when a finalized dependency names no resource of the document.
    pub strict_dependencies: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            description: None,
            strict_dependencies: true,
        }
    }
}

impl AssembleOptions {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_strict_dependencies(mut self, strict: bool) -> Self {
        self.strict_dependencies = strict;
        self
    }
}

/// The assembled document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, FinalizedResource>,
    /// Authoring key to logical key, for every template.
    #[serde(skip)]
    pub exports: ExportMap,
}

impl Document {
    pub fn resource(&self, key: &str) -> Option<&FinalizedResource> {
        self.resources.get(key)
    }

    pub fn to_json(&self) -> BuildResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> BuildResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn render(&self, format: OutputFormat) -> BuildResult<String> {
        match format {
            OutputFormat::Json => self.to_json(),
            OutputFormat::Yaml => self.to_yaml(),
        }
    }

    pub fn exports_json(&self) -> BuildResult<String> {
        Ok(serde_json::to_string_pretty(&self.exports)?)
    }
}

/// Merges finalized templates into one document.
#[derive(Debug, Clone, Default)]
pub struct DocumentAssembler {
    data: DataBag,
    options: AssembleOptions,
}

impl DocumentAssembler {
    pub fn new(data: DataBag) -> Self {
        Self {
            data,
            options: AssembleOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AssembleOptions) -> Self {
        self.options = options;
        self
    }

    /// Merge every template's export table. Later entries win.
    pub fn merge_exports(templates: &[Template]) -> ExportMap {
        let mut exports = ExportMap::new();
        for template in templates {
            for (name, key) in template.exported_properties() {
                if let Some(previous) = exports.insert(name.clone(), key.clone()) {
                    if previous != *key {
                        warn!(
                            "Export [{}] remapped from [{}] to [{}]",
                            name, previous, key
                        );
                    }
                }
            }
        }
        exports
    }

    pub fn assemble(&self, templates: &[Template]) -> BuildResult<Document> {
        let exports = Self::merge_exports(templates);
        // Logical keys resolve to themselves, then exports, then user data.
        let data = templates
            .iter()
            .map(|t| (t.key(), t.key()))
            .collect::<DataBag>()
            .overlay(&exports.iter().collect::<DataBag>())
            .overlay(&self.data);

        let mut resources = BTreeMap::new();
        for template in templates {
            let key = template.key();
            if resources.contains_key(key) {
                return Err(BuildError::DuplicateDefinition(format!(
                    "A resource with key [{}] has already been defined",
                    key
                )));
            }
            debug!("Finalizing template: {}", key);
            resources.insert(key.to_string(), template.finalize(&data));
        }

        if self.options.strict_dependencies {
            check_dependencies(&resources)?;
        }

        info!("Assembled document with {} resources", resources.len());
        Ok(Document {
            format_version: FORMAT_VERSION.to_string(),
            description: self.options.description.clone(),
            resources,
            exports,
        })
    }
}

fn check_dependencies(resources: &BTreeMap<String, FinalizedResource>) -> BuildResult<()> {
    for (key, resource) in resources {
        if let Some(missing) = resource
            .depends_on
            .iter()
            .find(|dependency| !resources.contains_key(dependency.as_str()))
        {
            return Err(BuildError::UnresolvedDependency {
                resource: key.clone(),
                dependency: missing.clone(),
            });
        }
    }
    Ok(())
}
