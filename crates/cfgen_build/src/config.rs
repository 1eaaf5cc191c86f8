//! Build configuration (`cfgen.yaml`).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use cfgen_core::DataBag;

use crate::assembler::{AssembleOptions, OutputFormat};
use crate::error::{BuildError, BuildResult};
use crate::unit::DEFAULT_EXTENSIONS;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "cfgen.yaml";

/// Settings for one build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Root of the template tree.
    pub root: PathBuf,
    /// Unit file extensions, without the leading dot.
    pub extensions: Vec<String>,
    pub description: Option<String>,
    /// Inline data bag entries. These win over `data_file`.
    pub data: BTreeMap<String, String>,
    /// JSON or YAML mapping loaded as the base data bag.
    pub data_file: Option<PathBuf>,
    pub format: OutputFormat,
    pub strict_dependencies: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("templates"),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            description: None,
            data: BTreeMap::new(),
            data_file: None,
            format: OutputFormat::default(),
            strict_dependencies: true,
        }
    }
}

impl BuildConfig {
    /// Load a configuration file. Relative paths inside it are resolved
    /// against the file's directory.
    pub fn from_file(path: &Path) -> BuildResult<Self> {
        debug!("Loading build configuration from {:?}", path);
        let content = fs::read_to_string(path)
            .map_err(|e| BuildError::Config(format!("Failed to read {:?}: {}", path, e)))?;
        let mut config: Self = serde_yaml::from_str::<Option<Self>>(&content)
            .map_err(|e| BuildError::Config(format!("Invalid configuration {:?}: {}", path, e)))?
            .unwrap_or_default();

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.root = base.join(&config.root);
        config.data_file = config.data_file.map(|file| base.join(file));
        Ok(config)
    }

    pub fn to_file(&self, path: &Path) -> BuildResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_yaml::to_string(self)?)?;
        debug!("Saved build configuration to {:?}", path);
        Ok(())
    }

    /// The data bag for this build: `data_file` overlaid by inline `data`.
    pub fn load_data(&self) -> BuildResult<DataBag> {
        let base = match &self.data_file {
            Some(file) => load_data_file(file)?,
            None => DataBag::new(),
        };
        let inline: DataBag = self.data.clone().into();
        Ok(base.overlay(&inline))
    }

    pub fn assemble_options(&self) -> AssembleOptions {
        AssembleOptions {
            description: self.description.clone(),
            strict_dependencies: self.strict_dependencies,
        }
    }
}

/// Load a data bag from a JSON (`.json`) or YAML file.
pub fn load_data_file(path: &Path) -> BuildResult<DataBag> {
    debug!("Loading data bag from {:?}", path);
    let content = fs::read_to_string(path)
        .map_err(|e| BuildError::Config(format!("Failed to read data file {:?}: {}", path, e)))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let value: Value = if is_json {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str::<Option<Value>>(&content)?.unwrap_or(Value::Null)
    };
    Ok(DataBag::from_value(value))
}
