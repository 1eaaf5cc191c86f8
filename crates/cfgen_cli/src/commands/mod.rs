//! CLI command definitions.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use cfgen_build::{BuildConfig, CONFIG_FILE_NAME};

pub mod build;
pub mod list;

/// cfgen - CloudFormation document generator
#[derive(Parser)]
#[command(name = "cfgen")]
#[command(version, about = "cfgen - CloudFormation document generator")]
#[command(long_about = r#"
cfgen assembles one CloudFormation document from a directory tree of
template units (*.cfn.yaml, *.cfn.yml, *.cfn.json).

COMMANDS:
  build  → Build the template tree into one document
  list   → List the templates discovered in the tree

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Discovery error
  4 - Template error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the template tree into one document
    Build(build::BuildArgs),

    /// List discovered templates
    List(list::ListArgs),
}

/// Where to find the template tree and its configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Template tree root (overrides the configuration)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Configuration file (defaults to ./cfgen.yaml when present)
    #[arg(short, long, env = "CFGEN_CONFIG")]
    pub config: Option<PathBuf>,
}

impl SourceArgs {
    /// Load the build configuration, relative to `current_dir`.
    pub fn load_config(&self, current_dir: &Path) -> Result<BuildConfig> {
        let path = match &self.config {
            Some(path) => Some(current_dir.join(path)),
            None => Some(current_dir.join(CONFIG_FILE_NAME)).filter(|p| p.is_file()),
        };

        let mut config = match path {
            Some(path) => BuildConfig::from_file(&path)?,
            None => {
                debug!("No configuration file, using defaults");
                let mut config = BuildConfig::default();
                config.root = current_dir.join(&config.root);
                config
            }
        };

        if let Some(root) = &self.root {
            config.root = current_dir.join(root);
        }
        Ok(config)
    }
}
