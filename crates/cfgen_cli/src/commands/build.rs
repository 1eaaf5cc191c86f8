//! Build command - Assemble the template tree into one document.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use cfgen_build::{OutputFormat, TemplateBuilder};

use super::SourceArgs;
use crate::generators;

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Data bag file (JSON or YAML mapping)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Data bag entry; wins over file data (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    set: Vec<(String, String)>,

    /// Output format (json, yaml)
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Write the document to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the export table (JSON) to a file
    #[arg(long)]
    exports: Option<PathBuf>,

    /// Document description
    #[arg(long)]
    description: Option<String>,

    /// Allow dependencies on resources outside the document
    #[arg(long)]
    no_strict_deps: bool,
}

pub async fn execute(args: BuildArgs) -> Result<()> {
    let current_dir = std::env::current_dir()?;
    let mut config = args.source.load_config(&current_dir)?;

    if let Some(data) = args.data {
        config.data_file = Some(current_dir.join(data));
    }
    config.data.extend(args.set);
    if let Some(format) = args.format {
        config.format = format;
    }
    if args.description.is_some() {
        config.description = args.description;
    }
    if args.no_strict_deps {
        config.strict_dependencies = false;
    }

    info!("Building templates from {:?}", config.root);

    let document = TemplateBuilder::new(&config.root)?
        .with_registry(generators::builtin_registry()?)
        .with_extensions(config.extensions.clone())
        .with_data(config.load_data()?)
        .build_document(config.assemble_options())
        .await?;

    let rendered = document.render(config.format)?;
    match &args.output {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("Failed to write document to {:?}", path))?;
            info!(
                "Wrote {} resources to {:?}",
                document.resources.len(),
                path
            );
        }
        None => println!("{}", rendered),
    }

    if let Some(path) = &args.exports {
        fs::write(path, document.exports_json()?)
            .with_context(|| format!("Failed to write exports to {:?}", path))?;
        info!("Wrote export table to {:?}", path);
    }

    Ok(())
}

/// Parse a `KEY=VALUE` pair.
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{}`", s))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}
