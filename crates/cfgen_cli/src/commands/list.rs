//! List command - Show the templates discovered in the tree.

use anyhow::Result;
use clap::Args;
use tracing::info;

use cfgen_build::TemplateBuilder;

use super::SourceArgs;
use crate::generators;

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// List the built-in generators instead
    #[arg(long)]
    generators: bool,
}

pub async fn execute(args: ListArgs) -> Result<()> {
    let registry = generators::builtin_registry()?;

    if args.generators {
        for name in registry.names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let current_dir = std::env::current_dir()?;
    let config = args.source.load_config(&current_dir)?;
    let data = config.load_data()?;

    let templates = TemplateBuilder::new(&config.root)?
        .with_registry(registry)
        .with_extensions(config.extensions.clone())
        .with_data(data)
        .build()
        .await?;

    if templates.is_empty() {
        println!("No templates found in {:?}", config.root);
        return Ok(());
    }

    let width = templates.iter().map(|t| t.key().len()).max().unwrap_or(0);
    for template in &templates {
        println!("{:width$}  {}", template.key(), template.resource_type(), width = width);
    }
    info!("Found {} templates", templates.len());

    Ok(())
}
