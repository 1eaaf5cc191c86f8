//! # cfgen_build
//!
//! Directory-driven template discovery and document assembly for cfgen.
//!
//! A template tree is a directory of unit files (`*.cfn.yaml`, `*.cfn.yml`,
//! `*.cfn.json`) and subdirectories. Each unit either lists templates
//! declaratively or names a generator compiled into the binary and
//! registered in a [`TemplateRegistry`]:
//!
//! - [`TemplateBuilder`] walks the tree and collects templates in pre-order
//! - [`DocumentAssembler`] finalizes them into one [`Document`] plus an
//!   export table
//! - [`BuildConfig`] carries the settings of one build (`cfgen.yaml`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use cfgen_build::{AssembleOptions, TemplateBuilder, TemplateRegistry};
//! use cfgen_core::{CoreResult, DataBag, Emitted, Template};
//! use cfgen_build::DirContext;
//!
//! # async fn run() -> cfgen_build::BuildResult<()> {
//! let mut registry = TemplateRegistry::new();
//! registry.register("queues", |_: &DirContext, data: &DataBag| -> CoreResult<Emitted> {
//!     let key = data.get("queue").unwrap_or("work-queue");
//!     Ok(Template::new(key, "AWS::SQS::Queue")?.into())
//! })?;
//!
//! let document = TemplateBuilder::new("templates")?
//!     .with_registry(registry)
//!     .with_data(DataBag::new().with("stage", "dev"))
//!     .build_document(AssembleOptions::default())
//!     .await?;
//!
//! println!("{}", document.to_json()?);
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod builder;
pub mod config;
pub mod context;
pub mod error;
pub mod registry;
pub mod unit;

pub use assembler::{AssembleOptions, Document, DocumentAssembler, OutputFormat, FORMAT_VERSION};
pub use builder::TemplateBuilder;
pub use config::{load_data_file, BuildConfig, CONFIG_FILE_NAME};
pub use context::DirContext;
pub use error::{BuildError, BuildResult};
pub use registry::{TemplateFactory, TemplateRegistry};
pub use unit::{is_unit_file, TemplateSpec, UnitDescriptor, DEFAULT_EXTENSIONS};
