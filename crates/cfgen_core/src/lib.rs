//! # cfgen_core
//!
//! Template and reference engine for cfgen.
//!
//! This crate provides the building blocks every resource builder is made of:
//!
//! - **Property tree**: [`PropertyValue`], with deferred `<% token %>` strings
//!   kept apart from literal strings
//! - **Data bag**: [`DataBag`], the substitution values applied at finalize time
//! - **References**: logical and literal references resolving to
//!   CloudFormation expressions
//! - **Templates**: [`Template`], a property tree plus dependencies that
//!   finalizes into one resource of the output document
//!
//! # Example
//!
//! ```rust
//! use cfgen_core::{DataBag, PropertyValue, Template};
//! use serde_json::json;
//!
//! let mut template = Template::with_properties(
//!     "log-bucket",
//!     "AWS::S3::Bucket",
//!     PropertyValue::authored(json!({ "BucketName": "<% stage %>-logs" })),
//! )?;
//! template.add_dependency("app-role")?;
//!
//! let data = DataBag::new().with("stage", "dev").with("app-role", "appRole");
//! let resource = template.finalize(&data);
//!
//! assert_eq!(template.key(), "logBucket");
//! assert_eq!(resource.properties["BucketName"], json!("dev-logs"));
//! assert_eq!(resource.depends_on, vec!["appRole"]);
//! # Ok::<(), cfgen_core::CoreError>(())
//! ```

pub mod data;
pub mod error;
pub mod intrinsic;
pub mod reference;
pub mod template;
pub mod token;
pub mod value;

pub use data::DataBag;
pub use error::{CoreError, CoreResult};
pub use reference::{
    logical_id, LogicalReference, Reference, ReferenceValue, RoleLiteralReference,
    UserLiteralReference,
};
pub use template::{AsTemplate, Emitted, ExportMap, FinalizedResource, PropertyEditor, Template};
pub use token::{contains_marker, DeferredString, Segment};
pub use value::{PropertyMap, PropertyValue};
