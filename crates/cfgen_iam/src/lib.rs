//! # cfgen_iam
//!
//! IAM builders for cfgen.
//!
//! Roles are full templates; policy documents and statements are builders
//! whose output is embedded in a role's properties.
//!
//! ## Example
//!
//! ```rust
//! use cfgen_core::{AsTemplate, DataBag};
//! use cfgen_iam::{PolicyDocument, PolicyStatement, RoleTemplate};
//!
//! let mut trust = PolicyStatement::new();
//! trust
//!     .add_service_principal("lambda.amazonaws.com")?
//!     .add_action("sts:AssumeRole")?;
//!
//! let mut assume = PolicyDocument::new();
//! assume.add_statement(trust);
//!
//! let mut role = RoleTemplate::new("lambda-role", "lambda")?;
//! role.set_assume_policy(assume)?
//!     .add_aws_managed_policy("service-role/AWSLambdaBasicExecutionRole")?;
//!
//! let resource = role.finalize(&DataBag::new());
//! assert_eq!(resource.resource_type, "AWS::IAM::Role");
//! # Ok::<(), cfgen_core::CoreError>(())
//! ```

pub mod arn;
pub mod document;
pub mod role;
pub mod statement;

pub use document::{PolicyDocument, POLICY_VERSION};
pub use role::{RoleTemplate, ROLE_RESOURCE_TYPE};
pub use statement::{PolicyStatement, POLICY_EFFECTS};
