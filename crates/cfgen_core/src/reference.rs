//! References to template resources and to pre-existing AWS resources.
//!
//! A reference stores an identity and resolves it to an expression that
//! CloudFormation can evaluate. Resolution is pure: calling
//! [`Reference::resolve`] any number of times yields the same expression.
//!
//! - [`LogicalReference`]: a resource defined in the same document,
//!   resolved to `{ "Ref": <logical key> }`.
//! - [`UserLiteralReference`]: an existing IAM user, resolved to its ARN.
//! - [`RoleLiteralReference`]: an existing IAM role, resolved to its ARN,
//!   optionally qualified with the deployment region.

use std::fmt;

use heck::ToLowerCamelCase;
use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::intrinsic;
use crate::value::PropertyValue;

/// Convert an authoring key to its logical id in the output document.
pub fn logical_id(key: &str) -> String {
    key.to_lower_camel_case()
}

/// The raw identity held by a reference.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceValue {
    Name(String),
    Structured(serde_json::Map<String, Value>),
}

impl ReferenceValue {
    /// Validate and take ownership of a reference identity.
    ///
    /// Only non-empty strings and non-empty mappings are accepted.
    pub fn new(value: impl Into<Value>) -> CoreResult<Self> {
        match value.into() {
            Value::String(s) if !s.is_empty() => Ok(Self::Name(s)),
            Value::Object(map) if !map.is_empty() => Ok(Self::Structured(map)),
            _ => Err(CoreError::invalid_argument("Invalid reference specified (arg #1)")),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Structured(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Name(name) => Value::String(name.clone()),
            Self::Structured(map) => Value::Object(map.clone()),
        }
    }
}

/// Something that resolves to a CloudFormation expression.
pub trait Reference: fmt::Debug + Send + Sync {
    /// The identity this reference was built from.
    fn value(&self) -> &ReferenceValue;

    /// The expression to embed in a finalized document.
    fn resolve(&self) -> PropertyValue;
}

fn require_name(name: &str, what: &str) -> CoreResult<()> {
    if name.is_empty() {
        return Err(CoreError::invalid_argument(format!(
            "Invalid {} specified (arg #1)",
            what
        )));
    }
    Ok(())
}

/// Logical reference to a template in the same document.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalReference {
    value: ReferenceValue,
}

impl LogicalReference {
    pub fn new(key: &str) -> CoreResult<Self> {
        require_name(key, "key")?;
        Ok(Self {
            value: ReferenceValue::new(logical_id(key))?,
        })
    }

    /// The camel-cased logical key.
    pub fn key(&self) -> &str {
        self.value.as_str().unwrap_or_default()
    }
}

impl Reference for LogicalReference {
    fn value(&self) -> &ReferenceValue {
        &self.value
    }

    fn resolve(&self) -> PropertyValue {
        intrinsic::reference(self.key())
    }
}

/// Literal reference to an externally defined IAM user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserLiteralReference {
    value: ReferenceValue,
}

impl UserLiteralReference {
    pub fn new(username: &str) -> CoreResult<Self> {
        require_name(username, "username")?;
        Ok(Self {
            value: ReferenceValue::new(username)?,
        })
    }

    pub fn username(&self) -> &str {
        self.value.as_str().unwrap_or_default()
    }
}

impl Reference for UserLiteralReference {
    fn value(&self) -> &ReferenceValue {
        &self.value
    }

    fn resolve(&self) -> PropertyValue {
        intrinsic::join(
            "",
            vec![
                "arn:aws:iam::".into(),
                intrinsic::account_id(),
                ":".into(),
                self.username().into(),
            ],
        )
    }
}

/// Literal reference to an externally defined IAM role.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleLiteralReference {
    value: ReferenceValue,
    contains_region: bool,
}

impl RoleLiteralReference {
    /// A region-qualified role reference.
    pub fn new(role_name: &str) -> CoreResult<Self> {
        Self::with_region(role_name, true)
    }

    pub fn without_region(role_name: &str) -> CoreResult<Self> {
        Self::with_region(role_name, false)
    }

    pub fn with_region(role_name: &str, contains_region: bool) -> CoreResult<Self> {
        require_name(role_name, "roleName")?;
        Ok(Self {
            value: ReferenceValue::new(role_name)?,
            contains_region,
        })
    }

    pub fn role(&self) -> &str {
        self.value.as_str().unwrap_or_default()
    }

    pub fn contains_region(&self) -> bool {
        self.contains_region
    }
}

impl Reference for RoleLiteralReference {
    fn value(&self) -> &ReferenceValue {
        &self.value
    }

    fn resolve(&self) -> PropertyValue {
        let mut parts = vec![
            "arn:aws:iam::".into(),
            intrinsic::account_id(),
            ":role/".into(),
        ];
        if self.contains_region {
            parts.push(intrinsic::region());
        }
        parts.push(self.role().into());

        intrinsic::join("", parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataBag;
    use serde_json::json;

    #[test]
    fn test_reference_value_rejects_empty_identities() {
        for invalid in [Value::Null, json!(""), json!({}), json!([]), json!(1), json!(true)] {
            let err = ReferenceValue::new(invalid).unwrap_err();
            assert!(err.is_invalid_argument());
            assert_eq!(err.to_string(), "Invalid reference specified (arg #1)");
        }
    }

    #[test]
    fn test_reference_value_accepts_names_and_mappings() {
        assert_eq!(ReferenceValue::new("bob").unwrap().as_str(), Some("bob"));

        let structured = ReferenceValue::new(json!({ "Fn::GetAtt": ["a", "Arn"] })).unwrap();
        assert!(structured.as_str().is_none());
        assert_eq!(structured.to_json(), json!({ "Fn::GetAtt": ["a", "Arn"] }));
    }

    #[test]
    fn test_logical_reference_resolves_to_ref() {
        let reference = LogicalReference::new("my-lambda-role").unwrap();
        assert_eq!(reference.key(), "myLambdaRole");

        let first = reference.resolve();
        let second = reference.resolve();
        assert_eq!(first, second);
        assert_eq!(first.render(&DataBag::new()), json!({ "Ref": "myLambdaRole" }));
    }

    #[test]
    fn test_logical_reference_rejects_empty_key() {
        let err = LogicalReference::new("").unwrap_err();
        assert_eq!(err.to_string(), "Invalid key specified (arg #1)");
    }

    #[test]
    fn test_user_literal_reference_resolves_to_arn() {
        let reference = UserLiteralReference::new("bob").unwrap();
        assert_eq!(
            reference.resolve().render(&DataBag::new()),
            json!({ "Fn::Join": ["", ["arn:aws:iam::", { "Ref": "AWS::AccountId" }, ":", "bob"]] })
        );
        assert!(UserLiteralReference::new("").is_err());
    }

    #[test]
    fn test_role_literal_reference_with_region() {
        let reference = RoleLiteralReference::new("myRole").unwrap();
        assert!(reference.contains_region());
        assert_eq!(
            reference.resolve().render(&DataBag::new()),
            json!({ "Fn::Join": ["", [
                "arn:aws:iam::",
                { "Ref": "AWS::AccountId" },
                ":role/",
                { "Ref": "AWS::Region" },
                "myRole"
            ]] })
        );
    }

    #[test]
    fn test_role_literal_reference_without_region() {
        let reference = RoleLiteralReference::without_region("myRole").unwrap();
        assert_eq!(
            reference.resolve().render(&DataBag::new()),
            json!({ "Fn::Join": ["", ["arn:aws:iam::", { "Ref": "AWS::AccountId" }, ":role/", "myRole"]] })
        );

        let err = RoleLiteralReference::new("").unwrap_err();
        assert_eq!(err.to_string(), "Invalid roleName specified (arg #1)");
    }
}
