//! IAM role template.

use tracing::debug;

use cfgen_core::intrinsic;
use cfgen_core::{AsTemplate, CoreError, CoreResult, PropertyMap, PropertyValue, Template};

use crate::arn;
use crate::document::PolicyDocument;

/// Resource type of every role template.
pub const ROLE_RESOURCE_TYPE: &str = "AWS::IAM::Role";

/// Template for an `AWS::IAM::Role` resource.
///
/// By default the role name is prefixed with `<Region>_`, so that the same
/// document can be deployed to several regions of one account.
#[derive(Debug, Clone)]
pub struct RoleTemplate {
    template: Template,
}

impl RoleTemplate {
    pub fn new(key: &str, role_name: &str) -> CoreResult<Self> {
        Self::build(key, role_name, true)
    }

    /// A role whose name is used as-is, without the region prefix.
    pub fn without_region(key: &str, role_name: &str) -> CoreResult<Self> {
        Self::build(key, role_name, false)
    }

    fn build(key: &str, role_name: &str, region: bool) -> CoreResult<Self> {
        if role_name.is_empty() {
            return Err(CoreError::invalid_argument(
                "Invalid role name specified (arg #2)",
            ));
        }

        let name = if region {
            intrinsic::join(
                "",
                vec![intrinsic::region(), format!("_{}", role_name).into()],
            )
        } else {
            role_name.into()
        };

        let mut properties = PropertyMap::new();
        properties.insert("RoleName".to_string(), name);
        properties.insert("ManagedPolicyArns".to_string(), PropertyValue::empty_list());
        properties.insert("Policies".to_string(), PropertyValue::empty_list());

        let template = Template::with_properties(key, ROLE_RESOURCE_TYPE, properties)?;
        debug!("Created role template: {}", template.key());
        Ok(Self { template })
    }

    /// Set the policy describing who may assume the role.
    pub fn set_assume_policy(&mut self, document: PolicyDocument) -> CoreResult<&mut Self> {
        self.template
            .properties_mut()
            .set("AssumeRolePolicyDocument", document.into_property())?;
        Ok(self)
    }

    pub fn set_path(&mut self, path: &str) -> CoreResult<&mut Self> {
        if path.is_empty() {
            return Err(CoreError::invalid_argument("Invalid path specified (arg #1)"));
        }
        self.template.properties_mut().set("Path", path)?;
        Ok(self)
    }

    pub fn add_aws_managed_policy(&mut self, policy_name: &str) -> CoreResult<&mut Self> {
        require_policy_name(policy_name)?;
        self.template
            .properties_mut()
            .push("ManagedPolicyArns", arn::aws_policy_uri(policy_name))?;
        Ok(self)
    }

    pub fn add_user_managed_policy(&mut self, policy_name: &str) -> CoreResult<&mut Self> {
        require_policy_name(policy_name)?;
        self.template
            .properties_mut()
            .push("ManagedPolicyArns", arn::user_policy_uri(policy_name))?;
        Ok(self)
    }

    /// Add an inline policy. Names must be unique within the role.
    pub fn add_policy(&mut self, name: &str, document: PolicyDocument) -> CoreResult<&mut Self> {
        if name.is_empty() {
            return Err(CoreError::invalid_argument("Invalid name specified (arg #1)"));
        }

        let exists = self
            .template
            .properties()
            .get("Policies")
            .and_then(PropertyValue::as_list)
            .is_some_and(|policies| {
                policies
                    .iter()
                    .any(|p| p.get("PolicyName").and_then(PropertyValue::as_str) == Some(name))
            });
        if exists {
            return Err(CoreError::duplicate(format!(
                "A policy with name [{}] has already been defined",
                name
            )));
        }

        let mut policy = PropertyMap::new();
        policy.insert("PolicyName".to_string(), name.into());
        policy.insert("PolicyDocument".to_string(), document.into_property());
        self.template
            .properties_mut()
            .push("Policies", PropertyValue::Map(policy))?;
        Ok(self)
    }
}

impl AsTemplate for RoleTemplate {
    fn template(&self) -> &Template {
        &self.template
    }

    fn template_mut(&mut self) -> &mut Template {
        &mut self.template
    }

    fn into_template(self) -> Template {
        self.template
    }
}

fn require_policy_name(policy_name: &str) -> CoreResult<()> {
    if policy_name.is_empty() {
        return Err(CoreError::invalid_argument(
            "Invalid policy name specified (arg #1)",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::PolicyStatement;
    use cfgen_core::{CoreError, DataBag};
    use serde_json::json;

    fn finalize(role: &RoleTemplate) -> serde_json::Value {
        serde_json::to_value(role.finalize(&DataBag::new())).unwrap()
    }

    fn lambda_trust() -> PolicyDocument {
        let mut statement = PolicyStatement::new();
        statement
            .add_service_principal("lambda.amazonaws.com")
            .unwrap()
            .add_action("sts:AssumeRole")
            .unwrap();
        let mut document = PolicyDocument::new();
        document.add_statement(statement);
        document
    }

    #[test]
    fn test_new_role_defaults() {
        let role = RoleTemplate::new("lambda-role", "lambda").unwrap();
        assert_eq!(role.key(), "lambdaRole");

        let json = finalize(&role);
        assert_eq!(json["Type"], json!("AWS::IAM::Role"));
        assert_eq!(
            json["Properties"],
            json!({
                "RoleName": { "Fn::Join": ["", [{ "Ref": "AWS::Region" }, "_lambda"]] },
                "ManagedPolicyArns": [],
                "Policies": []
            })
        );
    }

    #[test]
    fn test_role_without_region() {
        let role = RoleTemplate::without_region("lambda-role", "lambda").unwrap();
        assert_eq!(finalize(&role)["Properties"]["RoleName"], json!("lambda"));
    }

    #[test]
    fn test_constructor_validation() {
        let err = RoleTemplate::new("", "lambda").unwrap_err();
        assert_eq!(err.to_string(), "Invalid key specified (arg #1)");

        let err = RoleTemplate::new("key", "").unwrap_err();
        assert_eq!(err.to_string(), "Invalid role name specified (arg #2)");
    }

    #[test]
    fn test_setters() {
        let mut role = RoleTemplate::new("lambda-role", "lambda").unwrap();
        role.set_assume_policy(lambda_trust())
            .unwrap()
            .set_path("/service/")
            .unwrap()
            .add_aws_managed_policy("service-role/AWSLambdaBasicExecutionRole")
            .unwrap()
            .add_user_managed_policy("team-policy")
            .unwrap();

        let json = finalize(&role);
        let properties = &json["Properties"];
        assert_eq!(properties["Path"], json!("/service/"));
        assert_eq!(
            properties["AssumeRolePolicyDocument"]["Statement"][0]["Principal"],
            json!({ "Service": ["lambda.amazonaws.com"] })
        );
        assert_eq!(
            properties["ManagedPolicyArns"][0],
            json!("arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole")
        );
        assert_eq!(
            properties["ManagedPolicyArns"][1]["Fn::Join"][1][3],
            json!("team-policy")
        );

        assert!(role.set_path("").is_err());
        assert!(role.add_aws_managed_policy("").is_err());
        assert!(role.add_user_managed_policy("").is_err());
    }

    #[test]
    fn test_add_policy_rejects_duplicates() {
        let mut role = RoleTemplate::new("lambda-role", "lambda").unwrap();
        role.add_policy("logs", PolicyDocument::new()).unwrap();

        let err = role.add_policy("logs", PolicyDocument::new()).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateDefinition(_)));
        assert_eq!(err.to_string(), "A policy with name [logs] has already been defined");

        let err = role.add_policy("", PolicyDocument::new()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid name specified (arg #1)");

        let json = finalize(&role);
        assert_eq!(json["Properties"]["Policies"][0]["PolicyName"], json!("logs"));
        assert_eq!(json["Properties"]["Policies"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_role_dependency() {
        let mut role = RoleTemplate::new("lambda-role", "lambda").unwrap();
        role.add_dependency("log-group").unwrap();
        assert_eq!(finalize(&role)["DependsOn"], json!(["<% log-group %>"]));
    }
}
