//! Policy document builder.

use cfgen_core::{PropertyMap, PropertyValue};

use crate::statement::PolicyStatement;

/// Policy language version written into every document.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Builder for an IAM policy document.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDocument {
    statements: Vec<PropertyValue>,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyDocument {
    pub fn new() -> Self {
        Self {
            statements: Vec::new(),
        }
    }

    pub fn add_statement(&mut self, statement: PolicyStatement) -> &mut Self {
        self.statements.push(statement.into_property());
        self
    }

    pub fn statements(&self) -> &[PropertyValue] {
        &self.statements
    }

    pub fn into_property(self) -> PropertyValue {
        let mut properties = PropertyMap::new();
        properties.insert("Version".to_string(), POLICY_VERSION.into());
        properties.insert("Statement".to_string(), PropertyValue::List(self.statements));
        PropertyValue::Map(properties)
    }
}
