//! Policy statement builder.

use cfgen_core::{CoreError, CoreResult, PropertyEditor, PropertyMap, PropertyValue};

use crate::arn;

/// Effects a statement may carry.
pub const POLICY_EFFECTS: [&str; 2] = ["Allow", "Deny"];

/// Builder for a single IAM policy statement.
///
/// A new statement allows nothing: `Effect` is `Allow` and `Action` is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyStatement {
    properties: PropertyMap,
}

impl Default for PolicyStatement {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyStatement {
    pub fn new() -> Self {
        let mut properties = PropertyMap::new();
        properties.insert("Effect".to_string(), "Allow".into());
        properties.insert("Action".to_string(), PropertyValue::empty_list());
        Self { properties }
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn into_property(self) -> PropertyValue {
        PropertyValue::Map(self.properties)
    }

    fn editor(&mut self) -> PropertyEditor<'_> {
        PropertyEditor::new(&mut self.properties)
    }

    /// Make sure `Principal.<kind>` is a list.
    ///
    /// If it is not, the whole `Principal` mapping is replaced, dropping
    /// principals of any other kind.
    pub fn ensure_principal_type(&mut self, kind: &str) -> &mut Self {
        let present = self
            .properties
            .get("Principal")
            .and_then(|principal| principal.get(kind))
            .is_some_and(PropertyValue::is_list);

        if !present {
            let mut principal = PropertyMap::new();
            principal.insert(kind.to_string(), PropertyValue::empty_list());
            self.properties
                .insert("Principal".to_string(), PropertyValue::Map(principal));
        }
        self
    }

    fn push_principal(&mut self, kind: &str, value: PropertyValue) -> CoreResult<&mut Self> {
        self.ensure_principal_type(kind);
        self.editor().push(&format!("Principal.{}", kind), value)?;
        Ok(self)
    }

    pub fn set_effect(&mut self, effect: &str) -> CoreResult<&mut Self> {
        if !POLICY_EFFECTS.contains(&effect) {
            return Err(CoreError::invalid_argument(format!(
                "Invalid policy effect specified. Must be one of: [{}]",
                POLICY_EFFECTS.join(",")
            )));
        }
        self.editor().set("Effect", effect)?;
        Ok(self)
    }

    pub fn add_service_principal(&mut self, service: &str) -> CoreResult<&mut Self> {
        require(service, "service")?;
        self.push_principal("Service", service.into())
    }

    pub fn add_canonical_user_principal(&mut self, user: &str) -> CoreResult<&mut Self> {
        require(user, "canonical user")?;
        self.push_principal("CanonicalUser", user.into())
    }

    pub fn add_iam_user_principal(&mut self, username: &str) -> CoreResult<&mut Self> {
        require(username, "iam username")?;
        let uri = arn::user_uri(&format!("user/{}", username))?;
        self.push_principal("AWS", uri)
    }

    /// Add the root principal of the current account.
    pub fn add_aws_account_principal(&mut self) -> CoreResult<&mut Self> {
        let uri = arn::user_uri("root")?;
        self.push_principal("AWS", uri)
    }

    /// Add an existing role. See [`arn::role_uri`] for `$REGION` handling.
    pub fn add_aws_role_principal(&mut self, role: &str) -> CoreResult<&mut Self> {
        require(role, "role")?;
        let uri = arn::role_uri(role)?;
        self.push_principal("AWS", uri)
    }

    pub fn add_anonymous_user_principal(&mut self) -> CoreResult<&mut Self> {
        self.push_principal("AWS", "*".into())
    }

    pub fn add_action(&mut self, action: &str) -> CoreResult<&mut Self> {
        require(action, "action")?;
        self.editor().push("Action", action)?;
        Ok(self)
    }

    /// Add a raw resource string.
    #[deprecated(note = "use `add_resource_arn` instead")]
    pub fn add_resource(&mut self, resource: &str) -> CoreResult<&mut Self> {
        require(resource, "resource")?;
        self.editor().push("Resource", resource)?;
        Ok(self)
    }

    /// Add `arn:aws:<service>:<Region>:<AccountId>:<suffix>`.
    ///
    /// `service` defaults to an empty string and `suffix` to `*`.
    pub fn add_resource_arn(
        &mut self,
        service: Option<&str>,
        suffix: Option<&str>,
    ) -> CoreResult<&mut Self> {
        let resource = arn::resource_arn(service.unwrap_or(""), suffix.unwrap_or("*"));
        self.editor().push("Resource", resource)?;
        Ok(self)
    }
}

fn require(value: &str, what: &str) -> CoreResult<()> {
    if value.is_empty() {
        return Err(CoreError::invalid_argument(format!(
            "Invalid {} specified (arg #1)",
            what
        )));
    }
    Ok(())
}
