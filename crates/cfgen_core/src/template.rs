//! The template abstraction.
//!
//! A [`Template`] models one resource of the output document. It owns a
//! property tree, a list of deferred dependencies and an export table, and
//! is turned into its output form exactly once by [`Template::finalize`].
//!
//! Domain builders compose a `Template` and implement [`AsTemplate`]; they
//! shape the property tree through the [`PropertyEditor`] handle returned by
//! [`Template::properties_mut`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::data::DataBag;
use crate::error::{CoreError, CoreResult};
use crate::reference::{logical_id, LogicalReference};
use crate::token::DeferredString;
use crate::value::{render_map, PropertyMap, PropertyValue};

/// Mapping from authoring key to logical key.
pub type ExportMap = BTreeMap<String, String>;

/// A template in its output form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedResource {
    #[serde(rename = "Type")]
    pub resource_type: String,
    #[serde(rename = "Properties")]
    pub properties: serde_json::Map<String, Value>,
    #[serde(rename = "DependsOn")]
    pub depends_on: Vec<String>,
}

/// One resource of the output document.
#[derive(Debug, Clone)]
pub struct Template {
    key: String,
    resource_type: String,
    properties: PropertyMap,
    dependencies: Vec<DeferredString>,
    exports: ExportMap,
    template_ref: LogicalReference,
}

impl Template {
    /// Create a template with no properties.
    pub fn new(key: &str, resource_type: &str) -> CoreResult<Self> {
        Self::with_parts(key, resource_type, PropertyValue::empty_map(), ExportMap::new())
    }

    pub fn with_properties(
        key: &str,
        resource_type: &str,
        properties: impl Into<PropertyValue>,
    ) -> CoreResult<Self> {
        Self::with_parts(key, resource_type, properties, ExportMap::new())
    }

    /// Create a template from its parts.
    ///
    /// `properties` must be a mapping; any other value is replaced with an
    /// empty mapping. The export table gains `key -> logical key` unless the
    /// caller already mapped `key`.
    pub fn with_parts(
        key: &str,
        resource_type: &str,
        properties: impl Into<PropertyValue>,
        mut exports: ExportMap,
    ) -> CoreResult<Self> {
        let cf_key = logical_id(key);
        if cf_key.is_empty() {
            return Err(CoreError::invalid_argument("Invalid key specified (arg #1)"));
        }
        if resource_type.is_empty() {
            return Err(CoreError::invalid_argument(
                "Invalid template type specified (arg #2)",
            ));
        }

        let properties = match properties.into() {
            PropertyValue::Map(map) => map,
            PropertyValue::Null => PropertyMap::new(),
            _ => {
                warn!("Properties for template [{}] are not a mapping, ignoring them", key);
                PropertyMap::new()
            }
        };

        exports
            .entry(key.to_string())
            .or_insert_with(|| cf_key.clone());

        Ok(Self {
            template_ref: LogicalReference::new(key)?,
            key: cf_key,
            resource_type: resource_type.to_string(),
            properties,
            dependencies: Vec::new(),
            exports,
        })
    }

    /// The camel-cased logical key.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    /// Scoped mutation handle over the property tree.
    pub fn properties_mut(&mut self) -> PropertyEditor<'_> {
        PropertyEditor {
            properties: &mut self.properties,
        }
    }

    pub fn dependencies(&self) -> &[DeferredString] {
        &self.dependencies
    }

    pub fn exported_properties(&self) -> &ExportMap {
        &self.exports
    }

    /// The reference other templates use to point at this one.
    pub fn template_ref(&self) -> &LogicalReference {
        &self.template_ref
    }

    /// See [`PropertyEditor::ensure`].
    pub fn ensure_property(
        &mut self,
        path: &str,
        default: Option<PropertyValue>,
    ) -> CoreResult<&mut PropertyValue> {
        PropertyEditor::new(&mut self.properties).ensure(path, default)
    }

    /// Declare a dependency on another template, by authoring key.
    ///
    /// The name is stored as a deferred token and resolved at finalize time.
    pub fn add_dependency(&mut self, dependency: &str) -> CoreResult<&mut Self> {
        if dependency.is_empty() {
            return Err(CoreError::invalid_argument(
                "Invalid dependency specified (arg #1)",
            ));
        }
        self.dependencies.push(DeferredString::token(dependency));
        Ok(self)
    }

    /// Produce the output form, interpolating every token against `data`.
    ///
    /// The template itself is left untouched.
    pub fn finalize(&self, data: &DataBag) -> FinalizedResource {
        FinalizedResource {
            resource_type: self.resource_type.clone(),
            properties: render_map(&self.properties, data),
            depends_on: self.dependencies.iter().map(|d| d.render(data)).collect(),
        }
    }

    /// Log the current property tree.
    pub fn dump(&self) -> &Self {
        match serde_json::to_string(&self.properties) {
            Ok(json) => debug!("template::{} properties: {}", self.key, json),
            Err(e) => debug!("template::{} properties unavailable: {}", self.key, e),
        }
        self
    }
}

/// Mutation handle over a property tree, scoped to its owner.
pub struct PropertyEditor<'a> {
    properties: &'a mut PropertyMap,
}

impl<'a> PropertyEditor<'a> {
    pub fn new(properties: &'a mut PropertyMap) -> Self {
        Self { properties }
    }

    /// Make sure the property at the dot-separated `path` exists.
    ///
    /// Missing intermediate nodes are created as mappings. A missing leaf is
    /// set to `default`, or to an empty mapping when no default is given; an
    /// existing leaf is never overwritten. Returns the leaf.
    pub fn ensure(
        self,
        path: &str,
        default: Option<PropertyValue>,
    ) -> CoreResult<&'a mut PropertyValue> {
        let (parents, leaf) = split_path(path)?;
        let node = walk(self.properties, &parents)?;
        Ok(node
            .entry(leaf.to_string())
            .or_insert_with(|| default.unwrap_or_else(PropertyValue::empty_map)))
    }

    /// Set the property at `path`, creating parents as needed.
    pub fn set(
        &mut self,
        path: &str,
        value: impl Into<PropertyValue>,
    ) -> CoreResult<Option<PropertyValue>> {
        let (parents, leaf) = split_path(path)?;
        let node = walk(self.properties, &parents)?;
        Ok(node.insert(leaf.to_string(), value.into()))
    }

    /// Append to the list at `path`, creating it if absent.
    pub fn push(&mut self, path: &str, value: impl Into<PropertyValue>) -> CoreResult<()> {
        let (parents, leaf) = split_path(path)?;
        let node = walk(self.properties, &parents)?;
        let list = node
            .entry(leaf.to_string())
            .or_insert_with(PropertyValue::empty_list)
            .as_list_mut()
            .ok_or_else(|| {
                CoreError::invalid_argument(format!("Property [{}] is not a list", path))
            })?;
        list.push(value.into());
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&PropertyValue> {
        let mut tokens = path.split('.');
        let mut current = self.properties.get(tokens.next()?)?;
        for token in tokens {
            current = current.as_map()?.get(token)?;
        }
        Some(current)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut PropertyValue> {
        let mut tokens = path.split('.');
        let mut current = self.properties.get_mut(tokens.next()?)?;
        for token in tokens {
            current = current.as_map_mut()?.get_mut(token)?;
        }
        Some(current)
    }

    /// Remove a top-level property.
    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.properties.remove(name)
    }
}

fn split_path(path: &str) -> CoreResult<(Vec<&str>, &str)> {
    let mut tokens: Vec<&str> = path.split('.').collect();
    if tokens.iter().any(|t| t.is_empty()) {
        return Err(CoreError::invalid_argument(
            "Invalid property name specified (arg #1)",
        ));
    }
    let leaf = tokens.pop().unwrap_or_default();
    Ok((tokens, leaf))
}

fn walk<'m>(mut node: &'m mut PropertyMap, parents: &[&str]) -> CoreResult<&'m mut PropertyMap> {
    for token in parents {
        let child = node
            .entry(token.to_string())
            .or_insert_with(PropertyValue::empty_map);
        node = child.as_map_mut().ok_or_else(|| {
            CoreError::invalid_argument(format!("Property [{}] is not a mapping", token))
        })?;
    }
    Ok(node)
}

/// Capability set shared by every template builder.
pub trait AsTemplate {
    fn template(&self) -> &Template;

    fn template_mut(&mut self) -> &mut Template;

    fn into_template(self) -> Template
    where
        Self: Sized;

    fn key(&self) -> &str {
        self.template().key()
    }

    fn add_dependency(&mut self, dependency: &str) -> CoreResult<&mut Self>
    where
        Self: Sized,
    {
        self.template_mut().add_dependency(dependency)?;
        Ok(self)
    }

    fn finalize(&self, data: &DataBag) -> FinalizedResource {
        self.template().finalize(data)
    }
}

impl AsTemplate for Template {
    fn template(&self) -> &Template {
        self
    }

    fn template_mut(&mut self) -> &mut Template {
        self
    }

    fn into_template(self) -> Template {
        self
    }
}

/// What a template unit produced: nothing, one template, or several.
#[derive(Debug, Clone, Default)]
pub enum Emitted {
    #[default]
    None,
    One(Template),
    Many(Vec<Template>),
}

impl Emitted {
    pub fn into_vec(self) -> Vec<Template> {
        match self {
            Emitted::None => Vec::new(),
            Emitted::One(template) => vec![template],
            Emitted::Many(templates) => templates,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Emitted::None)
    }
}

impl From<Template> for Emitted {
    fn from(template: Template) -> Self {
        Emitted::One(template)
    }
}

impl From<Vec<Template>> for Emitted {
    fn from(templates: Vec<Template>) -> Self {
        Emitted::Many(templates)
    }
}

impl From<Option<Template>> for Emitted {
    fn from(template: Option<Template>) -> Self {
        template.map(Emitted::One).unwrap_or_default()
    }
}

impl<T: AsTemplate> FromIterator<T> for Emitted {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Emitted::Many(iter.into_iter().map(AsTemplate::into_template).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::Reference;
    use serde_json::json;

    fn role() -> Template {
        Template::new("my-role", "AWS::IAM::Role").unwrap()
    }

    #[test]
    fn test_new_camel_cases_key() {
        let template = role();
        assert_eq!(template.key(), "myRole");
        assert_eq!(template.resource_type(), "AWS::IAM::Role");
        assert!(template.properties().is_empty());
        assert!(template.dependencies().is_empty());
        assert_eq!(template.template_ref().key(), "myRole");
        assert_eq!(
            template.template_ref().resolve().render(&DataBag::new()),
            json!({ "Ref": "myRole" })
        );
    }

    #[test]
    fn test_new_rejects_empty_key_and_type() {
        let err = Template::new("", "AWS::IAM::Role").unwrap_err();
        assert_eq!(err.to_string(), "Invalid key specified (arg #1)");

        let err = Template::new("key", "").unwrap_err();
        assert_eq!(err.to_string(), "Invalid template type specified (arg #2)");
    }

    #[test]
    fn test_malformed_properties_are_normalized() {
        let template =
            Template::with_properties("key", "Custom::Thing", PropertyValue::from(json!([1, 2])))
                .unwrap();
        assert!(template.properties().is_empty());

        let template =
            Template::with_properties("key", "Custom::Thing", PropertyValue::from("text")).unwrap();
        assert!(template.properties().is_empty());
    }

    #[test]
    fn test_exports_include_self_reference() {
        let mut exports = ExportMap::new();
        exports.insert("alias".to_string(), "somethingElse".to_string());

        let template =
            Template::with_parts("my-role", "AWS::IAM::Role", PropertyValue::Null, exports).unwrap();
        assert_eq!(template.exported_properties().get("my-role").map(String::as_str), Some("myRole"));
        assert_eq!(
            template.exported_properties().get("alias").map(String::as_str),
            Some("somethingElse")
        );
    }

    #[test]
    fn test_caller_export_for_own_key_wins() {
        let mut exports = ExportMap::new();
        exports.insert("my-role".to_string(), "customName".to_string());

        let template =
            Template::with_parts("my-role", "AWS::IAM::Role", PropertyValue::Null, exports).unwrap();
        assert_eq!(
            template.exported_properties().get("my-role").map(String::as_str),
            Some("customName")
        );
    }

    #[test]
    fn test_ensure_property_creates_nested_mappings() {
        let mut template = role();
        let leaf = template
            .ensure_property("a.b.c", Some(PropertyValue::from(json!({ "x": 1 }))))
            .unwrap();
        assert_eq!(*leaf, PropertyValue::from(json!({ "x": 1 })));

        let again = template
            .ensure_property("a.b.c", Some(PropertyValue::from(json!({ "y": 2 }))))
            .unwrap();
        assert_eq!(*again, PropertyValue::from(json!({ "x": 1 })));

        assert_eq!(
            template.finalize(&DataBag::new()).properties,
            json!({ "a": { "b": { "c": { "x": 1 } } } }).as_object().unwrap().clone()
        );
    }

    #[test]
    fn test_ensure_property_defaults_to_empty_mapping() {
        let mut template = role();
        let leaf = template.ensure_property("Policies", None).unwrap();
        assert_eq!(*leaf, PropertyValue::empty_map());
    }

    #[test]
    fn test_ensure_property_rejects_scalar_parent_and_empty_path() {
        let mut template = role();
        template.properties_mut().set("Path", "/service/").unwrap();

        let err = template.ensure_property("Path.nested", None).unwrap_err();
        assert!(err.is_invalid_argument());

        assert!(template.ensure_property("", None).is_err());
        assert!(template.ensure_property("a..b", None).is_err());
    }

    #[test]
    fn test_editor_push_get_and_remove() {
        let mut template = role();
        let mut editor = template.properties_mut();
        editor.push("ManagedPolicyArns", "arn:aws:iam::aws:policy/ReadOnly").unwrap();
        editor.push("ManagedPolicyArns", "arn:aws:iam::aws:policy/Other").unwrap();
        editor.set("Tags.Team", "platform").unwrap();

        assert_eq!(
            editor.get("ManagedPolicyArns").and_then(|v| v.as_list()).map(Vec::len),
            Some(2)
        );
        assert_eq!(editor.get("Tags.Team").and_then(|v| v.as_str()), Some("platform"));

        if let Some(team) = editor.get_mut("Tags.Team") {
            *team = "data".into();
        }
        assert_eq!(editor.get("Tags.Team").and_then(|v| v.as_str()), Some("data"));

        assert!(editor.push("Tags", "x").is_err());
        assert!(editor.remove("Tags").is_some());
        assert!(editor.get("Tags.Team").is_none());
    }

    #[test]
    fn test_add_dependency() {
        let mut template = role();
        template
            .add_dependency("other")
            .unwrap()
            .add_dependency("another-one")
            .unwrap();

        let finalized = template.finalize(&DataBag::new());
        assert_eq!(finalized.depends_on, vec!["<% other %>", "<% another-one %>"]);

        let data = DataBag::new().with("other", "otherResource");
        let finalized = template.finalize(&data);
        assert_eq!(finalized.depends_on[0], "otherResource");

        let err = template.add_dependency("").unwrap_err();
        assert_eq!(err.to_string(), "Invalid dependency specified (arg #1)");
    }

    #[test]
    fn test_finalize_interpolates_tokens() {
        let template = Template::with_properties(
            "bucket",
            "AWS::S3::Bucket",
            PropertyValue::authored(json!({
                "BucketName": "<% foo %>",
                "Tags": [{ "Key": "stage", "Value": "<% stage %>" }],
                "Versioned": true
            })),
        )
        .unwrap();

        let finalized = template.finalize(&DataBag::new().with("foo", "bar").with("stage", "dev"));
        assert_eq!(finalized.resource_type, "AWS::S3::Bucket");
        assert_eq!(finalized.properties["BucketName"], json!("bar"));
        assert_eq!(finalized.properties["Tags"], json!([{ "Key": "stage", "Value": "dev" }]));
        assert_eq!(finalized.properties["Versioned"], json!(true));

        let unresolved = template.finalize(&DataBag::new());
        assert_eq!(unresolved.properties["BucketName"], json!("<% foo %>"));
    }

    #[test]
    fn test_finalize_does_not_mutate_template() {
        let template = Template::with_properties(
            "bucket",
            "AWS::S3::Bucket",
            PropertyValue::authored(json!({ "BucketName": "<% name %>" })),
        )
        .unwrap();

        let first = template.finalize(&DataBag::new().with("name", "one"));
        let second = template.finalize(&DataBag::new().with("name", "two"));

        assert_eq!(first.properties["BucketName"], json!("one"));
        assert_eq!(second.properties["BucketName"], json!("two"));
        assert!(matches!(
            template.properties().get("BucketName"),
            Some(PropertyValue::Deferred(_))
        ));
    }

    #[test]
    fn test_finalized_resource_serializes_with_cloudformation_names() {
        let mut template = role();
        template.add_dependency("other").unwrap();

        let json = serde_json::to_value(template.finalize(&DataBag::new())).unwrap();
        assert_eq!(
            json,
            json!({ "Type": "AWS::IAM::Role", "Properties": {}, "DependsOn": ["<% other %>"] })
        );
    }

    #[test]
    fn test_emitted_normalization() {
        assert!(Emitted::from(None::<Template>).into_vec().is_empty());
        assert_eq!(Emitted::from(role()).into_vec().len(), 1);
        assert_eq!(Emitted::from(vec![role(), role()]).into_vec().len(), 2);

        let collected: Emitted = vec![role()].into_iter().collect();
        assert_eq!(collected.into_vec().len(), 1);
    }
}
