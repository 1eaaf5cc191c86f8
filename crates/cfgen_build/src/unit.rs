//! Template unit descriptors.
//!
//! A unit file either lists templates declaratively or names a registered
//! generator:
//!
//! ```yaml
//! templates:
//!   - key: log-bucket
//!     type: AWS::S3::Bucket
//!     properties:
//!       BucketName: <% stage %>-logs
//!     depends_on: [app-role]
//! ```
//!
//! ```yaml
//! generator: lambda-roles
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use cfgen_core::{CoreResult, DataBag, Emitted, ExportMap, PropertyValue, Template};

use crate::context::DirContext;
use crate::error::{BuildError, BuildResult};
use crate::registry::TemplateRegistry;

/// Extensions recognized as template units by default.
pub const DEFAULT_EXTENSIONS: [&str; 3] = ["cfn.yaml", "cfn.yml", "cfn.json"];

/// Contents of a unit file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitDescriptor {
    /// Name of a registered generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    /// Declarative templates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<TemplateSpec>,
}

/// A declaratively authored template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateSpec {
    pub key: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Strings carrying `<% %>` markers become deferred values.
    #[serde(default)]
    pub properties: Value,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub exports: ExportMap,
}

impl TemplateSpec {
    pub fn into_template(self) -> CoreResult<Template> {
        let mut template = Template::with_parts(
            &self.key,
            &self.resource_type,
            PropertyValue::authored(self.properties),
            self.exports,
        )?;
        for dependency in &self.depends_on {
            template.add_dependency(dependency)?;
        }
        Ok(template)
    }
}

impl UnitDescriptor {
    /// Parse a unit file. `.json` files are read as JSON, anything else as
    /// YAML. An empty file yields an empty descriptor.
    pub fn parse(content: &str, path: &Path) -> BuildResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let parsed = if is_json {
            serde_json::from_str::<Option<Self>>(content)
                .map_err(|e| BuildError::invalid_unit(path, e.to_string()))?
        } else {
            serde_yaml::from_str::<Option<Self>>(content)
                .map_err(|e| BuildError::invalid_unit(path, e.to_string()))?
        };

        Ok(parsed.unwrap_or_default())
    }

    /// Produce the unit's templates.
    pub fn resolve(
        self,
        path: &Path,
        context: &DirContext,
        registry: &TemplateRegistry,
        data: &DataBag,
    ) -> BuildResult<Emitted> {
        match (self.generator, self.templates.is_empty()) {
            (Some(_), false) => Err(BuildError::invalid_unit(
                path,
                "`generator` and `templates` are mutually exclusive",
            )),
            (Some(name), true) => {
                let factory = registry
                    .get(&name)
                    .ok_or_else(|| BuildError::UnknownGenerator {
                        name: name.clone(),
                        path: path.to_path_buf(),
                    })?;
                debug!("Invoking template generator [{}]: {:?}", name, path);
                Ok(factory.generate(context, data)?)
            }
            (None, false) => {
                let templates = self
                    .templates
                    .into_iter()
                    .map(TemplateSpec::into_template)
                    .collect::<CoreResult<Vec<_>>>()?;
                Ok(Emitted::Many(templates))
            }
            (None, true) => {
                debug!("Unit defines no templates: {:?}", path);
                Ok(Emitted::None)
            }
        }
    }
}

/// Whether `file_name` ends with one of `extensions`.
pub fn is_unit_file(file_name: &str, extensions: &[String]) -> bool {
    extensions.iter().any(|ext| {
        file_name
            .strip_suffix(ext.as_str())
            .and_then(|stem| stem.strip_suffix('.'))
            .is_some_and(|stem| !stem.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgen_core::{CoreError, Template};
    use serde_json::json;

    fn extensions() -> Vec<String> {
        DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_is_unit_file() {
        let exts = extensions();
        assert!(is_unit_file("roles.cfn.yaml", &exts));
        assert!(is_unit_file("roles.cfn.json", &exts));
        assert!(!is_unit_file("roles.yaml", &exts));
        assert!(!is_unit_file(".cfn.yaml", &exts));
        assert!(!is_unit_file("README.md", &exts));
    }

    #[test]
    fn test_parse_declarative_templates() {
        let content = r#"
templates:
  - key: log-bucket
    type: AWS::S3::Bucket
    properties:
      BucketName: <% stage %>-logs
    depends_on: [app-role]
    exports:
      logs: logBucket
"#;
        let descriptor = UnitDescriptor::parse(content, Path::new("a.cfn.yaml")).unwrap();
        assert_eq!(descriptor.templates.len(), 1);

        let template = descriptor.templates[0].clone().into_template().unwrap();
        assert_eq!(template.key(), "logBucket");
        assert_eq!(template.exported_properties().len(), 2);

        let resource = template.finalize(&DataBag::new().with("stage", "dev"));
        assert_eq!(resource.properties["BucketName"], json!("dev-logs"));
        assert_eq!(resource.depends_on, vec!["<% app-role %>"]);
    }

    #[test]
    fn test_parse_json_unit() {
        let content = r#"{ "templates": [{ "key": "queue", "type": "AWS::SQS::Queue" }] }"#;
        let descriptor = UnitDescriptor::parse(content, Path::new("q.cfn.json")).unwrap();
        assert_eq!(descriptor.templates[0].resource_type, "AWS::SQS::Queue");
    }

    #[test]
    fn test_parse_empty_and_invalid() {
        assert!(UnitDescriptor::parse("", Path::new("a.cfn.yaml")).unwrap().templates.is_empty());
        assert!(UnitDescriptor::parse("~\n", Path::new("a.cfn.yaml")).unwrap().generator.is_none());

        let err = UnitDescriptor::parse("unknown: field", Path::new("a.cfn.yaml")).unwrap_err();
        assert!(matches!(err, BuildError::InvalidUnit { .. }));
    }

    #[test]
    fn test_resolve_generator() {
        let mut registry = TemplateRegistry::new();
        registry
            .register("queues", |ctx: &DirContext, data: &DataBag| -> CoreResult<Emitted> {
                assert_eq!(ctx.depth(), 0);
                let key = data.get("queue").unwrap_or("work-queue");
                Ok(Template::new(key, "AWS::SQS::Queue")?.into())
            })
            .unwrap();

        let descriptor = UnitDescriptor {
            generator: Some("queues".to_string()),
            templates: Vec::new(),
        };
        let emitted = descriptor
            .resolve(Path::new("q.cfn.yaml"), &DirContext::new("."), &registry, &DataBag::new())
            .unwrap();
        assert_eq!(emitted.into_vec()[0].key(), "workQueue");
    }

    #[test]
    fn test_resolve_errors() {
        let registry = TemplateRegistry::new();
        let context = DirContext::new(".");
        let path = Path::new("x.cfn.yaml");

        let unknown = UnitDescriptor {
            generator: Some("missing".to_string()),
            templates: Vec::new(),
        };
        let err = unknown.resolve(path, &context, &registry, &DataBag::new()).unwrap_err();
        assert!(matches!(err, BuildError::UnknownGenerator { ref name, .. } if name == "missing"));

        let both: UnitDescriptor = serde_yaml::from_str(
            "generator: a\ntemplates:\n  - key: k\n    type: T\n",
        )
        .unwrap();
        let err = both.resolve(path, &context, &registry, &DataBag::new()).unwrap_err();
        assert!(matches!(err, BuildError::InvalidUnit { .. }));

        let bad_key: UnitDescriptor =
            serde_yaml::from_str("templates:\n  - key: ''\n    type: T\n").unwrap();
        let err = bad_key.resolve(path, &context, &registry, &DataBag::new()).unwrap_err();
        assert!(matches!(err, BuildError::Core(CoreError::InvalidArgument(_))));
    }

    #[test]
    fn test_resolve_empty_descriptor() {
        let emitted = UnitDescriptor::default()
            .resolve(
                Path::new("e.cfn.yaml"),
                &DirContext::new("."),
                &TemplateRegistry::new(),
                &DataBag::new(),
            )
            .unwrap();
        assert!(emitted.is_none());
    }
}
