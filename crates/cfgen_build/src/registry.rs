//! Template factory registry.
//!
//! Units found in the template tree cannot carry code, so every generator
//! is compiled in and registered here at startup. A unit either names a
//! registered generator, or its path is bound to a factory directly.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use cfgen_core::{CoreResult, DataBag, Emitted};

use crate::context::DirContext;
use crate::error::{BuildError, BuildResult};

/// Produces templates for one unit of the template tree.
pub trait TemplateFactory: Send + Sync {
    fn generate(&self, context: &DirContext, data: &DataBag) -> CoreResult<Emitted>;
}

impl<F> TemplateFactory for F
where
    F: Fn(&DirContext, &DataBag) -> CoreResult<Emitted> + Send + Sync,
{
    fn generate(&self, context: &DirContext, data: &DataBag) -> CoreResult<Emitted> {
        self(context, data)
    }
}

/// A registry of template factories.
#[derive(Default, Clone)]
pub struct TemplateRegistry {
    generators: HashMap<String, Arc<dyn TemplateFactory>>,
    bindings: HashMap<PathBuf, Arc<dyn TemplateFactory>>,
}

impl TemplateRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named generator that unit descriptors can refer to.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl TemplateFactory + 'static,
    ) -> BuildResult<&mut Self> {
        self.register_arc(name, Arc::new(factory))
    }

    pub fn register_arc(
        &mut self,
        name: impl Into<String>,
        factory: Arc<dyn TemplateFactory>,
    ) -> BuildResult<&mut Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(BuildError::Config("Generator name must not be empty".to_string()));
        }
        if self.generators.contains_key(&name) {
            return Err(BuildError::DuplicateDefinition(format!(
                "A generator with name [{}] has already been registered",
                name
            )));
        }
        debug!("Registering generator: {}", name);
        self.generators.insert(name, factory);
        Ok(self)
    }

    /// Bind a factory to a unit path, relative to the template root.
    ///
    /// A bound unit is generated by its factory without reading the file.
    pub fn bind_path(
        &mut self,
        rel_path: impl Into<PathBuf>,
        factory: impl TemplateFactory + 'static,
    ) -> BuildResult<&mut Self> {
        let rel_path = rel_path.into();
        if self.bindings.contains_key(&rel_path) {
            return Err(BuildError::DuplicateDefinition(format!(
                "A factory has already been bound to {:?}",
                rel_path
            )));
        }
        debug!("Binding factory to unit: {:?}", rel_path);
        self.bindings.insert(rel_path, Arc::new(factory));
        Ok(self)
    }

    /// Get a generator by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn TemplateFactory>> {
        self.generators.get(name).cloned()
    }

    /// Get the factory bound to a unit path.
    pub fn binding(&self, rel_path: &Path) -> Option<Arc<dyn TemplateFactory>> {
        self.bindings.get(rel_path).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.generators.contains_key(name)
    }

    /// Registered generator names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.generators.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Number of generators and bindings.
    pub fn len(&self) -> usize {
        self.generators.len() + self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty() && self.bindings.is_empty()
    }
}

impl std::fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("generators", &self.names())
            .field("bindings", &self.bindings.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgen_core::Template;

    fn bucket_factory(_: &DirContext, data: &DataBag) -> CoreResult<Emitted> {
        let key = data.get("bucket").unwrap_or("bucket");
        Ok(Template::new(key, "AWS::S3::Bucket")?.into())
    }

    #[test]
    fn test_registry_register_and_get() {
        let mut registry = TemplateRegistry::new();
        assert!(registry.is_empty());

        registry.register("bucket", bucket_factory).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("bucket"));

        let factory = registry.get("bucket").unwrap();
        let emitted = factory
            .generate(&DirContext::new("."), &DataBag::new().with("bucket", "log-bucket"))
            .unwrap();
        assert_eq!(emitted.into_vec()[0].key(), "logBucket");

        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = TemplateRegistry::new();
        registry.register("bucket", bucket_factory).unwrap();

        let err = registry.register("bucket", bucket_factory).unwrap_err();
        assert!(matches!(err, BuildError::DuplicateDefinition(_)));

        assert!(registry.register("", bucket_factory).is_err());
    }

    #[test]
    fn test_registry_names_sorted() {
        let mut registry = TemplateRegistry::new();
        registry
            .register("zeta", bucket_factory)
            .unwrap()
            .register("alpha", |_: &DirContext, _: &DataBag| -> CoreResult<Emitted> {
                Ok(Emitted::None)
            })
            .unwrap();
        assert_eq!(registry.names(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_bind_path() {
        let mut registry = TemplateRegistry::new();
        registry.bind_path("iam/roles.cfn.yaml", bucket_factory).unwrap();

        assert!(registry.binding(Path::new("iam/roles.cfn.yaml")).is_some());
        assert!(registry.binding(&PathBuf::from("iam").join("roles.cfn.yaml")).is_some());
        assert!(registry.binding(Path::new("roles.cfn.yaml")).is_none());
        assert!(registry.bind_path("iam/roles.cfn.yaml", bucket_factory).is_err());
    }
}
