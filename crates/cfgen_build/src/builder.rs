//! Recursive directory builder.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use tracing::{debug, info, warn};

use cfgen_core::{CoreError, DataBag, Emitted, Template};

use crate::assembler::{AssembleOptions, Document, DocumentAssembler};
use crate::context::DirContext;
use crate::error::{BuildError, BuildResult};
use crate::registry::TemplateRegistry;
use crate::unit::{is_unit_file, UnitDescriptor, DEFAULT_EXTENSIONS};

/// Discovers templates under one directory of a template tree.
///
/// Builders for subdirectories are created on the fly while walking; they
/// share the registry, data bag and extension list of their parent.
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    context: DirContext,
    registry: Arc<TemplateRegistry>,
    data: Arc<DataBag>,
    extensions: Arc<Vec<String>>,
}

impl TemplateBuilder {
    /// Create a builder for the root of a template tree.
    pub fn new(root: impl Into<PathBuf>) -> BuildResult<Self> {
        let root = root.into();
        if root.as_os_str().is_empty() {
            return Err(CoreError::invalid_argument("Invalid template root (arg #1)").into());
        }
        Ok(Self {
            context: DirContext::new(root),
            registry: Arc::new(TemplateRegistry::new()),
            data: Arc::new(DataBag::new()),
            extensions: Arc::new(DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()),
        })
    }

    pub fn with_registry(mut self, registry: TemplateRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_data(mut self, data: DataBag) -> Self {
        self.data = Arc::new(data);
        self
    }

    /// Replace the recognized unit extensions. An empty list keeps the
    /// defaults.
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        if !extensions.is_empty() {
            self.extensions = Arc::new(extensions);
        }
        self
    }

    pub fn context(&self) -> &DirContext {
        &self.context
    }

    pub fn data(&self) -> &DataBag {
        &self.data
    }

    fn child(&self, name: &str) -> Self {
        Self {
            context: self.context.child(name),
            registry: Arc::clone(&self.registry),
            data: Arc::clone(&self.data),
            extensions: Arc::clone(&self.extensions),
        }
    }

    /// Build every template in this directory and its subdirectories.
    ///
    /// Entries are visited in name order and the result is a pre-order,
    /// depth-first flattening of the tree. The first failure aborts the
    /// build.
    pub fn build(&self) -> BoxFuture<'_, BuildResult<Vec<Template>>> {
        async move {
            let dir = self.context.abs_path();
            debug!("Scanning template directory: {:?}", dir);

            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| BuildError::discovery(&dir, e))?;

            let mut names = Vec::new();
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| BuildError::discovery(&dir, e))?
            {
                match entry.file_name().into_string() {
                    Ok(name) => names.push(name),
                    Err(name) => debug!("Skipping entry with non UTF-8 name: {:?}", name),
                }
            }
            names.sort();

            let results = try_join_all(
                names
                    .iter()
                    .filter(|name| !name.starts_with('.'))
                    .map(|name| self.generate_templates(name)),
            )
            .await?;

            let templates: Vec<Template> = results.into_iter().flatten().collect();
            info!(
                "Built {} templates from {}",
                templates.len(),
                self.context
            );
            Ok(templates)
        }
        .boxed()
    }

    async fn generate_templates(&self, name: &str) -> BuildResult<Vec<Template>> {
        let path = self.context.file_path(name);
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| BuildError::discovery(&path, e))?;

        if metadata.is_dir() {
            return self.child(name).build().await;
        }

        if !is_unit_file(name, &self.extensions) {
            debug!("Skipping non-template file: {:?}", path);
            return Ok(Vec::new());
        }

        let emitted = self.load_unit(name).await?;
        if emitted.is_none() {
            warn!("Unit produced no templates: {:?}", path);
        }
        Ok(emitted.into_vec())
    }

    async fn load_unit(&self, name: &str) -> BuildResult<Emitted> {
        let rel_path = self.context.rel_file_path(name);
        if let Some(factory) = self.registry.binding(&rel_path) {
            debug!("Invoking bound factory: {:?}", rel_path);
            return Ok(factory.generate(&self.context, &self.data)?);
        }

        let path = self.context.file_path(name);
        debug!("Loading template unit: {:?}", path);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| BuildError::discovery(&path, e))?;

        UnitDescriptor::parse(&content, &path)?.resolve(
            &path,
            &self.context,
            &self.registry,
            &self.data,
        )
    }

    /// Build the tree and assemble it into one document.
    pub async fn build_document(&self, options: AssembleOptions) -> BuildResult<Document> {
        let templates = self.build().await?;
        DocumentAssembler::new(self.data.as_ref().clone())
            .with_options(options)
            .assemble(&templates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_new_rejects_empty_root() {
        let err = TemplateBuilder::new("").unwrap_err();
        assert!(matches!(err, BuildError::Core(CoreError::InvalidArgument(_))));
        assert_eq!(err.to_string(), "Invalid template root (arg #1)");
    }

    #[test]
    fn test_with_extensions_keeps_defaults_when_empty() {
        let builder = TemplateBuilder::new("/tmp").unwrap().with_extensions(Vec::new());
        assert_eq!(builder.extensions.len(), DEFAULT_EXTENSIONS.len());
    }

    #[tokio::test]
    async fn test_build_skips_hidden_and_foreign_entries() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("queue.cfn.yaml"),
            "templates:\n  - key: queue\n    type: AWS::SQS::Queue\n",
        )
        .unwrap();
        fs::write(
            dir.path().join(".hidden.cfn.yaml"),
            "templates:\n  - key: hidden\n    type: AWS::SQS::Queue\n",
        )
        .unwrap();
        fs::write(dir.path().join("README.md"), "# notes").unwrap();

        let templates = TemplateBuilder::new(dir.path()).unwrap().build().await.unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].key(), "queue");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_build_skips_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.cfn.yaml"),
            "templates:\n  - key: queue\n    type: AWS::SQS::Queue\n",
        )
        .unwrap();
        fs::write(dir.path().join(OsStr::from_bytes(b"notes-\xff.txt")), "stray").unwrap();

        let templates = TemplateBuilder::new(dir.path()).unwrap().build().await.unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].key(), "queue");
    }

    #[tokio::test]
    async fn test_build_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = TemplateBuilder::new(dir.path().join("missing"))
            .unwrap()
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::Discovery { .. }));
    }
}
