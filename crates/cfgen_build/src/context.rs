//! Directory context handed to template generators.

use std::fmt;
use std::path::{Path, PathBuf};

/// Location of one directory level within the template tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirContext {
    root: PathBuf,
    rel_path: PathBuf,
}

impl DirContext {
    /// Context for the root of a template tree.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            rel_path: PathBuf::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of this directory relative to the root. Empty at the root.
    pub fn rel_path(&self) -> &Path {
        &self.rel_path
    }

    pub fn abs_path(&self) -> PathBuf {
        self.root.join(&self.rel_path)
    }

    /// Context for a subdirectory of this one.
    pub fn child(&self, name: &str) -> Self {
        Self {
            root: self.root.clone(),
            rel_path: self.rel_path.join(name),
        }
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.abs_path().join(name)
    }

    pub fn rel_file_path(&self, name: &str) -> PathBuf {
        self.rel_path.join(name)
    }

    /// Number of directory levels below the root.
    pub fn depth(&self) -> usize {
        self.rel_path.components().count()
    }
}

impl fmt::Display for DirContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rel_path.as_os_str().is_empty() {
            write!(f, ".")
        } else {
            write!(f, "{}", self.rel_path.display())
        }
    }
}
