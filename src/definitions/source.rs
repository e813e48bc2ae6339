//! Where schema documents come from

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{DefinitionError, Result};

/// A named collection of schema documents.
///
/// Include targets are resolved by name against the same source that
/// served the including document.
pub trait DocumentSource: Send + Sync {
    /// Return the full text of the named document.
    fn read(&self, name: &str) -> Result<String>;
}

/// Documents stored as files under one schema root directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Serve documents from `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Schema root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of the `.xml` documents directly under the root, sorted.
    pub fn dialects(&self) -> Result<Vec<String>> {
        let io_error = |source| DefinitionError::Io {
            document: self.root.display().to_string(),
            source,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(io_error)? {
            let entry = entry.map_err(io_error)?;
            let path = entry.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != "xml") {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                names.push(name.to_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

impl DocumentSource for DirectorySource {
    fn read(&self, name: &str) -> Result<String> {
        fs::read_to_string(self.root.join(name)).map_err(|source| DefinitionError::Io {
            document: name.to_owned(),
            source,
        })
    }
}

/// Documents held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<String, String>,
}

impl MemorySource {
    /// Create an empty source
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a document
    #[must_use]
    pub fn with_document(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    /// Add (or replace) a document
    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.documents.insert(name.into(), text.into());
    }
}

impl DocumentSource for MemorySource {
    fn read(&self, name: &str) -> Result<String> {
        self.documents
            .get(name)
            .cloned()
            .ok_or_else(|| DefinitionError::Io {
                document: name.to_owned(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such document"),
            })
    }
}
