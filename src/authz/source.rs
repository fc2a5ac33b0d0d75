//! Where schema documents come from.
//!
//! The loader only needs document text plus a name for error messages, so a
//! file on disk, a directory of files and an embedded string are all equally
//! valid sources.

use std::path::{Path, PathBuf};

use crate::authz::errors::AuthzError;

/// One schema document and the name it is reported under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDocument {
    pub origin: String,
    pub text: String,
}

pub trait SchemaSource {
    /// All documents making up the schema, in a stable order.
    fn documents(&self) -> Result<Vec<SchemaDocument>, AuthzError>;
}

/// A single KDL file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SchemaSource for FileSource {
    fn documents(&self) -> Result<Vec<SchemaDocument>, AuthzError> {
        Ok(vec![read_document(&self.path)?])
    }
}

/// Every `.kdl` file in a directory, sorted by path. Other files are ignored.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SchemaSource for DirectorySource {
    fn documents(&self) -> Result<Vec<SchemaDocument>, AuthzError> {
        if !self.dir.is_dir() {
            return Err(AuthzError::InvalidSchema(format!(
                "schema directory `{}` does not exist or is not a directory",
                self.dir.display()
            )));
        }

        let read_err = |source| AuthzError::SchemaLoad {
            path: self.dir.display().to_string(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            if path.extension().map(|ext| ext == "kdl").unwrap_or(false) {
                paths.push(path);
            }
        }
        paths.sort();

        paths.iter().map(|p| read_document(p)).collect()
    }
}

/// Schema text held in memory, e.g. from `include_str!`.
#[derive(Debug, Clone)]
pub struct InlineSource {
    origin: String,
    text: String,
}

impl InlineSource {
    pub fn new(origin: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            text: text.into(),
        }
    }
}

impl SchemaSource for InlineSource {
    fn documents(&self) -> Result<Vec<SchemaDocument>, AuthzError> {
        Ok(vec![SchemaDocument {
            origin: self.origin.clone(),
            text: self.text.clone(),
        }])
    }
}

/// Pick a file or directory source for `path`.
pub fn source_for_path(path: &Path) -> Box<dyn SchemaSource> {
    if path.is_dir() {
        Box::new(DirectorySource::new(path))
    } else {
        Box::new(FileSource::new(path))
    }
}

fn read_document(path: &Path) -> Result<SchemaDocument, AuthzError> {
    let text = std::fs::read_to_string(path).map_err(|source| AuthzError::SchemaLoad {
        path: path.display().to_string(),
        source,
    })?;
    Ok(SchemaDocument {
        origin: path.display().to_string(),
        text,
    })
}
