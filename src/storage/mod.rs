use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Canonical extension carried by every managed standard document.
pub const STANDARD_EXTENSION: &str = ".md";

/// Failures raised by the standards folder accessor.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file '{0}' not found in the standards folder")]
    NotFound(String),
    #[error("invalid filename '{0}': names must not contain path components")]
    InvalidFilename(String),
    #[error("failed to access the standards folder: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only accessor over the flat folder of standard documents.
///
/// Nothing is cached between calls: the folder may change at any time, so
/// every listing and every read goes back to the filesystem.
pub struct StandardsStore {
    docs_dir: PathBuf,
}

impl StandardsStore {
    pub fn new(docs_dir: impl Into<PathBuf>) -> Self {
        Self {
            docs_dir: docs_dir.into(),
        }
    }

    pub fn docs_dir(&self) -> &Path {
        &self.docs_dir
    }

    /// Append the canonical extension if the name does not already carry it.
    /// Idempotent; performs no other normalization.
    pub fn resolve_filename(&self, input: &str) -> String {
        if input.ends_with(STANDARD_EXTENSION) {
            input.to_string()
        } else {
            format!("{input}{STANDARD_EXTENSION}")
        }
    }

    /// All markdown filenames currently in the folder, in the order the
    /// filesystem reports them. Callers must not assume that order is stable.
    pub fn list_candidates(&self) -> Result<Vec<String>, StoreError> {
        let mut candidates = Vec::new();

        // Depth 1: the standards folder is flat, subdirectories are ignored.
        for entry in WalkDir::new(&self.docs_dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if name.ends_with(STANDARD_EXTENSION) {
                candidates.push(name.into_owned());
            }
        }

        Ok(candidates)
    }

    /// Full text content of one document.
    ///
    /// The name is resolved first, then checked for containment: anything
    /// with path components (separators, `..`, absolute paths) is rejected
    /// before touching the filesystem. Ranked filenames come from an
    /// untrusted oracle and must not escape the standards folder.
    pub fn read_document(&self, filename: &str) -> Result<String, StoreError> {
        let resolved = self.resolve_filename(filename);
        if !is_plain_filename(&resolved) {
            return Err(StoreError::InvalidFilename(resolved));
        }

        let path = self.docs_dir.join(&resolved);
        if !path.exists() {
            return Err(StoreError::NotFound(resolved));
        }

        Ok(std::fs::read_to_string(path)?)
    }
}

/// A name is plain when it is a single normal path component.
fn is_plain_filename(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
