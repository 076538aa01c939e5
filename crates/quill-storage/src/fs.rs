//! Filesystem storage implementation.
//!
//! Provides [`FsStorage`], a thin wrapper over `std::fs` that resolves
//! relative paths against a root directory and maps I/O errors to
//! [`StorageError`].

use std::fs;
use std::path::{Path, PathBuf};

use crate::storage::{FileStat, Storage, StorageError};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Filesystem storage implementation.
///
/// # Example
///
/// ```ignore
/// use std::path::{Path, PathBuf};
/// use quill_storage::{FsStorage, Storage};
///
/// let storage = FsStorage::new(PathBuf::from("/srv/blog"));
/// let meta = storage.read_to_string(Path::new("src/config.yaml"))?;
/// ```
#[derive(Debug, Clone)]
pub struct FsStorage {
    /// Directory that relative paths are resolved against.
    root: PathBuf,
}

impl FsStorage {
    /// Create a new filesystem storage rooted at `root`.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Root directory of this storage.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a path against the root. Absolute paths are returned as-is.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn error(err: std::io::Error, path: &Path) -> StorageError {
        StorageError::io(err, Some(path.to_path_buf())).with_backend(BACKEND)
    }
}

impl Storage for FsStorage {
    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        let full = self.resolve(path);
        fs::read(&full).map_err(|e| Self::error(e, &full))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), StorageError> {
        let full = self.resolve(path);
        tracing::debug!(path = %full.display(), bytes = contents.len(), "Writing file");
        fs::write(&full, contents).map_err(|e| Self::error(e, &full))
    }

    fn stat(&self, path: &Path) -> Result<FileStat, StorageError> {
        let full = self.resolve(path);
        let metadata = fs::metadata(&full).map_err(|e| Self::error(e, &full))?;
        if metadata.is_dir() {
            Ok(FileStat::dir())
        } else {
            Ok(FileStat::file(metadata.len()))
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<String>, StorageError> {
        let full = self.resolve(path);
        let entries = fs::read_dir(&full).map_err(|e| Self::error(e, &full))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Self::error(e, &full))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), StorageError> {
        let full = self.resolve(path);
        fs::create_dir_all(&full).map_err(|e| Self::error(e, &full))
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<u64, StorageError> {
        let src = self.resolve(from);
        let dst = self.resolve(to);
        tracing::debug!(from = %src.display(), to = %dst.display(), "Copying file");
        fs::copy(&src, &dst).map_err(|e| Self::error(e, &src))
    }
}
