//! Storage trait and error types.
//!
//! Provides the [`Storage`] trait, a narrow filesystem capability (read,
//! write, stat, list, mkdir), along with [`StorageError`] for unified error
//! handling across backends.
//!
//! # Path Convention
//!
//! Paths are ordinary filesystem paths. Relative paths are resolved against
//! the backend's root; absolute paths are used as given.

use std::path::{Path, PathBuf};

/// Result of a [`Storage::stat`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// True if the entry is a directory.
    pub is_dir: bool,
    /// Size in bytes (0 for directories).
    pub len: u64,
}

impl FileStat {
    /// Stat result for a directory.
    #[must_use]
    pub fn dir() -> Self {
        Self {
            is_dir: true,
            len: 0,
        }
    }

    /// Stat result for a regular file of `len` bytes.
    #[must_use]
    pub fn file(len: u64) -> Self {
        Self { is_dir: false, len }
    }
}

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Resource does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Resource already exists as a different kind of entry.
    AlreadyExists,
    /// Expected a directory.
    NotADirectory,
    /// Expected a file.
    IsADirectory,
    /// Content could not be decoded (e.g. invalid UTF-8).
    InvalidData,
    /// Other/unknown error category.
    Other,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// Path context (if applicable).
    pub path: Option<PathBuf>,
    /// Backend identifier (e.g., "Fs", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Create a not found error with path.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_path(path)
    }

    /// True if this error means the resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == StorageErrorKind::NotFound
    }

    /// Create a storage error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<PathBuf>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            std::io::ErrorKind::AlreadyExists => StorageErrorKind::AlreadyExists,
            std::io::ErrorKind::NotADirectory => StorageErrorKind::NotADirectory,
            std::io::ErrorKind::IsADirectory => StorageErrorKind::IsADirectory,
            std::io::ErrorKind::InvalidData => StorageErrorKind::InvalidData,
            _ => StorageErrorKind::Other,
        };
        let mut error = Self::new(kind).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (path: /foo/bar)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::AlreadyExists => "Already exists",
            StorageErrorKind::NotADirectory => "Not a directory",
            StorageErrorKind::IsADirectory => "Is a directory",
            StorageErrorKind::InvalidData => "Invalid data",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Filesystem capability used by the build pipeline.
///
/// Implementations must be usable from the watcher thread and the build
/// thread at once, hence `Send + Sync`.
pub trait Storage: Send + Sync {
    /// Read the full contents of a file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file doesn't exist, is a directory or
    /// can't be read.
    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    /// Read a file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorKind::InvalidData`] if the content is not UTF-8,
    /// otherwise the same errors as [`Storage::read`].
    fn read_to_string(&self, path: &Path) -> Result<String, StorageError> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| {
            StorageError::new(StorageErrorKind::InvalidData)
                .with_path(path)
                .with_source(e)
        })
    }

    /// Create or truncate a file and write `contents` to it.
    ///
    /// The parent directory must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the parent is missing or the write fails.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), StorageError>;

    /// Stat a path.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorKind::NotFound`] if nothing exists at `path`.
    fn stat(&self, path: &Path) -> Result<FileStat, StorageError>;

    /// List the entry names of a directory, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if `path` doesn't exist or is not a directory.
    fn read_dir(&self, path: &Path) -> Result<Vec<String>, StorageError>;

    /// Create a directory and all missing parents. Existing directories are
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if a path component exists as a file.
    fn create_dir_all(&self, path: &Path) -> Result<(), StorageError>;

    /// Check whether anything exists at `path`.
    ///
    /// Returns `false` on errors (treats errors as "doesn't exist").
    fn exists(&self, path: &Path) -> bool {
        self.stat(path).is_ok()
    }

    /// Check whether `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool {
        self.stat(path).is_ok_and(|stat| stat.is_dir)
    }

    /// Copy a file, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the read or the write fails.
    fn copy(&self, from: &Path, to: &Path) -> Result<u64, StorageError> {
        let contents = self.read(from)?;
        self.write(to, &contents)?;
        Ok(contents.len() as u64)
    }
}
