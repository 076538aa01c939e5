//! Mock storage implementation for testing.
//!
//! Provides [`MockStorage`], an in-memory directory tree, so the build
//! pipeline can be exercised without filesystem access.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use crate::storage::{FileStat, Storage, StorageError, StorageErrorKind};

/// Backend identifier for error messages.
const BACKEND: &str = "Mock";

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
}

/// Normalize a path to a relative key: `/a/./b/../c` and `a/c` map to the
/// same entry. The empty path is the root directory.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    out
}

/// In-memory storage for testing.
///
/// Writes follow real filesystem rules: the parent directory must exist.
/// Use the builder methods to seed the tree with test data.
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use quill_storage::{MockStorage, Storage};
///
/// let storage = MockStorage::new()
///     .with_file("src/config.yaml", "title: Blog")
///     .with_dir("src/posts");
///
/// let names = storage.read_dir(Path::new("src")).unwrap();
/// assert_eq!(names, vec!["config.yaml", "posts"]);
/// ```
#[derive(Debug, Default)]
pub struct MockStorage {
    nodes: RwLock<BTreeMap<PathBuf, Node>>,
}

impl MockStorage {
    /// Create a new empty mock storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, creating missing parent directories.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned or a parent exists as a file.
    #[must_use]
    pub fn with_file(self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) -> Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent).unwrap();
        }
        self.nodes
            .write()
            .unwrap()
            .insert(normalize(path), Node::File(content.into()));
        self
    }

    /// Add a directory and its parents.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned or a parent exists as a file.
    #[must_use]
    pub fn with_dir(self, path: impl AsRef<Path>) -> Self {
        self.create_dir_all(path.as_ref()).unwrap();
        self
    }

    /// Replace or create a file after construction, creating parents.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned or a parent exists as a file.
    pub fn put_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent).unwrap();
        }
        self.nodes
            .write()
            .unwrap()
            .insert(normalize(path), Node::File(content.into()));
    }

    /// Text content of a file, if it exists and is valid UTF-8.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn file_contents(&self, path: impl AsRef<Path>) -> Option<String> {
        match self.nodes.read().unwrap().get(&normalize(path.as_ref())) {
            Some(Node::File(bytes)) => String::from_utf8(bytes.clone()).ok(),
            _ => None,
        }
    }

    /// All files below `prefix` with their contents, keyed by normalized path.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn files_under(&self, prefix: impl AsRef<Path>) -> BTreeMap<PathBuf, Vec<u8>> {
        let prefix = normalize(prefix.as_ref());
        self.nodes
            .read()
            .unwrap()
            .iter()
            .filter(|(path, _)| path.starts_with(&prefix))
            .filter_map(|(path, node)| match node {
                Node::File(bytes) => Some((path.clone(), bytes.clone())),
                Node::Dir => None,
            })
            .collect()
    }

    fn error(kind: StorageErrorKind, path: &Path) -> StorageError {
        StorageError::new(kind)
            .with_path(path)
            .with_backend(BACKEND)
    }
}

impl Storage for MockStorage {
    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        match self.nodes.read().unwrap().get(&normalize(path)) {
            Some(Node::File(bytes)) => Ok(bytes.clone()),
            Some(Node::Dir) => Err(Self::error(StorageErrorKind::IsADirectory, path)),
            None => Err(Self::error(StorageErrorKind::NotFound, path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), StorageError> {
        let key = normalize(path);
        let mut nodes = self.nodes.write().unwrap();

        if let Some(parent) = key.parent()
            && !parent.as_os_str().is_empty()
        {
            match nodes.get(parent) {
                Some(Node::Dir) => {}
                Some(Node::File(_)) => {
                    return Err(Self::error(StorageErrorKind::NotADirectory, path));
                }
                None => return Err(Self::error(StorageErrorKind::NotFound, path)),
            }
        }
        if matches!(nodes.get(&key), Some(Node::Dir)) {
            return Err(Self::error(StorageErrorKind::IsADirectory, path));
        }

        nodes.insert(key, Node::File(contents.to_vec()));
        Ok(())
    }

    fn stat(&self, path: &Path) -> Result<FileStat, StorageError> {
        let key = normalize(path);
        if key.as_os_str().is_empty() {
            return Ok(FileStat::dir());
        }
        match self.nodes.read().unwrap().get(&key) {
            Some(Node::Dir) => Ok(FileStat::dir()),
            Some(Node::File(bytes)) => Ok(FileStat::file(bytes.len() as u64)),
            None => Err(Self::error(StorageErrorKind::NotFound, path)),
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<String>, StorageError> {
        let key = normalize(path);
        let nodes = self.nodes.read().unwrap();

        if !key.as_os_str().is_empty() {
            match nodes.get(&key) {
                Some(Node::Dir) => {}
                Some(Node::File(_)) => {
                    return Err(Self::error(StorageErrorKind::NotADirectory, path));
                }
                None => return Err(Self::error(StorageErrorKind::NotFound, path)),
            }
        }

        // BTreeMap iteration keeps names sorted.
        Ok(nodes
            .keys()
            .filter(|child| child.parent() == Some(key.as_path()))
            .filter_map(|child| child.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect())
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), StorageError> {
        let key = normalize(path);
        let mut nodes = self.nodes.write().unwrap();

        let mut current = PathBuf::new();
        for component in key.components() {
            current.push(component);
            match nodes.get(&current) {
                Some(Node::Dir) => {}
                Some(Node::File(_)) => {
                    return Err(Self::error(StorageErrorKind::AlreadyExists, &current));
                }
                None => {
                    nodes.insert(current.clone(), Node::Dir);
                }
            }
        }
        Ok(())
    }
}
