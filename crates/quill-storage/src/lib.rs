//! Filesystem capability for the Quill site builder.
//!
//! The build pipeline never touches `std::fs` directly. Every read, write,
//! stat and directory listing goes through the [`Storage`] trait so the same
//! pipeline runs against a real disk ([`FsStorage`]) or an in-memory tree
//! ([`MockStorage`], behind the `mock` feature flag).
//!
//! # Example
//!
//! ```ignore
//! use std::path::{Path, PathBuf};
//! use quill_storage::{FsStorage, Storage};
//!
//! let storage = FsStorage::new(PathBuf::from("."));
//! for name in storage.read_dir(Path::new("src/posts"))? {
//!     println!("{name}");
//! }
//! ```

mod fs;
#[cfg(feature = "mock")]
mod mock;
mod storage;

pub use fs::FsStorage;
#[cfg(feature = "mock")]
pub use mock::MockStorage;
pub use storage::{FileStat, Storage, StorageError, StorageErrorKind};
