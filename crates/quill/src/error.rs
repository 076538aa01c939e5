//! CLI error types.

use std::path::PathBuf;

use quill_build::{BuildError, WatchError};
use quill_config::ConfigError;
use quill_server::ServerError;
use quill_site::SiteError;
use quill_storage::StorageError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("{0}")]
    Watch(#[from] WatchError),

    #[error("{0}")]
    Server(#[from] ServerError),

    #[error("{0}")]
    Site(#[from] SiteError),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Post already exists: {}", .0.display())]
    PostExists(PathBuf),

    #[error("{0}")]
    Validation(String),
}
