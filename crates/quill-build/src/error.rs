//! Build and watch error types.

use std::path::PathBuf;

use quill_render::RenderError;
use quill_site::SiteError;
use quill_storage::StorageError;

/// Error that stops a build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The pre-build hook could not be started.
    #[error("Could not run pre-build hook `{command}`: {source}")]
    HookSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The pre-build hook exited unsuccessfully.
    #[error("Pre-build hook `{command}` failed: {status}")]
    HookFailed {
        command: String,
        status: std::process::ExitStatus,
    },

    #[error(transparent)]
    Site(#[from] SiteError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Error that stops watch mode.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// Directory watches could not be registered after all retries.
    #[error("Failed to watch {}: {source}", .path.display())]
    Registration {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// The watch backend reported an error.
    #[error("File watcher failed: {0}")]
    Backend(#[source] notify::Error),

    /// The watcher thread exited or panicked.
    #[error("File watcher stopped unexpectedly")]
    Disconnected,

    #[error(transparent)]
    Build(#[from] BuildError),
}
