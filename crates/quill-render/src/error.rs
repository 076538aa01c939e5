//! Render error types.

use std::path::PathBuf;

use quill_site::SiteError;
use quill_storage::StorageError;

/// Error produced while composing or executing templates.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The templates directory exists but has no post template.
    #[error("No post template at: {}", .0.display())]
    MissingPostTemplate(PathBuf),

    /// A template failed to parse.
    #[error("Template {name} is invalid: {source}")]
    Template {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    /// A template failed while executing.
    #[error("Failed to render {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error(transparent)]
    Site(#[from] SiteError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl RenderError {
    pub(crate) fn render(name: impl Into<String>) -> impl FnOnce(minijinja::Error) -> Self {
        let name = name.into();
        move |source| Self::Render { name, source }
    }
}
