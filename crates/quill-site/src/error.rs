//! Site model error types.

use std::path::PathBuf;

use quill_storage::StorageError;

/// Error produced while loading or querying the site model.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// The site metadata file could not be read.
    #[error("Site config not found: {}", .path.display())]
    MissingConfig {
        /// Path of the missing file.
        path: PathBuf,
        #[source]
        source: StorageError,
    },

    /// A metadata file is not valid YAML for its schema.
    #[error("Invalid YAML in {}: {source}", .path.display())]
    Yaml {
        /// File that failed to parse.
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A post lacks one of date, slug or title.
    #[error("Post meta must include {field} ({})", .path.display())]
    MissingRequiredField {
        /// Name of the empty field.
        field: &'static str,
        /// Metadata file that lacks it.
        path: PathBuf,
    },

    /// A date string does not match the site date format.
    #[error("Could not parse date {value:?} with format {format:?}")]
    InvalidDate {
        /// Offending date value.
        value: String,
        /// Date format it was parsed with.
        format: String,
    },

    /// A date format is not a valid layout.
    #[error("Invalid date format {0:?}")]
    InvalidDateFormat(String),

    /// The path or tags format failed to compile or render.
    #[error("Path template error: {0}")]
    PathTemplate(#[from] minijinja::Error),

    /// An image could not be decoded.
    #[error("Could not load image metadata for {}: {source}", .path.display())]
    Image {
        /// Image source path.
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A post id that is not part of the site.
    #[error("Unknown post: {0}")]
    UnknownPost(String),

    /// Storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
