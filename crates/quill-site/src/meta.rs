//! Site and post metadata as stored in YAML.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::SiteError;

/// Free-form user metadata attached to sites, posts and images.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Site-wide metadata from `config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteMeta {
    pub title: String,
    /// Absolute URL prefix used for permalinks, without trailing slash.
    pub root: String,
    pub author: String,
    pub email: String,
    /// Template producing a post path from `{id, slug, title, date_path, date}`.
    #[serde(rename = "pathformat", alias = "path_format")]
    pub path_format: String,
    /// Date layout used to parse post dates and build `date_path`.
    #[serde(rename = "dateformat", alias = "date_format")]
    pub date_format: String,
    /// Template producing a tag page path from `{tag}`.
    #[serde(rename = "tagsformat", alias = "tags_format")]
    pub tags_format: String,
    /// Number of posts in `site.recent_posts`.
    #[serde(rename = "recentcount", alias = "recent_count")]
    pub recent_count: usize,
    pub metadata: Metadata,
}

impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            title: String::new(),
            root: String::new(),
            author: String::new(),
            email: String::new(),
            path_format: "/{{ date_path }}/{{ slug }}".to_owned(),
            date_format: "2006-01-02".to_owned(),
            tags_format: "/tags/{{ tag }}".to_owned(),
            recent_count: 10,
            metadata: Metadata::new(),
        }
    }
}

/// Per-post metadata from `posts/<id>/meta.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostMeta {
    pub tags: Vec<String>,
    pub title: String,
    pub date: String,
    pub slug: String,
    pub scripts: Vec<String>,
    pub styles: Vec<String>,
    pub images: BTreeMap<String, ImageMeta>,
    pub metadata: Metadata,
}

impl PostMeta {
    /// Check that date, slug and title are present.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::MissingRequiredField`] naming the first empty field.
    pub fn validate(&self, path: &Path) -> Result<(), SiteError> {
        for (field, value) in [
            ("date", &self.date),
            ("slug", &self.slug),
            ("title", &self.title),
        ] {
            if value.trim().is_empty() {
                return Err(SiteError::MissingRequiredField {
                    field,
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(())
    }
}

/// An image declared in post metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageMeta {
    /// File name relative to the post directory.
    pub src: String,
    pub variants: BTreeMap<String, ImageVariantMeta>,
    pub metadata: Metadata,
}

/// An alternate rendition of a declared image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageVariantMeta {
    pub src: Option<String>,
}

/// Parse a YAML document, treating an empty document as all defaults.
pub(crate) fn parse_yaml<T>(content: &str, path: &Path) -> Result<T, SiteError>
where
    T: DeserializeOwned + Default,
{
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(content).map_err(|source| SiteError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}
