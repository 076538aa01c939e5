//! A single post.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::image::PostImage;
use crate::meta::{Metadata, PostMeta};

/// Marker separating a post's snippet from the rest of its body.
pub const BREAK_MARKER: &str = "<!--BREAK-->";

/// One content item: metadata, rendered body and resources.
///
/// Accessors that depend on site configuration (path, permalink,
/// neighbors) live on [`crate::Site`] and take the post by reference.
#[derive(Debug, Clone)]
pub struct Post {
    id: String,
    src_dir: PathBuf,
    meta: PostMeta,
    date: DateTime<Utc>,
    source: String,
    body: String,
    snippet: Option<String>,
    images: BTreeMap<String, PostImage>,
}

impl Post {
    /// Create a post from validated metadata and its parsed date.
    #[must_use]
    pub fn new(id: String, src_dir: PathBuf, meta: PostMeta, date: DateTime<Utc>) -> Self {
        Self {
            id,
            src_dir,
            meta,
            date,
            source: String::new(),
            body: String::new(),
            snippet: None,
            images: BTreeMap::new(),
        }
    }

    /// Attach the raw markdown source of the body.
    #[must_use]
    pub fn with_source(mut self, source: String) -> Self {
        self.source = source;
        self
    }

    /// Attach resolved images.
    #[must_use]
    pub fn with_images(mut self, images: BTreeMap<String, PostImage>) -> Self {
        self.images = images;
        self
    }

    /// Directory name of the post; unique within a site.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Source directory holding `meta.yaml`, `body.md` and resources.
    #[must_use]
    pub fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    #[must_use]
    pub fn meta(&self) -> &PostMeta {
        &self.meta
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.meta.title
    }

    /// Slug, lowercased.
    #[must_use]
    pub fn slug(&self) -> String {
        self.meta.slug.to_lowercase()
    }

    /// Date parsed at load time.
    #[must_use]
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.meta.tags
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.meta.metadata
    }

    #[must_use]
    pub fn has_metadata(&self, key: &str) -> bool {
        self.meta.metadata.contains_key(key)
    }

    /// Raw markdown body, before template execution.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Rendered HTML body; empty until rendered.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// HTML before the break marker, if the body has one.
    #[must_use]
    pub fn snippet(&self) -> Option<&str> {
        self.snippet.as_deref()
    }

    /// Store the rendered body and derive the snippet from it.
    pub fn set_body(&mut self, html: String) {
        self.snippet = html
            .find(BREAK_MARKER)
            .map(|index| html[..index].to_owned());
        self.body = html;
    }

    #[must_use]
    pub fn images(&self) -> &BTreeMap<String, PostImage> {
        &self.images
    }

    #[must_use]
    pub fn image(&self, key: &str) -> Option<&PostImage> {
        self.images.get(key)
    }

    /// Images for the given keys, skipping unknown keys.
    #[must_use]
    pub fn image_list<'a>(&'a self, keys: &[&str]) -> Vec<&'a PostImage> {
        keys.iter().filter_map(|key| self.images.get(*key)).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn post() -> Post {
        let meta = PostMeta {
            title: "Hello".to_owned(),
            slug: "Hello-World".to_owned(),
            date: "2012-09-07".to_owned(),
            tags: vec!["Tag1".to_owned()],
            metadata: Metadata::from([("lang".to_owned(), "en".into())]),
            ..PostMeta::default()
        };
        let date = Utc.with_ymd_and_hms(2012, 9, 7, 0, 0, 0).unwrap();
        Post::new("01-hello".to_owned(), PathBuf::from("src/posts/01-hello"), meta, date)
    }

    #[test]
    fn test_slug_is_lowercased() {
        assert_eq!(post().slug(), "hello-world");
    }

    #[test]
    fn test_metadata_lookup() {
        let post = post();

        assert!(post.has_metadata("lang"));
        assert!(!post.has_metadata("missing"));
        assert_eq!(post.tags().to_vec(), vec!["Tag1"]);
    }

    #[test]
    fn test_set_body_extracts_snippet() {
        let mut post = post();

        post.set_body("<p>Intro</p>\n<!--BREAK-->\n<p>More</p>\n".to_owned());

        assert_eq!(post.snippet(), Some("<p>Intro</p>\n"));
        assert!(post.body().ends_with("<p>More</p>\n"));
    }

    #[test]
    fn test_set_body_without_marker_has_no_snippet() {
        let mut post = post();

        post.set_body("<p>Only</p>".to_owned());

        assert_eq!(post.snippet(), None);
    }

    #[test]
    fn test_image_list_skips_unknown_keys() {
        let post = post();

        assert!(post.image_list(&["nope"]).is_empty());
        assert!(post.image("nope").is_none());
    }
}
