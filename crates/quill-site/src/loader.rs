//! Content loading: site metadata, post metadata and post bodies.

use std::collections::BTreeMap;
use std::path::Path;

use quill_storage::Storage;

use crate::error::SiteError;
use crate::image::PostImage;
use crate::meta::{PostMeta, SiteMeta, parse_yaml};
use crate::post::Post;
use crate::site::SiteBuilder;

/// Per-post metadata file name.
pub const META_FILE: &str = "meta.yaml";
/// Per-post markdown body file name.
pub const BODY_FILE: &str = "body.md";

/// A post directory that failed to load.
#[derive(Debug)]
pub struct SkippedPost {
    pub id: String,
    pub error: SiteError,
}

/// Reads site content through a [`Storage`].
pub struct ContentLoader<'a> {
    storage: &'a dyn Storage,
}

impl<'a> ContentLoader<'a> {
    #[must_use]
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    /// Load site metadata.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::MissingConfig`] if the file cannot be read and
    /// [`SiteError::Yaml`] if it does not parse.
    pub fn load_site_meta(&self, path: &Path) -> Result<SiteMeta, SiteError> {
        let content =
            self.storage
                .read_to_string(path)
                .map_err(|source| SiteError::MissingConfig {
                    path: path.to_path_buf(),
                    source,
                })?;
        parse_yaml(&content, path)
    }

    /// Load and validate post metadata.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file cannot be read,
    /// [`SiteError::Yaml`] if it does not parse and
    /// [`SiteError::MissingRequiredField`] if date, slug or title is empty.
    pub fn load_post_meta(&self, path: &Path) -> Result<PostMeta, SiteError> {
        let content = self.storage.read_to_string(path)?;
        let meta: PostMeta = parse_yaml(&content, path)?;
        meta.validate(path)?;
        Ok(meta)
    }

    /// Load one post directory.
    ///
    /// A missing body is empty. Declared images that cannot be probed are
    /// left out with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata is missing or invalid, the date does
    /// not match the site date format, or the body cannot be read.
    pub fn load_post(&self, builder: &SiteBuilder, id: &str, dir: &Path) -> Result<Post, SiteError> {
        let meta = self.load_post_meta(&dir.join(META_FILE))?;
        let date = builder.date_format().parse(&meta.date)?;

        let source = match self.storage.read_to_string(&dir.join(BODY_FILE)) {
            Ok(source) => source,
            Err(err) if err.is_not_found() => String::new(),
            Err(err) => return Err(err.into()),
        };

        let post = Post::new(id.to_owned(), dir.to_path_buf(), meta, date).with_source(source);
        let images = self.load_images(builder, &post)?;
        Ok(post.with_images(images))
    }

    fn load_images(
        &self,
        builder: &SiteBuilder,
        post: &Post,
    ) -> Result<BTreeMap<String, PostImage>, SiteError> {
        let mut images = BTreeMap::new();
        if post.meta().images.is_empty() {
            return Ok(images);
        }

        let path = builder.post_path(post)?;
        for (key, meta) in &post.meta().images {
            match PostImage::load(self.storage, meta, post.src_dir(), &path) {
                Ok(image) => {
                    images.insert(key.clone(), image);
                }
                Err(error) => {
                    tracing::warn!(post = post.id(), image = %key, %error, "Skipping image");
                }
            }
        }
        Ok(images)
    }

    /// Load every post directory under `root` into `builder`.
    ///
    /// Directories are visited in name order; files are ignored. A post that
    /// fails to load is logged, reported and skipped. A missing `root`
    /// yields no posts.
    ///
    /// # Errors
    ///
    /// Returns an error only if `root` exists but cannot be listed.
    pub fn load_posts(
        &self,
        builder: &mut SiteBuilder,
        root: &Path,
    ) -> Result<Vec<SkippedPost>, SiteError> {
        let names = match self.storage.read_dir(root) {
            Ok(names) => names,
            Err(err) if err.is_not_found() => {
                tracing::info!(path = %root.display(), "Posts directory not found");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        let mut skipped = Vec::new();
        for name in names {
            let dir = root.join(&name);
            if !self.storage.is_dir(&dir) {
                continue;
            }
            match self.load_post(builder, &name, &dir) {
                Ok(post) => {
                    tracing::debug!(post = %name, "Loaded post");
                    builder.add_post(post);
                }
                Err(error) => {
                    tracing::warn!(post = %name, %error, "Skipping post");
                    skipped.push(SkippedPost { id: name, error });
                }
            }
        }
        Ok(skipped)
    }
}
