//! Link table: source-relative references to output paths.

use std::collections::BTreeMap;

use quill_storage::Storage;

use crate::error::SiteError;
use crate::image::join_url;
use crate::site::Site;

/// Flat map from `id` and `id/name` to resolved output paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTable {
    entries: BTreeMap<String, String>,
}

impl LinkTable {
    /// Register every post and every entry of its source directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a post path fails to render or a post directory
    /// cannot be listed.
    pub fn build(site: &Site, storage: &dyn Storage) -> Result<Self, SiteError> {
        let mut entries = BTreeMap::new();
        for post in site.posts() {
            let path = site.post_path(post)?;
            for name in storage.read_dir(post.src_dir())? {
                entries.insert(format!("{}/{name}", post.id()), join_url(&path, &name));
            }
            entries.insert(post.id().to_owned(), path);
        }
        tracing::debug!(entries = entries.len(), "Built link table");
        Ok(Self { entries })
    }

    /// Resolve `reference` as seen from `post_id`.
    ///
    /// Tries `post_id/reference`, then `reference` alone. Returns an empty
    /// string on a miss.
    #[must_use]
    pub fn resolve(&self, post_id: &str, reference: &str) -> String {
        self.entries
            .get(&format!("{post_id}/{reference}"))
            .or_else(|| self.entries.get(reference))
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
