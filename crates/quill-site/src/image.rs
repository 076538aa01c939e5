//! Image dimension probing.
//!
//! Only the header is decoded; pixel data is never loaded.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;

use quill_storage::Storage;
use serde::Serialize;

use crate::error::SiteError;
use crate::meta::{ImageMeta, Metadata};

/// Dimensions and output location of an image file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    /// Output URL path of the image.
    pub path: String,
}

impl ImageData {
    /// Probe `src` through `storage` and pair its dimensions with `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Storage`] if the file cannot be read and
    /// [`SiteError::Image`] if its format or header is not recognized.
    pub fn load(storage: &dyn Storage, src: &Path, path: String) -> Result<Self, SiteError> {
        let bytes = storage.read(src)?;
        let (width, height) = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| SiteError::Image {
                path: src.to_path_buf(),
                source: image::ImageError::IoError(e),
            })?
            .into_dimensions()
            .map_err(|source| SiteError::Image {
                path: src.to_path_buf(),
                source,
            })?;
        Ok(Self {
            width,
            height,
            path,
        })
    }
}

/// A declared post image with its probed data and variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostImage {
    #[serde(flatten)]
    pub data: ImageData,
    pub variants: BTreeMap<String, ImageData>,
    pub metadata: Metadata,
}

impl PostImage {
    /// Resolve an image declaration for a post.
    ///
    /// `src_dir` is the post's source directory and `post_path` its output
    /// path; each source file is probed and mapped below `post_path`.
    /// Variants without a `src` are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first probe failure of the image or any variant.
    pub fn load(
        storage: &dyn Storage,
        meta: &ImageMeta,
        src_dir: &Path,
        post_path: &str,
    ) -> Result<Self, SiteError> {
        let data = ImageData::load(storage, &src_dir.join(&meta.src), join_url(post_path, &meta.src))?;

        let mut variants = BTreeMap::new();
        for (key, variant) in &meta.variants {
            if let Some(src) = &variant.src {
                let variant_data =
                    ImageData::load(storage, &src_dir.join(src), join_url(post_path, src))?;
                variants.insert(key.clone(), variant_data);
            }
        }

        Ok(Self {
            data,
            variants,
            metadata: meta.metadata.clone(),
        })
    }
}

/// Join URL path segments with exactly one slash between them.
pub fn join_url(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if name.is_empty() {
        return if base.is_empty() { "/".to_owned() } else { base.to_owned() };
    }
    format!("{base}/{name}")
}

#[cfg(test)]
pub(crate) mod tests {
    use pretty_assertions::assert_eq;
    use quill_storage::MockStorage;

    use super::*;
    use crate::meta::ImageVariantMeta;

    /// Encode a blank PNG of the given size.
    pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image::RgbImage::new(width, height)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("/2012-09-07/hello-world", "img.png"), "/2012-09-07/hello-world/img.png");
        assert_eq!(join_url("/posts/", "/img.png"), "/posts/img.png");
        assert_eq!(join_url("", "img.png"), "/img.png");
        assert_eq!(join_url("/a", ""), "/a");
    }

    #[test]
    fn test_image_data_load() {
        let storage = MockStorage::new().with_file("post/image01.png", png(16, 8));

        let data = ImageData::load(
            &storage,
            Path::new("post/image01.png"),
            "/p/image01.png".to_owned(),
        )
        .unwrap();

        assert_eq!(
            data,
            ImageData {
                width: 16,
                height: 8,
                path: "/p/image01.png".to_owned(),
            }
        );
    }

    #[test]
    fn test_image_data_missing_file() {
        let storage = MockStorage::new();

        let err = ImageData::load(&storage, Path::new("nope.png"), String::new()).unwrap_err();

        assert!(matches!(err, SiteError::Storage(_)));
    }

    #[test]
    fn test_image_data_not_an_image() {
        let storage = MockStorage::new().with_file("notes.png", "plain text");

        let err = ImageData::load(&storage, Path::new("notes.png"), String::new()).unwrap_err();

        assert!(matches!(err, SiteError::Image { .. }));
    }

    #[test]
    fn test_post_image_with_variants() {
        let storage = MockStorage::new()
            .with_file("posts/a/full.png", png(800, 600))
            .with_file("posts/a/thumb.png", png(80, 60));
        let meta = ImageMeta {
            src: "full.png".to_owned(),
            variants: BTreeMap::from([
                (
                    "thumb".to_owned(),
                    ImageVariantMeta {
                        src: Some("thumb.png".to_owned()),
                    },
                ),
                ("empty".to_owned(), ImageVariantMeta { src: None }),
            ]),
            metadata: Metadata::new(),
        };

        let image = PostImage::load(&storage, &meta, Path::new("posts/a"), "/2017/a").unwrap();

        assert_eq!(image.data.width, 800);
        assert_eq!(image.data.path, "/2017/a/full.png");
        assert_eq!(image.variants.len(), 1);
        assert_eq!(image.variants["thumb"].path, "/2017/a/thumb.png");
        assert_eq!(image.variants["thumb"].height, 60);
    }
}
