//! Site model for Quill.
//!
//! Loads site and post metadata through a [`quill_storage::Storage`], parses
//! dates once, probes declared images and assembles an immutable [`Site`]
//! with chronological ordering and a tag index. [`LinkTable`] maps
//! source-relative references to output paths.
//!
//! ```ignore
//! let loader = ContentLoader::new(&storage);
//! let mut builder = SiteBuilder::new(loader.load_site_meta(&config)?)?;
//! loader.load_posts(&mut builder, &posts_dir)?;
//! let site = builder.build();
//! let links = LinkTable::build(&site, &storage)?;
//! ```

mod date;
mod error;
mod image;
mod links;
mod loader;
mod meta;
mod post;
mod site;

pub use date::{DateFormat, from_rfc3339, to_rfc3339};
pub use error::SiteError;
pub use image::{ImageData, PostImage, join_url};
pub use links::LinkTable;
pub use loader::{BODY_FILE, ContentLoader, META_FILE, SkippedPost};
pub use meta::{ImageMeta, ImageVariantMeta, Metadata, PostMeta, SiteMeta};
pub use post::{BREAK_MARKER, Post};
pub use site::{Site, SiteBuilder, TagCount};
