//! Site build pipeline for Quill.
//!
//! [`Builder`] turns a source tree into a rendered site in one synchronous
//! pass. [`watch_loop`] keeps the output current by rebuilding after every
//! burst of filesystem changes.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use quill_build::Builder;
//! use quill_config::BuildConfig;
//! use quill_storage::FsStorage;
//!
//! let storage = Arc::new(FsStorage::new(".".into()));
//! let report = Builder::new(BuildConfig::default(), storage).process()?;
//! println!("{} posts", report.posts);
//! ```

mod error;
mod hook;
mod pipeline;
mod watch;

pub use error::{BuildError, WatchError};
pub use hook::run_hook;
pub use pipeline::{BuildReport, Builder};
pub use watch::{WatchOptions, Watcher, watch_loop};
