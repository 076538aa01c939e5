//! Template rendering for Quill.
//!
//! [`TemplateSet`] loads a templates directory into a `minijinja`
//! environment and composes the post and tags templates onto the base
//! template. Post bodies are templates too: they run with an empty context
//! and a set of [`PostFunctions`] bound to the post, and their output is
//! converted from markdown to HTML.
//!
//! Pages see `post` and `site` as lazy objects ([`PostObject`],
//! [`SiteObject`]) over a frozen [`quill_site::Site`].

mod error;
mod functions;
mod markdown;
mod templates;
mod values;

pub use error::RenderError;
pub use functions::{PostFunctions, register_functions};
pub use markdown::markdown_to_html;
pub use templates::{TemplateNames, TemplateSet};
pub use values::{PostObject, SiteObject, post_context, site_context, tag_context};
