//! Template composition and page rendering.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use minijinja::{AutoEscape, Environment, context};
use quill_site::{Post, Site};
use quill_storage::Storage;
use regex::Regex;

use crate::error::RenderError;
use crate::functions::{PostFunctions, register_functions};
use crate::markdown::markdown_to_html;
use crate::values::{post_context, site_context, tag_context};

static EXTENDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{%-?\s*extends\s").unwrap());

/// File names of the specialized templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateNames {
    pub post: String,
    pub tags: String,
    pub root: String,
}

impl Default for TemplateNames {
    fn default() -> Self {
        Self {
            post: "post.tmpl".to_owned(),
            tags: "tags.tmpl".to_owned(),
            root: "root.tmpl".to_owned(),
        }
    }
}

/// Base environment: no auto-escaping, trailing newlines kept, shared
/// functions installed.
fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_keep_trailing_newline(true);
    register_functions(&mut env);
    env
}

/// Root templates plus the post and tags fragments composed onto them.
#[derive(Debug)]
pub struct TemplateSet {
    env: Environment<'static>,
    base: Option<String>,
    post: Option<String>,
    tags: Option<String>,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self {
            env: environment(),
            base: None,
            post: None,
            tags: None,
        }
    }
}

impl TemplateSet {
    /// Load every file in `root` as a template.
    ///
    /// The post and tags templates are merged onto the base template: the
    /// root template if present, else the first other template by name,
    /// else the post template itself. A missing `root` gives an empty set.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::MissingPostTemplate`] if `root` exists without
    /// a post template and [`RenderError::Template`] if any template fails
    /// to parse.
    pub fn compose(
        storage: &dyn Storage,
        root: &Path,
        names: &TemplateNames,
    ) -> Result<Self, RenderError> {
        let entries = match storage.read_dir(root) {
            Ok(entries) => entries,
            Err(err) if err.is_not_found() => {
                tracing::info!(path = %root.display(), "Templates directory not found");
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };

        let mut sources = BTreeMap::new();
        for name in entries {
            let path = root.join(&name);
            if storage.is_dir(&path) {
                continue;
            }
            sources.insert(name, storage.read_to_string(&path)?);
        }

        let post_source = sources
            .remove(&names.post)
            .ok_or_else(|| RenderError::MissingPostTemplate(root.join(&names.post)))?;
        let tags_source = sources.remove(&names.tags);

        let base = if sources.contains_key(&names.root) {
            names.root.clone()
        } else if let Some(first) = sources.keys().next() {
            first.clone()
        } else {
            tracing::debug!("No root template, using the post template as base");
            names.post.clone()
        };

        let mut set = Self {
            base: Some(base),
            ..Self::default()
        };
        for (name, source) in sources {
            tracing::debug!(template = %name, "Found root template");
            set.add(name, source)?;
        }

        let post_source = set.merge(&names.post, &post_source);
        set.add(names.post.clone(), post_source)?;
        set.post = Some(names.post.clone());

        if let Some(tags_source) = tags_source {
            let tags_source = set.merge(&names.tags, &tags_source);
            set.add(names.tags.clone(), tags_source)?;
            set.tags = Some(names.tags.clone());
        }

        Ok(set)
    }

    fn add(&mut self, name: String, source: String) -> Result<(), RenderError> {
        self.env
            .add_template_owned(name.clone(), source)
            .map_err(|source| RenderError::Template { name, source })
    }

    /// Make `source` a child of the base template unless it already extends
    /// something or is the base itself.
    fn merge(&self, name: &str, source: &str) -> String {
        match &self.base {
            Some(base) if base != name && !EXTENDS_RE.is_match(source) => {
                format!("{{% extends {base:?} %}}{source}")
            }
            _ => source.to_owned(),
        }
    }

    #[must_use]
    pub fn has_post_template(&self) -> bool {
        self.post.is_some()
    }

    #[must_use]
    pub fn has_tags_template(&self) -> bool {
        self.tags.is_some()
    }

    /// Render a post body: execute it as a template with the post's bound
    /// functions and an empty context, then convert markdown to HTML.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Render`] if the body template fails.
    pub fn render_body(&self, post: &Post, functions: PostFunctions) -> Result<String, RenderError> {
        if post.source().is_empty() {
            return Ok(String::new());
        }
        let mut env = self.env.clone();
        Arc::new(functions).register(&mut env);

        let name = format!("{}/body", post.id());
        let markdown = env
            .render_named_str(&name, post.source(), context! {})
            .map_err(RenderError::render(name))?;
        Ok(markdown_to_html(&markdown))
    }

    /// Render the page of post `id`. Empty without a post template.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Render`] if the post template fails.
    pub fn render_post(&self, site: &Arc<Site>, id: &str) -> Result<String, RenderError> {
        let Some(name) = &self.post else {
            return Ok(String::new());
        };
        self.render(name, post_context(site, id))
    }

    /// Render the page of `tag`. Empty without a tags template.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Render`] if the tags template fails.
    pub fn render_tag(&self, site: &Arc<Site>, tag: &str) -> Result<String, RenderError> {
        let Some(name) = &self.tags else {
            return Ok(String::new());
        };
        self.render(name, tag_context(site, tag))
    }

    /// Render a standalone template file against `{site}`, merged onto the
    /// base template.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Render`] if the template fails to parse or
    /// execute.
    pub fn render_file(&self, site: &Arc<Site>, name: &str, source: &str) -> Result<String, RenderError> {
        let source = self.merge(name, source);
        self.env
            .render_named_str(name, &source, site_context(site))
            .map_err(RenderError::render(name))
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String, RenderError> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(RenderError::render(name))
    }
}
