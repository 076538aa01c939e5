//! The site graph: posts, tags and the accessors that need site metadata.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use minijinja::{AutoEscape, Environment, context};
use serde::Serialize;

use crate::date::{DateFormat, to_rfc3339};
use crate::error::SiteError;
use crate::image::join_url;
use crate::meta::SiteMeta;
use crate::post::Post;

const PATH_TEMPLATE: &str = "pathformat";
const TAGS_TEMPLATE: &str = "tagsformat";
/// Fixed human-readable layout of `formatted_date`.
const DISPLAY_DATE_LAYOUT: &str = "Mon Jan _2, 2006";

/// A tag and the number of posts carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Compiled forms of the site's path, tag and date formats.
#[derive(Debug)]
struct Formats {
    date: DateFormat,
    display: DateFormat,
    templates: Environment<'static>,
}

impl Formats {
    fn compile(meta: &SiteMeta) -> Result<Self, SiteError> {
        let mut templates = Environment::new();
        templates.set_auto_escape_callback(|_| AutoEscape::None);
        templates.add_template_owned(PATH_TEMPLATE, meta.path_format.clone())?;
        templates.add_template_owned(TAGS_TEMPLATE, meta.tags_format.clone())?;
        Ok(Self {
            date: DateFormat::new(&meta.date_format)?,
            display: DateFormat::new(DISPLAY_DATE_LAYOUT)?,
            templates,
        })
    }

    fn post_path(&self, post: &Post) -> Result<String, SiteError> {
        let template = self.templates.get_template(PATH_TEMPLATE)?;
        Ok(template.render(context! {
            id => post.id(),
            slug => post.slug(),
            title => post.title(),
            date_path => self.date.format(&post.date()),
            date => to_rfc3339(&post.date()),
        })?)
    }

    fn tag_path(&self, tag: &str) -> Result<String, SiteError> {
        let template = self.templates.get_template(TAGS_TEMPLATE)?;
        Ok(template.render(context! { tag => tag })?)
    }
}

/// Collects posts for one build, then freezes into a [`Site`].
#[derive(Debug)]
pub struct SiteBuilder {
    meta: SiteMeta,
    formats: Formats,
    posts: BTreeMap<String, Post>,
    tags: BTreeMap<String, Vec<String>>,
    rendered: Option<DateTime<Utc>>,
}

impl SiteBuilder {
    /// Start a site from its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::PathTemplate`] if the path or tags format does not
    /// compile and [`SiteError::InvalidDateFormat`] for a bad date format.
    pub fn new(meta: SiteMeta) -> Result<Self, SiteError> {
        let formats = Formats::compile(&meta)?;
        Ok(Self {
            meta,
            formats,
            posts: BTreeMap::new(),
            tags: BTreeMap::new(),
            rendered: None,
        })
    }

    /// Site date format, for parsing post dates at load time.
    #[must_use]
    pub fn date_format(&self) -> &DateFormat {
        &self.formats.date
    }

    /// Output path of a post that has not been added yet.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::PathTemplate`] if the path format fails to render.
    pub fn post_path(&self, post: &Post) -> Result<String, SiteError> {
        self.formats.post_path(post)
    }

    /// Pin the render timestamp instead of using the current time.
    #[must_use]
    pub fn rendered_at(mut self, at: DateTime<Utc>) -> Self {
        self.rendered = Some(at);
        self
    }

    /// Add a post and append it to each of its tags, in call order.
    pub fn add_post(&mut self, post: Post) {
        for tag in post.tags() {
            let ids = self.tags.entry(tag.clone()).or_default();
            if !ids.iter().any(|id| id == post.id()) {
                ids.push(post.id().to_owned());
            }
        }
        self.posts.insert(post.id().to_owned(), post);
    }

    /// Number of posts added so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Freeze the site, computing the chronological order once.
    #[must_use]
    pub fn build(self) -> Site {
        let mut by_date: Vec<&Post> = self.posts.values().collect();
        by_date.sort_by(|a, b| {
            b.date()
                .cmp(&a.date())
                .then_with(|| b.id().cmp(a.id()))
        });
        let by_date = by_date.into_iter().map(|p| p.id().to_owned()).collect();

        Site {
            meta: self.meta,
            formats: self.formats,
            posts: self.posts,
            tags: self.tags,
            by_date,
            rendered: self.rendered.unwrap_or_else(Utc::now),
        }
    }
}

/// All valid posts, tags and site metadata for one build.
#[derive(Debug)]
pub struct Site {
    meta: SiteMeta,
    formats: Formats,
    posts: BTreeMap<String, Post>,
    tags: BTreeMap<String, Vec<String>>,
    by_date: Vec<String>,
    rendered: DateTime<Utc>,
}

impl Site {
    #[must_use]
    pub fn meta(&self) -> &SiteMeta {
        &self.meta
    }

    #[must_use]
    pub fn date_format(&self) -> &DateFormat {
        &self.formats.date
    }

    /// When this site was built.
    #[must_use]
    pub fn rendered(&self) -> DateTime<Utc> {
        self.rendered
    }

    #[must_use]
    pub fn post(&self, id: &str) -> Option<&Post> {
        self.posts.get(id)
    }

    /// Mutable access for storing rendered bodies.
    pub fn post_mut(&mut self, id: &str) -> Option<&mut Post> {
        self.posts.get_mut(id)
    }

    /// Posts in id order.
    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.posts.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Post ids, newest first; equal dates by id descending.
    #[must_use]
    pub fn ids_by_date(&self) -> &[String] {
        &self.by_date
    }

    /// Posts, newest first; equal dates by id descending.
    #[must_use]
    pub fn posts_by_date(&self) -> Vec<&Post> {
        self.by_date.iter().filter_map(|id| self.posts.get(id)).collect()
    }

    /// The first `recentcount` posts by date.
    #[must_use]
    pub fn recent_posts(&self) -> Vec<&Post> {
        let mut posts = self.posts_by_date();
        posts.truncate(self.meta.recent_count);
        posts
    }

    fn date_index(&self, id: &str) -> Option<usize> {
        self.by_date.iter().position(|candidate| candidate == id)
    }

    /// The post immediately newer than `id`.
    #[must_use]
    pub fn next_post(&self, id: &str) -> Option<&Post> {
        let index = self.date_index(id)?;
        let next = index.checked_sub(1)?;
        self.posts.get(&self.by_date[next])
    }

    /// The post immediately older than `id`.
    #[must_use]
    pub fn prev_post(&self, id: &str) -> Option<&Post> {
        let index = self.date_index(id)?;
        self.by_date
            .get(index + 1)
            .and_then(|prev| self.posts.get(prev))
    }

    /// Tag index: tag to post ids in parse order.
    #[must_use]
    pub fn tags(&self) -> &BTreeMap<String, Vec<String>> {
        &self.tags
    }

    /// Posts carrying `tag`, newest first.
    #[must_use]
    pub fn tag_posts(&self, tag: &str) -> Vec<&Post> {
        let Some(ids) = self.tags.get(tag) else {
            return Vec::new();
        };
        self.by_date
            .iter()
            .filter(|id| ids.contains(id))
            .filter_map(|id| self.posts.get(id))
            .collect()
    }

    /// Tags by post count descending, then by name.
    #[must_use]
    pub fn tag_counts(&self) -> Vec<TagCount> {
        let mut counts: Vec<TagCount> = self
            .tags
            .iter()
            .map(|(tag, ids)| TagCount {
                tag: tag.clone(),
                count: ids.len(),
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
        counts
    }

    /// Output path of a post, rendered from the path format on every call.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::PathTemplate`] if rendering fails.
    pub fn post_path(&self, post: &Post) -> Result<String, SiteError> {
        self.formats.post_path(post)
    }

    /// Post date formatted with the site date format.
    #[must_use]
    pub fn date_path(&self, post: &Post) -> String {
        self.formats.date.format(&post.date())
    }

    /// Post date in the fixed display layout, e.g. `Fri Sep  7, 2012`.
    #[must_use]
    pub fn formatted_date(&self, post: &Post) -> String {
        self.formats.display.format(&post.date())
    }

    /// Absolute URL of a post.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::PathTemplate`] if the path fails to render.
    pub fn permalink(&self, post: &Post) -> Result<String, SiteError> {
        Ok(join_url(&self.meta.root, &self.post_path(post)?))
    }

    /// Output path of a tag page.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::PathTemplate`] if the tags format fails to render.
    pub fn tag_path(&self, tag: &str) -> Result<String, SiteError> {
        self.formats.tag_path(tag)
    }

    /// Resolve a script/style reference: relative references are placed
    /// under the post path, absolute paths and URLs are kept.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::PathTemplate`] if the post path fails to render.
    pub fn resolve_reference(&self, post: &Post, reference: &str) -> Result<String, SiteError> {
        if reference.starts_with('/') || reference.contains("://") {
            return Ok(reference.to_owned());
        }
        Ok(join_url(&self.post_path(post)?, reference))
    }

    /// Resolved script references of a post.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::PathTemplate`] if the post path fails to render.
    pub fn scripts(&self, post: &Post) -> Result<Vec<String>, SiteError> {
        post.meta()
            .scripts
            .iter()
            .map(|s| self.resolve_reference(post, s))
            .collect()
    }

    /// Resolved style references of a post.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::PathTemplate`] if the post path fails to render.
    pub fn styles(&self, post: &Post) -> Result<Vec<String>, SiteError> {
        post.meta()
            .styles
            .iter()
            .map(|s| self.resolve_reference(post, s))
            .collect()
    }

    /// RFC 3339 form of the render timestamp.
    #[must_use]
    pub fn rendered_rfc3339(&self) -> String {
        to_rfc3339(&self.rendered)
    }
}
