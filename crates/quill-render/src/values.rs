//! Template-visible `post` and `site` objects.
//!
//! Both hold the frozen [`Site`] and resolve attributes lazily, so a post's
//! `path`, `permalink` and neighbors are computed through the site on access.

use std::collections::BTreeMap;
use std::sync::Arc;

use minijinja::value::{Enumerator, Object, Rest, Value, from_args};
use minijinja::{Error, ErrorKind, State, context};
use quill_site::{Post, Site, to_rfc3339};

const POST_FIELDS: &[&str] = &[
    "id",
    "title",
    "slug",
    "date",
    "formatted_date",
    "date_path",
    "path",
    "permalink",
    "tags",
    "scripts",
    "styles",
    "metadata",
    "images",
    "body",
    "snippet",
];

const SITE_FIELDS: &[&str] = &[
    "title",
    "root",
    "author",
    "email",
    "metadata",
    "posts",
    "recent_posts",
    "tags",
    "tag_counts",
    "rendered",
];

fn site_error(err: &quill_site::SiteError) -> Error {
    Error::new(ErrorKind::InvalidOperation, err.to_string())
}

fn none() -> Value {
    Value::from(())
}

/// A post as seen by templates.
#[derive(Debug)]
pub struct PostObject {
    site: Arc<Site>,
    id: String,
}

impl PostObject {
    /// Wrap the post `id` of `site` as a template value.
    #[must_use]
    pub fn value(site: &Arc<Site>, id: &str) -> Value {
        Value::from_object(Self {
            site: Arc::clone(site),
            id: id.to_owned(),
        })
    }

    fn list<'a>(site: &Arc<Site>, posts: impl IntoIterator<Item = &'a Post>) -> Value {
        Value::from(
            posts
                .into_iter()
                .map(|post| Self::value(site, post.id()))
                .collect::<Vec<_>>(),
        )
    }

    fn post(&self) -> Option<&Post> {
        self.site.post(&self.id)
    }

    fn neighbor(&self, neighbor: Option<&Post>) -> Value {
        neighbor.map_or_else(none, |post| Self::value(&self.site, post.id()))
    }
}

impl Object for PostObject {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let site = &self.site;
        let post = self.post()?;
        let value = match key.as_str()? {
            "id" => Value::from(post.id()),
            "title" => Value::from(post.title()),
            "slug" => Value::from(post.slug()),
            "date" => Value::from(to_rfc3339(&post.date())),
            "formatted_date" => Value::from(site.formatted_date(post)),
            "date_path" => Value::from(site.date_path(post)),
            "path" => Value::from(site.post_path(post).ok()?),
            "permalink" => Value::from(site.permalink(post).ok()?),
            "tags" => Value::from(post.tags().to_vec()),
            "scripts" => Value::from(site.scripts(post).ok()?),
            "styles" => Value::from(site.styles(post).ok()?),
            "metadata" => Value::from_serialize(post.metadata()),
            "images" => Value::from_serialize(post.images()),
            "body" => Value::from(post.body()),
            "snippet" => return post.snippet().map(Value::from),
            "next" => self.neighbor(site.next_post(post.id())),
            "prev" => self.neighbor(site.prev_post(post.id())),
            _ => return None,
        };
        Some(value)
    }

    // `next` and `prev` stay reachable by name but are not enumerated, so
    // serializing a post cannot walk the whole chain.
    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(POST_FIELDS)
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        let post = self
            .post()
            .ok_or_else(|| Error::new(ErrorKind::InvalidOperation, "post is gone"))?;
        match method {
            "has_metadata" => {
                let (key,): (&str,) = from_args(args)?;
                Ok(Value::from(post.has_metadata(key)))
            }
            "image" => {
                let (key,): (&str,) = from_args(args)?;
                Ok(post.image(key).map_or_else(none, Value::from_serialize))
            }
            "has_image" => {
                let (key,): (&str,) = from_args(args)?;
                Ok(Value::from(post.image(key).is_some()))
            }
            "image_list" => {
                let (keys,): (Rest<String>,) = from_args(args)?;
                let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
                Ok(Value::from(
                    post.image_list(&keys)
                        .into_iter()
                        .map(Value::from_serialize)
                        .collect::<Vec<_>>(),
                ))
            }
            _ => Err(Error::from(ErrorKind::UnknownMethod)),
        }
    }
}

/// The site as seen by templates.
#[derive(Debug)]
pub struct SiteObject {
    site: Arc<Site>,
}

impl SiteObject {
    #[must_use]
    pub fn value(site: &Arc<Site>) -> Value {
        Value::from_object(Self {
            site: Arc::clone(site),
        })
    }
}

impl Object for SiteObject {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let site = &self.site;
        let meta = site.meta();
        let value = match key.as_str()? {
            "title" => Value::from(meta.title.as_str()),
            "root" => Value::from(meta.root.as_str()),
            "author" => Value::from(meta.author.as_str()),
            "email" => Value::from(meta.email.as_str()),
            "metadata" => Value::from_serialize(&meta.metadata),
            "posts" => PostObject::list(site, site.posts_by_date()),
            "recent_posts" => PostObject::list(site, site.recent_posts()),
            "tags" => {
                let tags: BTreeMap<&str, Value> = site
                    .tags()
                    .keys()
                    .map(|tag| (tag.as_str(), PostObject::list(site, site.tag_posts(tag))))
                    .collect();
                Value::from_serialize(&tags)
            }
            "tag_counts" => Value::from_serialize(site.tag_counts()),
            "rendered" => Value::from(site.rendered_rfc3339()),
            _ => return None,
        };
        Some(value)
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(SITE_FIELDS)
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match method {
            "tag_path" => {
                let (tag,): (&str,) = from_args(args)?;
                self.site
                    .tag_path(tag)
                    .map(Value::from)
                    .map_err(|e| site_error(&e))
            }
            _ => Err(Error::from(ErrorKind::UnknownMethod)),
        }
    }
}

/// Context of a post page: `{post, site}`.
#[must_use]
pub fn post_context(site: &Arc<Site>, id: &str) -> Value {
    context! {
        post => PostObject::value(site, id),
        site => SiteObject::value(site),
    }
}

/// Context of a tag page: `{tag, posts, site}`.
#[must_use]
pub fn tag_context(site: &Arc<Site>, tag: &str) -> Value {
    context! {
        tag => tag,
        posts => PostObject::list(site, site.tag_posts(tag)),
        site => SiteObject::value(site),
    }
}

/// Context of a standalone template: `{site}`.
#[must_use]
pub fn site_context(site: &Arc<Site>) -> Value {
    context! { site => SiteObject::value(site) }
}
