//! Template functions.
//!
//! [`register_functions`] installs the functions every template sees.
//! [`PostFunctions`] adds the ones bound to a single post while its body is
//! rendered.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use minijinja::value::{Rest, Value};
use minijinja::{Environment, Error, ErrorKind, State, context};
use quill_site::{DateFormat, ImageData, LinkTable, Post, PostImage, from_rfc3339, join_url};
use quill_storage::Storage;
use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

fn invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidOperation, message.into())
}

/// Strip HTML tags.
pub fn textcontent(html: &str) -> String {
    TAG_RE.replace_all(html, "").into_owned()
}

/// Format an RFC 3339 timestamp with a date pattern.
pub fn timeformat(timestamp: &str, pattern: &str) -> Result<String, Error> {
    let date = from_rfc3339(timestamp).map_err(|e| invalid(e.to_string()))?;
    let format = DateFormat::new(pattern).map_err(|e| invalid(e.to_string()))?;
    Ok(format.format(&date))
}

/// Collect arguments into a list.
pub fn slice(items: Rest<Value>) -> Value {
    Value::from(items.0)
}

/// Build a map from alternating keys and values.
pub fn map(items: Rest<Value>) -> Result<Value, Error> {
    if items.len() % 2 != 0 {
        return Err(invalid("map expects an even number of arguments"));
    }
    let mut out = BTreeMap::new();
    for pair in items.chunks(2) {
        let key = pair[0]
            .as_str()
            .ok_or_else(|| invalid(format!("map key {} is not a string", pair[0])))?;
        out.insert(key.to_owned(), pair[1].clone());
    }
    Ok(Value::from_serialize(&out))
}

pub fn toyaml(value: &Value) -> Result<String, Error> {
    serde_yaml::to_string(value)
        .map_err(|e| Error::new(ErrorKind::BadSerialization, "could not encode YAML").with_source(e))
}

pub fn tojson(value: &Value) -> Result<String, Error> {
    serde_json::to_string(value)
        .map_err(|e| Error::new(ErrorKind::BadSerialization, "could not encode JSON").with_source(e))
}

/// Render a macro or template by name and parse its output as YAML.
///
/// A macro visible from the calling template wins over a template of the
/// same name. `data` is passed to the macro as its only argument, or used as
/// the template context.
pub fn yamltemplate(state: &State, name: &str, data: Option<Value>) -> Result<Value, Error> {
    let callable = state.lookup(name).filter(|v| !v.is_undefined() && !v.is_none());
    let output = if let Some(callable) = callable {
        let args: Vec<Value> = data.into_iter().collect();
        callable.call(state, &args)?.to_string()
    } else {
        let template = state.env().get_template(name)?;
        match data {
            Some(data) => template.render(data)?,
            None => template.render(context! {})?,
        }
    };

    let parsed: serde_json::Value = serde_yaml::from_str(&output).map_err(|e| {
        Error::new(ErrorKind::BadSerialization, format!("{name} did not produce YAML")).with_source(e)
    })?;
    Ok(Value::from_serialize(&parsed))
}

/// Install the functions and filters shared by all templates.
pub fn register_functions(env: &mut Environment<'static>) {
    env.add_function("textcontent", textcontent);
    env.add_function("timeformat", timeformat);
    env.add_function("slice", slice);
    env.add_function("map", map);
    env.add_function("toyaml", toyaml);
    env.add_function("tojson", tojson);
    env.add_function("yamltemplate", yamltemplate);

    env.add_filter("textcontent", textcontent);
    env.add_filter("timeformat", timeformat);
    env.add_filter("toyaml", toyaml);
    env.add_filter("tojson", tojson);
}

/// Functions bound to the post whose body is being rendered.
pub struct PostFunctions {
    post_id: String,
    src_dir: PathBuf,
    post_path: String,
    images: BTreeMap<String, PostImage>,
    links: Arc<LinkTable>,
    storage: Arc<dyn Storage>,
}

impl PostFunctions {
    #[must_use]
    pub fn new(post: &Post, post_path: String, links: Arc<LinkTable>, storage: Arc<dyn Storage>) -> Self {
        Self {
            post_id: post.id().to_owned(),
            src_dir: post.src_dir().to_path_buf(),
            post_path,
            images: post.images().clone(),
            links,
            storage,
        }
    }

    /// Resolve a reference through the link table, post scope first.
    pub fn link(&self, reference: &str) -> String {
        self.links.resolve(&self.post_id, reference)
    }

    /// Raw text of a file in the post directory, or an inline error marker.
    pub fn include(&self, reference: &str) -> String {
        let path = self.src_dir.join(reference);
        match self.storage.read_to_string(&path) {
            Ok(contents) => contents,
            Err(error) => {
                tracing::warn!(post = %self.post_id, path = %path.display(), %error, "Include failed");
                format!("[[ERROR: Could not read {}]]", path.display())
            }
        }
    }

    /// Probe an image in the post directory.
    pub fn imagemeta(&self, reference: &str) -> Result<ImageData, Error> {
        ImageData::load(
            self.storage.as_ref(),
            &self.src_dir.join(reference),
            join_url(&self.post_path, reference),
        )
        .map_err(|e| invalid(format!("Could not load image metadata: {e}")))
    }

    /// A declared image of the post.
    pub fn image(&self, key: &str) -> Option<&PostImage> {
        self.images.get(key)
    }

    /// Install the bound functions into `env`.
    pub fn register(self: Arc<Self>, env: &mut Environment<'static>) {
        let f = Arc::clone(&self);
        env.add_function("link", move |reference: String| f.link(&reference));

        let f = Arc::clone(&self);
        env.add_function("include", move |reference: String| f.include(&reference));

        let f = Arc::clone(&self);
        env.add_function("imagemeta", move |reference: String| {
            f.imagemeta(&reference).map(|data| Value::from_serialize(&data))
        });

        env.add_function("image", move |key: String| {
            self.image(&key)
                .map_or_else(|| Value::from(()), Value::from_serialize)
        });
    }
}
