//! `quill new` command implementation.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Args;
use quill_config::BuildConfig;
use quill_site::{BODY_FILE, ContentLoader, META_FILE, SiteBuilder};
use quill_storage::Storage;
use serde::Serialize;

use super::{ConfigArgs, storage};
use crate::error::CliError;
use crate::output::Output;

const BODY_TEMPLATE: &str = "This is the post snippet.

<!--BREAK-->

This is content after the break.
";

/// Arguments for the new command.
#[derive(Args)]
pub(crate) struct NewArgs {
    /// Post title.
    title: String,

    /// URL slug (default: derived from the title).
    #[arg(long)]
    slug: Option<String>,

    /// Post directory name (default: today's date and the slug).
    #[arg(long)]
    id: Option<String>,

    /// Tags, comma separated.
    #[arg(short, long, value_delimiter = ',')]
    tags: Vec<String>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl NewArgs {
    /// Scaffold a post directory with `meta.yaml` and `body.md`.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.config.load()?;

        let draft = Draft::new(self.title, self.slug, self.id, self.tags, Utc::now())?;
        let dir = draft.write(storage().as_ref(), &config.build_resolved)?;

        output.success(&format!("Created {}", dir.display()));
        Ok(())
    }
}

#[derive(Serialize)]
struct DraftMeta<'a> {
    date: &'a str,
    slug: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    tags: &'a [String],
}

/// A post about to be written.
#[derive(Debug)]
struct Draft {
    id: String,
    title: String,
    slug: String,
    tags: Vec<String>,
    created: DateTime<Utc>,
}

impl Draft {
    fn new(
        title: String,
        slug: Option<String>,
        id: Option<String>,
        tags: Vec<String>,
        created: DateTime<Utc>,
    ) -> Result<Self, CliError> {
        let title = title.trim().to_owned();
        let slug = slugify(slug.as_deref().unwrap_or(&title));
        if slug.is_empty() {
            return Err(CliError::Validation(format!(
                "Cannot derive a slug from {title:?}, pass --slug"
            )));
        }
        let id = id.unwrap_or_else(|| format!("{}-{slug}", created.format("%Y-%m-%d")));
        let tags = tags
            .into_iter()
            .map(|tag| tag.trim().to_owned())
            .filter(|tag| !tag.is_empty())
            .collect();
        Ok(Self {
            id,
            title,
            slug,
            tags,
            created,
        })
    }

    /// Write the post below the posts root. The date uses the site's date
    /// format, so the site metadata must be readable.
    fn write(&self, storage: &dyn Storage, build: &BuildConfig) -> Result<PathBuf, CliError> {
        let meta = ContentLoader::new(storage).load_site_meta(&build.site_config_path())?;
        let date = SiteBuilder::new(meta)?.date_format().format(&self.created);

        let dir = build.posts_path().join(&self.id);
        if storage.exists(&dir) {
            return Err(CliError::PostExists(dir));
        }

        let meta = serde_yaml::to_string(&DraftMeta {
            date: &date,
            slug: &self.slug,
            title: &self.title,
            tags: &self.tags,
        })?;
        storage.create_dir_all(&dir)?;
        storage.write(&dir.join(META_FILE), meta.as_bytes())?;
        storage.write(&dir.join(BODY_FILE), BODY_TEMPLATE.as_bytes())?;
        Ok(dir)
    }
}

/// Lowercase ASCII letters and digits, every other run of characters
/// collapsed to one `-`.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_owned()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use quill_storage::MockStorage;

    use super::*;

    fn build_config() -> BuildConfig {
        BuildConfig::with_base(Path::new(""))
    }

    fn storage() -> MockStorage {
        MockStorage::new().with_file(
            "src/config.yaml",
            "title: Blog\nroot: http://example.com\ndateformat: \"2006-01-02\"\n",
        )
    }

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 12, 30, 0).unwrap()
    }

    fn draft(title: &str, tags: &[&str]) -> Draft {
        Draft::new(
            title.to_owned(),
            None,
            None,
            tags.iter().map(|t| (*t).to_owned()).collect(),
            created(),
        )
        .unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World!"), "hello-world");
        assert_eq!(slugify("  Rust & Go: a tale  "), "rust-go-a-tale");
        assert_eq!(slugify("v2.0 released"), "v2-0-released");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_draft_defaults() {
        let draft = draft(" Hello World! ", &["rust", " ", "blog "]);

        assert_eq!(draft.title, "Hello World!");
        assert_eq!(draft.slug, "hello-world");
        assert_eq!(draft.id, "2024-03-09-hello-world");
        assert_eq!(draft.tags, vec!["rust", "blog"]);
    }

    #[test]
    fn test_draft_without_slug_is_rejected() {
        let err = Draft::new("!!!".to_owned(), None, None, Vec::new(), created()).unwrap_err();

        assert!(matches!(err, CliError::Validation(_)));
    }

    #[test]
    fn test_write_creates_loadable_post() {
        let storage = storage();

        let dir = draft("Hello World!", &["rust"])
            .write(&storage, &build_config())
            .unwrap();

        assert_eq!(dir, Path::new("src/posts/2024-03-09-hello-world"));
        let meta = ContentLoader::new(&storage)
            .load_post_meta(&dir.join(META_FILE))
            .unwrap();
        assert_eq!(meta.title, "Hello World!");
        assert_eq!(meta.slug, "hello-world");
        assert_eq!(meta.date, "2024-03-09");
        assert_eq!(meta.tags, vec!["rust"]);
        let body = storage.file_contents(dir.join(BODY_FILE)).unwrap();
        assert!(body.contains("<!--BREAK-->"));
    }

    #[test]
    fn test_write_refuses_existing_post() {
        let storage = storage().with_file("src/posts/2024-03-09-hello-world/meta.yaml", "keep");

        let err = draft("Hello World!", &[])
            .write(&storage, &build_config())
            .unwrap_err();

        assert!(matches!(err, CliError::PostExists(_)));
        assert_eq!(
            storage.file_contents("src/posts/2024-03-09-hello-world/meta.yaml"),
            Some("keep".to_owned())
        );
    }

    #[test]
    fn test_write_requires_site_config() {
        let err = draft("Hello", &[])
            .write(&MockStorage::new(), &build_config())
            .unwrap_err();

        assert!(matches!(err, CliError::Site(_)));
    }
}
