//! The build pipeline.
//!
//! [`Builder::process`] rebuilds the whole site from scratch:
//!
//! 1. pre-build hook
//! 2. output directory
//! 3. site metadata
//! 4. templates
//! 5. posts and link table
//! 6. post bodies, then post pages with their resources
//! 7. tag pages
//! 8. everything else in the source tree
//!
//! Every stage after the hook works on a fresh [`BuildContext`]; nothing
//! survives between builds.

use std::collections::VecDeque;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use quill_config::BuildConfig;
use quill_render::{PostFunctions, TemplateNames, TemplateSet};
use quill_site::{ContentLoader, LinkTable, Site, SiteBuilder};
use quill_storage::Storage;

use crate::error::BuildError;
use crate::hook::run_hook;

const TEMPLATE_EXTENSION: &str = "tmpl";
const SKIPPED_RESOURCE_EXTENSIONS: &[&str] = &["md", "yaml"];

/// Counts from one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Valid posts rendered.
    pub posts: usize,
    /// Post directories skipped as invalid.
    pub skipped: usize,
    /// Tag pages rendered.
    pub tags: usize,
    /// Standalone templates rendered.
    pub pages: usize,
    /// Files copied verbatim.
    pub copied: usize,
}

/// State owned by one build, dropped when it finishes.
struct BuildContext {
    templates: TemplateSet,
    site: Arc<Site>,
    report: BuildReport,
}

/// Runs full builds of one source tree.
pub struct Builder {
    config: BuildConfig,
    storage: Arc<dyn Storage>,
}

impl Builder {
    #[must_use]
    pub fn new(config: BuildConfig, storage: Arc<dyn Storage>) -> Self {
        Self { config, storage }
    }

    #[must_use]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Rebuild the site.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error of any stage, unchanged. Output written
    /// before the failure is left in place.
    pub fn process(&self) -> Result<BuildReport, BuildError> {
        let started = Instant::now();
        if let Some(command) = &self.config.before {
            run_hook(command)?;
        }

        self.storage.create_dir_all(&self.config.output_dir)?;
        let mut ctx = self.load()?;
        self.render_posts(&mut ctx)?;
        self.render_tags(&mut ctx)?;
        self.render_misc(&mut ctx)?;

        let report = ctx.report;
        tracing::info!(
            posts = report.posts,
            skipped = report.skipped,
            tags = report.tags,
            pages = report.pages,
            copied = report.copied,
            elapsed_ms = started.elapsed().as_millis(),
            "Build finished"
        );
        Ok(report)
    }

    /// Load metadata, templates and posts, then render every post body.
    ///
    /// Bodies are rendered in id order before the site is frozen, so pages
    /// and listings always see every body.
    fn load(&self) -> Result<BuildContext, BuildError> {
        let storage = self.storage.as_ref();
        let loader = ContentLoader::new(storage);

        let site_config = self.config.site_config_path();
        tracing::debug!(path = %site_config.display(), "Loading site metadata");
        let meta = loader.load_site_meta(&site_config)?;

        let names = TemplateNames {
            post: self.config.post_template.clone(),
            tags: self.config.tags_template.clone(),
            root: self.config.root_template.clone(),
        };
        let templates = TemplateSet::compose(storage, &self.config.templates_path(), &names)?;

        let mut builder = SiteBuilder::new(meta)?;
        let skipped = loader.load_posts(&mut builder, &self.config.posts_path())?;
        let mut site = builder.build();
        let links = Arc::new(LinkTable::build(&site, storage)?);

        let ids: Vec<String> = site.posts().map(|post| post.id().to_owned()).collect();
        for id in &ids {
            let Some(post) = site.post(id) else { continue };
            let path = site.post_path(post)?;
            let functions =
                PostFunctions::new(post, path, Arc::clone(&links), Arc::clone(&self.storage));
            let html = templates.render_body(post, functions)?;
            if let Some(post) = site.post_mut(id) {
                post.set_body(html);
            }
        }

        Ok(BuildContext {
            templates,
            site: Arc::new(site),
            report: BuildReport {
                skipped: skipped.len(),
                ..BuildReport::default()
            },
        })
    }

    /// Output location of a URL path, or `None` when the path would leave
    /// the output directory.
    fn output_path(&self, url_path: &str) -> Option<PathBuf> {
        let relative = Path::new(url_path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        Some(self.config.output_dir.join(relative))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), BuildError> {
        if let Some(parent) = path.parent() {
            self.storage.create_dir_all(parent)?;
        }
        tracing::debug!(path = %path.display(), "Writing");
        self.storage.write(path, contents.as_bytes())?;
        Ok(())
    }

    fn render_posts(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        let site = Arc::clone(&ctx.site);
        for post in site.posts() {
            let url_path = site.post_path(post)?;
            let Some(dir) = self.output_path(&url_path) else {
                tracing::warn!(
                    id = post.id(),
                    path = %url_path,
                    "Skipping post outside the output directory"
                );
                continue;
            };
            let html = ctx.templates.render_post(&site, post.id())?;
            self.write(&dir.join("index.html"), &html)?;
            ctx.report.copied += self.copy_resources(post.src_dir(), &dir)?;
            ctx.report.posts += 1;
        }
        Ok(())
    }

    /// Copy a post's resources beside its page, recursively, leaving out
    /// markdown and YAML files. Failed copies are logged and skipped.
    fn copy_resources(&self, src_dir: &Path, dst_dir: &Path) -> Result<usize, BuildError> {
        let mut copied = 0;
        let mut queue: VecDeque<PathBuf> = self
            .storage
            .read_dir(src_dir)?
            .into_iter()
            .map(PathBuf::from)
            .collect();

        while let Some(relative) = queue.pop_front() {
            let src = src_dir.join(&relative);
            let dst = dst_dir.join(&relative);
            if self.storage.stat(&src)?.is_dir {
                self.storage.create_dir_all(&dst)?;
                queue.extend(
                    self.storage
                        .read_dir(&src)?
                        .into_iter()
                        .map(|name| relative.join(name)),
                );
                continue;
            }

            let skip = src
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SKIPPED_RESOURCE_EXTENSIONS.contains(&ext));
            if skip {
                continue;
            }

            match self.storage.copy(&src, &dst) {
                Ok(_) => copied += 1,
                Err(error) => {
                    tracing::warn!(src = %src.display(), %error, "Could not copy post resource");
                }
            }
        }
        Ok(copied)
    }

    fn render_tags(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        if !ctx.templates.has_tags_template() {
            return Ok(());
        }
        let site = Arc::clone(&ctx.site);
        for tag in site.tags().keys() {
            let url_path = site.tag_path(tag)?;
            let Some(dir) = self.output_path(&url_path) else {
                tracing::warn!(
                    tag = %tag,
                    path = %url_path,
                    "Skipping tag outside the output directory"
                );
                continue;
            };
            let dst = dir.join("index.html");
            let html = ctx.templates.render_tag(&site, tag)?;
            self.write(&dst, &html)?;
            ctx.report.tags += 1;
        }
        Ok(())
    }

    /// Walk the source tree breadth-first, skipping the posts and templates
    /// roots. Templates render to their name without `.tmpl` (`.html` when
    /// nothing is left); other files are copied.
    fn render_misc(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        let source_dir = &self.config.source_dir;
        let mut queue: VecDeque<PathBuf> = self
            .storage
            .read_dir(source_dir)?
            .into_iter()
            .map(PathBuf::from)
            .collect();

        while let Some(relative) = queue.pop_front() {
            if relative == Path::new(&self.config.posts_dir)
                || relative == Path::new(&self.config.templates_dir)
            {
                continue;
            }

            let src = source_dir.join(&relative);
            let dst = self.config.output_dir.join(&relative);
            let stat = match self.storage.stat(&src) {
                Ok(stat) => stat,
                Err(err) if err.is_not_found() && relative == Path::new(&self.config.static_dir) => {
                    tracing::info!(path = %src.display(), "Static directory not found");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            if stat.is_dir {
                tracing::debug!(path = %dst.display(), "Creating directory");
                self.storage.create_dir_all(&dst)?;
                queue.extend(
                    self.storage
                        .read_dir(&src)?
                        .into_iter()
                        .map(|name| relative.join(name)),
                );
            } else if src.extension().is_some_and(|ext| ext == TEMPLATE_EXTENSION) {
                let dst = template_output(&dst);
                tracing::debug!(src = %src.display(), dst = %dst.display(), "Rendering template");
                let source = self.storage.read_to_string(&src)?;
                let html = ctx.templates.render_file(
                    &ctx.site,
                    &relative.to_string_lossy(),
                    &source,
                )?;
                self.write(&dst, &html)?;
                ctx.report.pages += 1;
            } else {
                tracing::debug!(src = %src.display(), dst = %dst.display(), "Copying");
                self.storage.copy(&src, &dst)?;
                ctx.report.copied += 1;
            }
        }
        Ok(())
    }
}

/// `index.tmpl` → `index.html`, `feed.xml.tmpl` → `feed.xml`.
fn template_output(path: &Path) -> PathBuf {
    let stripped = path.with_extension("");
    if stripped.extension().is_some() {
        stripped
    } else {
        stripped.with_extension("html")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;
    use quill_storage::MockStorage;

    use super::*;

    const SITE_META: &str = r#"
title: Test blog
root: http://www.example.com
pathformat: "/{{ date_path }}/{{ slug }}"
dateformat: "2006-01-02"
tagsformat: "/tags/{{ tag }}"
recentcount: 5
"#;

    const POST_1_META: &str = "
date: 2012-09-07
slug: hello-world
title: Hello World!
tags:
  - hello
  - world
";

    const POST_1_MD: &str = r#"
This is a fake post, for testing.

This is markdown
----------------
This is just {{ textcontent("<a href='foo'>text content</a>") }} sans HTML."#;

    const POST_2_META: &str = "
date: 2012-09-09
slug: hello-again
title: Hello Again!
tags:
  - hello
scripts:
  - foo.js
  - /bar.js
styles:
  - foo.css
";

    const POST_2_MD: &str = r#"
This is a <a href="{{ link("01-test") }}">link</a> to a post.
<img src="{{ link("01-test/img.png") }}" />

<!--BREAK-->

This is content after the break"#;

    const ROOT_TMPL: &str = r"
<!DOCTYPE html>
<html>
  <head>
    {% block head %}<title>{{ site.title }}</title>{% endblock %}
  </head>
  <body>
    {% block body %}{% endblock %}
  </body>
</html>";

    const POST_TMPL: &str = r#"
{% block head %}
  <title>{{ site.title }} - {{ post.title }}</title>
  <link rel="canonical" href="{{ post.permalink }}" />
  {% for style in post.styles %}
    <link rel="stylesheet" href="{{ style }}" />
  {% endfor %}
{% endblock %}
{% block body %}
  <h1>{{ post.title }}</h1>
  <div>{{ post.body }}</div>
  {% if post.next %}<a href="{{ post.next.path }}">Next Post</a>{% endif %}
  {% if post.prev %}<a href="{{ post.prev.path }}">Prev Post</a>{% endif %}
  {% for script in post.scripts %}
    <script src="{{ script }}"></script>
  {% endfor %}
{% endblock %}"#;

    const TAGS_TMPL: &str = r#"
{% block body %}
  <h1>Posts tagged with {{ tag }}</h1>
  {% for p in posts %}
    <h2>{{ p.title }}</h2>
    <div>Updated on {{ p.date | timeformat("2006-01-02T15:04:05Z07:00") }}</div>
    <div>{{ p.snippet }}</div>
  {% endfor %}
{% endblock %}"#;

    const INDEX_TMPL: &str = r"
{% block body %}
  <h1>{{ site.title }}</h1>
  {% for p in site.recent_posts %}
    <h2>{{ p.title }}</h2>
    <div>{{ p.body }}</div>
  {% endfor %}
{% endblock %}";

    const POST_1_HTML: &str = r#"
<!DOCTYPE html>
<html>
  <head>
    <title>Test blog - Hello World!</title>
    <link rel="canonical" href="http://www.example.com/2012-09-07/hello-world" />
  </head>
  <body>
    <h1>Hello World!</h1>
    <div>
      <p>This is a fake post, for testing.</p>
      <h2>This is markdown</h2>
      <p>This is just text content sans HTML.</p>
    </div>
    <a href="/2012-09-09/hello-again">Next Post</a>
  </body>
</html>"#;

    const POST_2_HTML: &str = r#"
<!DOCTYPE html>
<html>
  <head>
    <title>Test blog - Hello Again!</title>
    <link rel="canonical" href="http://www.example.com/2012-09-09/hello-again" />
    <link rel="stylesheet" href="/2012-09-09/hello-again/foo.css" />
  </head>
  <body>
    <h1>Hello Again!</h1>
    <div>
      <p>
        This is a <a href="/2012-09-07/hello-world">link</a> to a post.
        <img src="/2012-09-07/hello-world/img.png" />
      </p>
      <!--BREAK-->
      <p>This is content after the break</p>
    </div>
    <a href="/2012-09-07/hello-world">Prev Post</a>
    <script src="/2012-09-09/hello-again/foo.js"></script>
    <script src="/bar.js"></script>
  </body>
</html>"#;

    const TAG_HELLO_HTML: &str = r#"
<!DOCTYPE html>
<html>
  <head>
    <title>Test blog</title>
  </head>
  <body>
    <h1>Posts tagged with hello</h1>
    <h2>Hello Again!</h2>
    <div>Updated on 2012-09-09T00:00:00Z</div>
    <div>
      <p>
        This is a <a href="/2012-09-07/hello-world">link</a> to a post.
        <img src="/2012-09-07/hello-world/img.png" />
      </p>
    </div>
    <h2>Hello World!</h2>
    <div>Updated on 2012-09-07T00:00:00Z</div>
    <div>
    </div>
  </body>
</html>"#;

    const TAG_WORLD_HTML: &str = r"
<!DOCTYPE html>
<html>
  <head>
    <title>Test blog</title>
  </head>
  <body>
    <h1>Posts tagged with world</h1>
    <h2>Hello World!</h2>
    <div>Updated on 2012-09-07T00:00:00Z</div>
    <div>
    </div>
  </body>
</html>";

    const INDEX_HTML: &str = r#"
<!DOCTYPE html>
<html>
  <head>
    <title>Test blog</title>
  </head>
  <body>
    <h1>Test blog</h1>
    <h2>Hello Again!</h2>
    <div>
      <p>
       This is a <a href="/2012-09-07/hello-world">link</a> to a post.
       <img src="/2012-09-07/hello-world/img.png" />
      </p>
      <!--BREAK-->
      <p>This is content after the break</p>
    </div>
    <h2>Hello World!</h2>
    <div>
      <p>This is a fake post, for testing.</p>
      <h2>This is markdown</h2>
      <p>This is just text content sans HTML.</p>
    </div>
  </body>
</html>"#;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image::RgbImage::new(width, height)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    fn config() -> BuildConfig {
        BuildConfig {
            source_dir: PathBuf::from("src"),
            output_dir: PathBuf::from("build"),
            ..BuildConfig::default()
        }
    }

    fn base_storage() -> MockStorage {
        MockStorage::new()
            .with_file("src/config.yaml", SITE_META)
            .with_file("src/templates/root.tmpl", ROOT_TMPL)
            .with_file("src/templates/post.tmpl", POST_TMPL)
    }

    fn two_posts() -> MockStorage {
        base_storage()
            .with_file("src/templates/tags.tmpl", TAGS_TMPL)
            .with_file("src/posts/01-test/body.md", POST_1_MD)
            .with_file("src/posts/01-test/meta.yaml", POST_1_META)
            .with_file("src/posts/01-test/img.png", "")
            .with_file("src/posts/02-test/body.md", POST_2_MD)
            .with_file("src/posts/02-test/meta.yaml", POST_2_META)
            .with_file("src/index.tmpl", INDEX_TMPL)
    }

    fn process(storage: &Arc<MockStorage>) -> Result<BuildReport, BuildError> {
        let storage: Arc<dyn Storage> = Arc::clone(storage) as Arc<dyn Storage>;
        Builder::new(config(), storage).process()
    }

    fn loose(s: &str) -> String {
        s.chars().filter(|c| *c != ' ' && *c != '\n').collect()
    }

    #[track_caller]
    fn assert_loose(storage: &MockStorage, path: &str, expected: &str) {
        let actual = storage
            .file_contents(path)
            .unwrap_or_else(|| panic!("{path} was not written"));
        assert_eq!(loose(&actual), loose(expected), "{path}");
    }

    #[test]
    fn test_renders_posts_tags_and_index() {
        let storage = Arc::new(two_posts());

        let report = process(&storage).unwrap();

        assert_loose(&storage, "build/2012-09-07/hello-world/index.html", POST_1_HTML);
        assert_loose(&storage, "build/2012-09-09/hello-again/index.html", POST_2_HTML);
        assert_loose(&storage, "build/tags/hello/index.html", TAG_HELLO_HTML);
        assert_loose(&storage, "build/tags/world/index.html", TAG_WORLD_HTML);
        assert_loose(&storage, "build/index.html", INDEX_HTML);
        assert_eq!(
            report,
            BuildReport {
                posts: 2,
                skipped: 0,
                tags: 2,
                pages: 1,
                copied: 2,
            }
        );
    }

    #[test]
    fn test_post_resources_are_copied() {
        let storage = Arc::new(
            two_posts()
                .with_file("src/posts/01-test/notes.md", "draft")
                .with_file("src/posts/01-test/files/data.csv", "a,b"),
        );

        process(&storage).unwrap();

        assert_eq!(
            storage.file_contents("build/2012-09-07/hello-world/files/data.csv"),
            Some("a,b".to_owned())
        );
        assert!(storage.file_contents("build/2012-09-07/hello-world/img.png").is_some());
        assert!(storage.file_contents("build/2012-09-07/hello-world/notes.md").is_none());
        assert!(storage.file_contents("build/2012-09-07/hello-world/meta.yaml").is_none());
    }

    #[test]
    fn test_post_without_body_has_empty_content() {
        let storage = Arc::new(
            base_storage().with_file("src/posts/01-test/meta.yaml", POST_1_META),
        );

        process(&storage).unwrap();

        assert_loose(
            &storage,
            "build/2012-09-07/hello-world/index.html",
            r#"<!DOCTYPE html><html><head>
                <title>Test blog - Hello World!</title>
                <link rel="canonical" href="http://www.example.com/2012-09-07/hello-world" />
              </head><body><h1>Hello World!</h1><div></div></body></html>"#,
        );
    }

    #[test]
    fn test_invalid_post_does_not_block_siblings() {
        let storage = Arc::new(
            two_posts()
                .with_file("src/posts/00-empty/meta.yaml", "")
                .with_file("src/posts/03-no-slug/meta.yaml", "title: T\ndate: 2012-01-01\n"),
        );

        let report = process(&storage).unwrap();

        assert_eq!(report.posts, 2);
        assert_eq!(report.skipped, 2);
        assert!(storage.file_contents("build/2012-09-09/hello-again/index.html").is_some());
    }

    #[test]
    fn test_pages_outside_output_dir_are_skipped() {
        let storage = Arc::new(
            base_storage()
                .with_file("src/templates/tags.tmpl", TAGS_TMPL)
                .with_file(
                    "src/posts/01-test/meta.yaml",
                    "date: 2012-09-07\nslug: hello\ntitle: Hello\ntags: ['../../../escaped', ok]\n",
                )
                .with_file(
                    "src/posts/02-test/meta.yaml",
                    "date: 2012-09-09\nslug: ../../../../up\ntitle: Up\n",
                ),
        );

        let report = process(&storage).unwrap();

        assert_eq!(report.posts, 1);
        assert_eq!(report.tags, 1);
        assert!(storage.file_contents("build/2012-09-07/hello/index.html").is_some());
        assert!(storage.file_contents("build/tags/ok/index.html").is_some());
        assert!(storage.file_contents("escaped/index.html").is_none());
        assert!(storage.file_contents("up/index.html").is_none());
        assert!(
            storage
                .files_under("")
                .keys()
                .all(|path| path.starts_with("build") || path.starts_with("src"))
        );
    }

    #[test]
    fn test_processing_twice_is_byte_identical() {
        let storage = Arc::new(two_posts().with_file("src/static/site.css", "body {}"));

        process(&storage).unwrap();
        let first = storage.files_under("build");
        process(&storage).unwrap();
        let second = storage.files_under("build");

        assert_eq!(first, second);
    }

    #[test]
    fn test_misc_files_and_templates() {
        let storage = Arc::new(
            base_storage()
                .with_file("src/static/css/site.css", "body {}")
                .with_file("src/feed.xml.tmpl", "<feed>{{ site.title }}</feed>")
                .with_file("src/robots.txt", "User-agent: *"),
        );

        let report = process(&storage).unwrap();

        assert_eq!(
            storage.file_contents("build/static/css/site.css"),
            Some("body {}".to_owned())
        );
        assert_eq!(
            storage.file_contents("build/robots.txt"),
            Some("User-agent: *".to_owned())
        );
        assert!(storage.file_contents("build/templates/root.tmpl").is_none());
        // feed.xml.tmpl is merged onto root.tmpl, which renders its own skeleton.
        assert!(storage.file_contents("build/feed.xml").is_some());
        assert_eq!(report.pages, 1);
    }

    #[test]
    fn test_standalone_template_with_extends_renders_alone() {
        let storage = Arc::new(base_storage().with_file(
            "src/about.tmpl",
            r#"{% extends "root.tmpl" %}{% block body %}About {{ site.title }}{% endblock %}"#,
        ));

        process(&storage).unwrap();

        let about = storage.file_contents("build/about.html").unwrap();
        assert!(about.contains("About Test blog"));
        assert!(about.contains("<title>Test blog</title>"));
    }

    #[test]
    fn test_missing_site_config_is_fatal() {
        let storage = Arc::new(MockStorage::new().with_dir("src"));

        let err = process(&storage).unwrap_err();

        assert!(matches!(
            err,
            BuildError::Site(quill_site::SiteError::MissingConfig { .. })
        ));
    }

    #[test]
    fn test_missing_post_template_is_fatal() {
        let storage = Arc::new(
            MockStorage::new()
                .with_file("src/config.yaml", SITE_META)
                .with_file("src/templates/root.tmpl", ROOT_TMPL),
        );

        let err = process(&storage).unwrap_err();

        assert!(matches!(
            err,
            BuildError::Render(quill_render::RenderError::MissingPostTemplate(_))
        ));
    }

    #[test]
    fn test_missing_templates_dir_writes_empty_pages() {
        let storage = Arc::new(
            MockStorage::new()
                .with_file("src/config.yaml", SITE_META)
                .with_file("src/posts/01-test/meta.yaml", POST_1_META),
        );

        let report = process(&storage).unwrap();

        assert_eq!(
            storage.file_contents("build/2012-09-07/hello-world/index.html"),
            Some(String::new())
        );
        assert_eq!(report.tags, 0);
    }

    #[test]
    fn test_imagemeta_and_post_images() {
        let meta = "
date: 2017-09-17
slug: postimages
title: Post Images
images:
  image01:
    src: image01.png
    metadata:
      href: http://example.com/foo
      alt: Test alt
  image02:
    src: image02.png
    variants:
      thumb:
        src: image02_thumb.png
    metadata:
      alt: Alt2
";
        let macro_tmpl = r#"{% macro render(img) -%}
{%- set src = img.variants.thumb or img -%}
{%- if img.metadata.href %}<a href="{{ img.metadata.href }}">{% endif -%}
<img src="{{ src.path }}" width="{{ src.width }}" height="{{ src.height }}" alt="{{ img.metadata.alt }}"/>
{%- if img.metadata.href %}</a>{% endif -%}
{%- endmacro %}"#;
        let body = r#"{% import "renderimage.tmpl" as r %}
Probed {{ imagemeta("image01.png").width }}x{{ imagemeta("image01.png").height }}.

{{ r.render(image("image01")) }}

{{ r.render(image("image02")) }}
"#;
        let storage = Arc::new(
            base_storage()
                .with_file("src/templates/renderimage.tmpl", macro_tmpl)
                .with_file("src/posts/01-test/meta.yaml", meta)
                .with_file("src/posts/01-test/body.md", body)
                .with_file("src/posts/01-test/image01.png", png(250, 340))
                .with_file("src/posts/01-test/image02.png", png(500, 680))
                .with_file("src/posts/01-test/image02_thumb.png", png(250, 340)),
        );

        process(&storage).unwrap();

        let html = storage
            .file_contents("build/2017-09-17/postimages/index.html")
            .unwrap();
        assert!(html.contains("Probed 250x340."));
        assert!(html.contains(
            r#"<a href="http://example.com/foo"><img src="/2017-09-17/postimages/image01.png" width="250" height="340" alt="Test alt"/></a>"#
        ));
        assert!(html.contains(
            r#"<img src="/2017-09-17/postimages/image02_thumb.png" width="250" height="340" alt="Alt2"/>"#
        ));
    }

    #[test]
    fn test_yamltemplate_in_body() {
        let meta = "date: 2017-03-19\nslug: yamltemplate\ntitle: Yamltemplate\n";
        let body = r#"{% macro testdata() -%}
gallery:
  - image: {{ imagemeta("image01.png") | tojson }}
    description: Image One
{%- endmacro %}
{% for entry in yamltemplate("testdata").gallery %}
Description: {{ entry.description }} at {{ entry.image.path }}
{% endfor %}"#;
        let storage = Arc::new(
            base_storage()
                .with_file("src/posts/01-test/meta.yaml", meta)
                .with_file("src/posts/01-test/body.md", body)
                .with_file("src/posts/01-test/image01.png", png(10, 10)),
        );

        process(&storage).unwrap();

        let html = storage
            .file_contents("build/2017-03-19/yamltemplate/index.html")
            .unwrap();
        assert!(html.contains("Description: Image One at /2017-03-19/yamltemplate/image01.png"));
    }

    #[test]
    fn test_template_output_names() {
        assert_eq!(template_output(Path::new("b/index.tmpl")), Path::new("b/index.html"));
        assert_eq!(template_output(Path::new("b/feed.xml.tmpl")), Path::new("b/feed.xml"));
    }
}
