//! Configuration management for Quill.
//!
//! Parses `quill.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. Every section is
//! optional; a project without `quill.toml` builds `src/` into `dst/`.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `build.before`

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override site source directory.
    pub source_dir: Option<PathBuf>,
    /// Override build output directory.
    pub output_dir: Option<PathBuf>,
    /// Override the pre-build hook command.
    pub before: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quill.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Development server configuration.
    pub server: ServerConfig,
    /// Build configuration (paths are relative strings from TOML).
    build: BuildConfigRaw,
    /// Watch mode configuration.
    pub watch: WatchConfig,

    /// Resolved build configuration (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Development server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

/// Raw build configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BuildConfigRaw {
    source_dir: Option<String>,
    output_dir: Option<String>,
    posts_dir: Option<String>,
    templates_dir: Option<String>,
    static_dir: Option<String>,
    site_config: Option<String>,
    post_template: Option<String>,
    tags_template: Option<String>,
    root_template: Option<String>,
    before: Option<String>,
}

/// Resolved build configuration.
///
/// `source_dir` and `output_dir` are resolved against the config file
/// directory. The remaining names are relative to `source_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Site source tree.
    pub source_dir: PathBuf,
    /// Build output directory.
    pub output_dir: PathBuf,
    /// Directory of post subdirectories.
    pub posts_dir: String,
    /// Directory of `.tmpl` templates.
    pub templates_dir: String,
    /// Conventional static directory.
    pub static_dir: String,
    /// Site metadata file.
    pub site_config: String,
    /// File name of the per-post template.
    pub post_template: String,
    /// File name of the per-tag template.
    pub tags_template: String,
    /// File name of the preferred base template.
    pub root_template: String,
    /// Command run before each build.
    pub before: Option<String>,
}

impl BuildConfig {
    /// Build configuration with default names rooted at `base`.
    #[must_use]
    pub fn with_base(base: &Path) -> Self {
        Self {
            source_dir: base.join("src"),
            output_dir: base.join("dst"),
            posts_dir: "posts".to_owned(),
            templates_dir: "templates".to_owned(),
            static_dir: "static".to_owned(),
            site_config: "config.yaml".to_owned(),
            post_template: "post.tmpl".to_owned(),
            tags_template: "tags.tmpl".to_owned(),
            root_template: "root.tmpl".to_owned(),
            before: None,
        }
    }

    /// Path of the site metadata file.
    #[must_use]
    pub fn site_config_path(&self) -> PathBuf {
        self.source_dir.join(&self.site_config)
    }

    /// Path of the posts root.
    #[must_use]
    pub fn posts_path(&self) -> PathBuf {
        self.source_dir.join(&self.posts_dir)
    }

    /// Path of the templates root.
    #[must_use]
    pub fn templates_path(&self) -> PathBuf {
        self.source_dir.join(&self.templates_dir)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::with_base(Path::new("."))
    }
}

/// Watch mode configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet period after the last change before rebuilding.
    pub debounce_ms: u64,
    /// Attempts to register directory watches before giving up.
    pub max_retries: u32,
    /// Delay between registration attempts.
    pub retry_delay_ms: u64,
    /// Glob patterns (matched against file names) whose changes are ignored.
    pub ignore: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            max_retries: 10,
            retry_delay_ms: 100,
            ignore: Vec::new(),
        }
    }
}

impl WatchConfig {
    /// Debounce window as a [`Duration`].
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Registration retry delay as a [`Duration`].
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Compiled ignore patterns.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` for an invalid glob.
    pub fn ignore_patterns(&self) -> Result<Vec<glob::Pattern>, ConfigError> {
        self.ignore
            .iter()
            .map(|p| {
                glob::Pattern::new(p).map_err(|e| {
                    ConfigError::Validation(format!("watch.ignore pattern {p:?}: {e}"))
                })
            })
            .collect()
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`build.before`").
        field: String,
        /// Error message (e.g., "${`HOOK`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a name to be a single path component inside the source tree.
fn require_plain_name(value: &str, field: &str) -> Result<(), ConfigError> {
    require_non_empty(value, field)?;
    if value.contains(['/', '\\']) || value == "." || value == ".." {
        return Err(ConfigError::Validation(format!(
            "{field} must be a plain name, got {value:?}"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `quill.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(source_dir) = &settings.source_dir {
            self.build_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.build_resolved.output_dir.clone_from(output_dir);
        }
        if let Some(before) = &settings.before {
            self.build_resolved.before = Some(before.clone());
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            build: BuildConfigRaw::default(),
            watch: WatchConfig::default(),
            build_resolved: BuildConfig::with_base(base),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` describing the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_build()?;
        self.validate_watch()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_build(&self) -> Result<(), ConfigError> {
        let build = &self.build_resolved;
        require_plain_name(&build.posts_dir, "build.posts_dir")?;
        require_plain_name(&build.templates_dir, "build.templates_dir")?;
        require_plain_name(&build.static_dir, "build.static_dir")?;
        require_non_empty(&build.site_config, "build.site_config")?;
        require_plain_name(&build.post_template, "build.post_template")?;
        require_plain_name(&build.tags_template, "build.tags_template")?;
        require_plain_name(&build.root_template, "build.root_template")?;

        if build.post_template == build.tags_template {
            return Err(ConfigError::Validation(
                "build.post_template and build.tags_template must differ".to_owned(),
            ));
        }
        if build.source_dir == build.output_dir {
            return Err(ConfigError::Validation(
                "build.output_dir cannot be the same as build.source_dir".to_owned(),
            ));
        }
        if let Some(before) = &build.before {
            require_non_empty(before.trim(), "build.before")?;
        }
        Ok(())
    }

    fn validate_watch(&self) -> Result<(), ConfigError> {
        if self.watch.debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "watch.debounce_ms must be greater than 0".to_owned(),
            ));
        }
        if self.watch.max_retries == 0 {
            return Err(ConfigError::Validation(
                "watch.max_retries must be greater than 0".to_owned(),
            ));
        }
        self.watch.ignore_patterns()?;
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(before) = &self.build.before {
            self.build.before = Some(expand::expand_env(before, "build.before")?);
        }

        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let defaults = BuildConfig::with_base(config_dir);
        let raw = &self.build;
        let name = |value: &Option<String>, default: &str| {
            value.clone().unwrap_or_else(|| default.to_owned())
        };

        self.build_resolved = BuildConfig {
            source_dir: raw
                .source_dir
                .as_ref()
                .map_or(defaults.source_dir.clone(), |d| config_dir.join(d)),
            output_dir: raw
                .output_dir
                .as_ref()
                .map_or(defaults.output_dir.clone(), |d| config_dir.join(d)),
            posts_dir: name(&raw.posts_dir, &defaults.posts_dir),
            templates_dir: name(&raw.templates_dir, &defaults.templates_dir),
            static_dir: name(&raw.static_dir, &defaults.static_dir),
            site_config: name(&raw.site_config, &defaults.site_config),
            post_template: name(&raw.post_template, &defaults.post_template),
            tags_template: name(&raw.tags_template, &defaults.tags_template),
            root_template: name(&raw.root_template, &defaults.root_template),
            before: raw.before.clone(),
        };
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.build_resolved.source_dir, PathBuf::from("/test/src"));
        assert_eq!(config.build_resolved.output_dir, PathBuf::from("/test/dst"));
        assert_eq!(
            config.build_resolved.site_config_path(),
            PathBuf::from("/test/src/config.yaml")
        );
        assert_eq!(
            config.build_resolved.posts_path(),
            PathBuf::from("/test/src/posts")
        );
        assert_eq!(config.build_resolved.post_template, "post.tmpl");
        assert_eq!(config.build_resolved.tags_template, "tags.tmpl");
        assert_eq!(config.watch.debounce(), Duration::from_millis(200));
        assert_eq!(config.watch.max_retries, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.watch.retry_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[build]
source_dir = "site"
output_dir = "public"
posts_dir = "articles"
before = "make assets"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        let build = &config.build_resolved;
        assert_eq!(build.source_dir, PathBuf::from("/project/site"));
        assert_eq!(build.output_dir, PathBuf::from("/project/public"));
        assert_eq!(build.posts_path(), PathBuf::from("/project/site/articles"));
        assert_eq!(build.templates_dir, "templates");
        assert_eq!(build.before.as_deref(), Some("make assets"));
    }

    #[test]
    fn test_parse_watch_config() {
        let toml = r#"
[watch]
debounce_ms = 50
ignore = ["*.swp", ".#*"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.watch.debounce_ms, 50);
        let patterns = config.watch.ignore_patterns().unwrap();
        assert!(patterns[0].matches("post.md.swp"));
        assert!(patterns[1].matches(".#body.md"));
    }

    #[test]
    fn test_invalid_ignore_pattern() {
        let toml = r#"
[watch]
ignore = ["[unclosed"]
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("watch.ignore"));
    }

    #[test]
    fn test_validate_rejects_nested_posts_dir() {
        let toml = r#"
[build]
posts_dir = "content/posts"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("build.posts_dir"));
    }

    #[test]
    fn test_validate_rejects_same_templates() {
        let toml = r#"
[build]
post_template = "page.tmpl"
tags_template = "page.tmpl"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_output_equal_to_source() {
        let toml = r#"
[build]
source_dir = "site"
output_dir = "site"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.port = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.port"));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let settings = CliSettings {
            host: Some("0.0.0.0".to_owned()),
            port: Some(9000),
            source_dir: Some(PathBuf::from("/elsewhere/src")),
            output_dir: None,
            before: Some("./prebuild.sh".to_owned()),
        };

        config.apply_cli_settings(&settings);

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.build_resolved.source_dir,
            PathBuf::from("/elsewhere/src")
        );
        assert_eq!(config.build_resolved.output_dir, PathBuf::from("/test/dst"));
        assert_eq!(config.build_resolved.before.as_deref(), Some("./prebuild.sh"));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let result = Config::load(Some(Path::new("/nonexistent/quill.toml")), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quill.toml");
        std::fs::write(
            &path,
            "[server]\nport = 4000\n\n[build]\noutput_dir = \"out\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.build_resolved.output_dir, dir.path().join("out"));
        assert_eq!(config.build_resolved.source_dir, dir.path().join("src"));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_rejects_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quill.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();

        let result = Config::load(Some(&path), None);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
