//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod new;
pub(crate) mod serve;
pub(crate) mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use quill_config::{CliSettings, Config};
use quill_storage::{FsStorage, Storage};

pub(crate) use build::BuildArgs;
pub(crate) use new::NewArgs;
pub(crate) use serve::ServeArgs;
pub(crate) use watch::WatchArgs;

use crate::error::CliError;
use crate::output::Output;

/// Options shared by every command that reads `quill.toml`.
#[derive(Args)]
pub(crate) struct ConfigArgs {
    /// Path to configuration file (default: auto-discover quill.toml).
    #[arg(short, long, env = "QUILL_CONFIG")]
    config: Option<PathBuf>,

    /// Site source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Build output directory (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Command to run before each build (overrides config).
    #[arg(long)]
    before: Option<String>,

    /// Enable verbose output (per-stage logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ConfigArgs {
    pub(crate) fn settings(&self) -> CliSettings {
        CliSettings {
            source_dir: self.source_dir.clone(),
            output_dir: self.output_dir.clone(),
            before: self.before.clone(),
            ..CliSettings::default()
        }
    }

    /// Load the configuration with command-line overrides applied.
    pub(crate) fn load(&self) -> Result<Config, CliError> {
        self.load_with(&self.settings())
    }

    pub(crate) fn load_with(&self, settings: &CliSettings) -> Result<Config, CliError> {
        Ok(Config::load(self.config.as_deref(), Some(settings))?)
    }
}

/// Storage rooted at the working directory. Configured paths are absolute
/// once resolved, so the root only matters for relative overrides.
fn storage() -> Arc<dyn Storage> {
    Arc::new(FsStorage::new(PathBuf::from(".")))
}

fn print_dirs(output: &Output, config: &Config) {
    output.info(&format!(
        "Source directory: {}",
        config.build_resolved.source_dir.display()
    ));
    output.info(&format!(
        "Output directory: {}",
        config.build_resolved.output_dir.display()
    ));
}
