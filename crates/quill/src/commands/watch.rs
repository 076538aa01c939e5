//! `quill watch` command implementation.

use clap::Args;
use quill_build::{Builder, WatchOptions, watch_loop};

use super::{ConfigArgs, print_dirs, storage};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the watch command.
#[derive(Args)]
pub(crate) struct WatchArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

impl WatchArgs {
    /// Build, then rebuild on every change until a build fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.config.load()?;
        let options = WatchOptions::from_config(&config.watch)?;
        print_dirs(&output, &config);
        output.highlight("Watching for changes (Ctrl+C to stop)");

        let builder = Builder::new(config.build_resolved, storage());
        watch_loop(&builder, options)?;
        Ok(())
    }
}
