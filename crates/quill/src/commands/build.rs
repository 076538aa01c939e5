//! `quill build` command implementation.

use clap::Args;
use quill_build::Builder;

use super::{ConfigArgs, print_dirs, storage};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

impl BuildArgs {
    /// Build the site once.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.config.load()?;
        print_dirs(&output, &config);

        let report = Builder::new(config.build_resolved, storage()).process()?;

        output.success(&format!(
            "Built {} posts, {} tag pages, {} pages ({} files copied)",
            report.posts, report.tags, report.pages, report.copied
        ));
        if report.skipped > 0 {
            output.info(&format!(
                "Skipped {} invalid posts (run with --verbose for details)",
                report.skipped
            ));
        }
        Ok(())
    }
}
