//! `quill serve` command implementation.

use clap::Args;
use quill_build::{Builder, WatchOptions, watch_loop};
use quill_config::CliSettings;
use quill_server::{ServerConfig, run_server};
use tokio::sync::oneshot;

use super::{ConfigArgs, print_dirs, storage};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,
}

impl ServeArgs {
    /// Serve the output directory while rebuilding it on change.
    ///
    /// Stops on Ctrl-C, on a failed build, or when the watcher fails.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let settings = CliSettings {
            host: self.host,
            port: self.port,
            ..self.config.settings()
        };
        let config = self.config.load_with(&settings)?;
        let options = WatchOptions::from_config(&config.watch)?;

        output.info(&format!(
            "Starting server on http://{}:{}",
            config.server.host, config.server.port
        ));
        print_dirs(&output, &config);

        let server = ServerConfig::from_config(&config);
        let builder = Builder::new(config.build_resolved, storage());

        // The watch loop blocks, so it gets its own thread. The thread is
        // left behind when the server stops.
        let (tx, rx) = oneshot::channel();
        std::thread::spawn(move || {
            let _ = tx.send(watch_loop(&builder, options));
        });

        tokio::select! {
            result = run_server(server) => result?,
            watched = rx => {
                if let Ok(result) = watched {
                    result?;
                }
            }
        }
        Ok(())
    }
}
