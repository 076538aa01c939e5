//! Development server for Quill.
//!
//! Serves the build output directory over HTTP while `quill serve` keeps it
//! current. There is no live reload; refresh the browser after a rebuild.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use quill_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         host: "127.0.0.1".to_owned(),
//!         port: 8080,
//!         output_dir: PathBuf::from("dst"),
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```

mod app;
mod error;
mod headers;

use std::net::SocketAddr;
use std::path::PathBuf;

pub use error::ServerError;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Directory to serve.
    pub output_dir: PathBuf,
}

impl ServerConfig {
    /// Server settings of a loaded Quill configuration.
    #[must_use]
    pub fn from_config(config: &quill_config::Config) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            output_dir: config.build_resolved.output_dir.clone(),
        }
    }

    /// Socket address from host and port.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidAddress`] if the host is not an IP
    /// address.
    pub fn addr(&self) -> Result<SocketAddr, ServerError> {
        let address = format!("{}:{}", self.host, self.port);
        address
            .parse()
            .map_err(|source| ServerError::InvalidAddress { address, source })
    }
}

/// Serve the output directory until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address is invalid, cannot be bound, or the
/// server fails while running.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let addr = config.addr()?;
    let app = app::create_router(&config.output_dir);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    tracing::info!(address = %addr, dir = %config.output_dir.display(), "Starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)
}

/// Wait for Ctrl-C.
async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "Could not listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
