//! Router construction.

use std::path::Path;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::headers;

/// Serve `output_dir` as a static site. Directory URLs resolve to their
/// `index.html`; a directory URL without a trailing slash redirects.
pub(crate) fn create_router(output_dir: &Path) -> Router {
    let files = ServeDir::new(output_dir).append_index_html_on_directories(true);

    Router::new().fallback_service(files).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(headers::no_cache_layer())
            .layer(headers::content_type_options_layer()),
    )
}
