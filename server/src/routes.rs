//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The gateway serves the built front end from a directory. Unknown paths
//! fall back to `index.html` so client-side routes load the app shell. The
//! route guard wraps everything, including the health check, which it skips
//! because no protected prefix matches it.

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::get;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::guard::{RouteGuard, route_guard};

pub fn app(config: &GatewayConfig) -> Router {
    let guard = RouteGuard::new(config.protected_prefixes.clone());
    let ui = ServeDir::new(&config.ui_dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(config.ui_dir.join("index.html")));

    Router::new()
        .route("/healthz", get(healthz))
        .fallback_service(ui)
        .layer(middleware::from_fn_with_state(guard, route_guard))
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
