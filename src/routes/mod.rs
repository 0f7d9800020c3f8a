//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The welcome page is mounted at its historical `.php` path and at a clean
//! path. Login and logout belong to other services; when `STATIC_DIR` is
//! set, any unmatched path (the stylesheet, for one) is served from disk.

pub mod welcome;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    let router = Router::new()
        .route("/welcome.php", get(welcome::welcome))
        .route("/welcome", get(welcome::welcome))
        .route("/healthz", get(healthz))
        .with_state(state);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
