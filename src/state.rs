//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the configuration, the session store the welcome page reads
//! from, and the pre-rendered page body served to logged-in clients.

use std::sync::Arc;

use axum::body::Bytes;

use crate::config::Config;
use crate::routes::welcome;
use crate::services::session::SessionStore;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<dyn SessionStore>,
    /// Welcome page markup. Identical for every authenticated request.
    pub page: Bytes,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config, sessions: Arc<dyn SessionStore>) -> Self {
        let page = Bytes::from(welcome::render_page(&config.stylesheet_href, &config.logout_href));
        Self { config: Arc::new(config), sessions, page }
    }
}
