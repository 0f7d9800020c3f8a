use std::net::SocketAddr;

use welcome_gate::config::{Config, ConfigError};
use welcome_gate::services::session;
use welcome_gate::{routes, state};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server failed: {0}")]
    Serve(#[source] std::io::Error),
}

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!(error = %e, ".env file could not be loaded");
        }
    }

    if let Err(e) = run().await {
        tracing::error!(error = %e, "welcome-gate failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = Config::from_env()?;

    match &config.session_save_path {
        Some(path) => tracing::info!(save_path = %path.display(), "reading sessions from PHP save path"),
        None => tracing::warn!("SESSION_SAVE_PATH not set; no session will be recognized as logged in"),
    }

    let addr = config.bind_addr();
    let sessions = session::store_from_config(&config);
    let app = routes::app(state::AppState::new(config, sessions));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;

    tracing::info!(%addr, "welcome-gate listening");
    axum::serve(listener, app).await.map_err(StartupError::Serve)
}
