//! Front-end gateway: serves the built UI behind the route guard.

mod config;
mod guard;
mod routes;

use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to bind port {port}: {source}")]
    Bind { port: u16, source: std::io::Error },

    #[error("server failed: {0}")]
    Serve(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = config::GatewayConfig::from_env()?;
    if !config.ui_dir.join("index.html").is_file() {
        tracing::warn!(ui_dir = %config.ui_dir.display(), "no index.html in UI directory");
    }

    let app = routes::app(&config);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .map_err(|source| ServerError::Bind { port: config.port, source })?;

    tracing::info!(
        port = config.port,
        protected = ?config.protected_prefixes,
        "insight gateway listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
