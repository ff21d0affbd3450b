//! Math service HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # SQLite file in the working directory (default)
//! cargo run --bin math-server
//!
//! # In-memory store
//! REPOSITORY_TYPE=local cargo run --bin math-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 5000)
//! - `HISTORY_LIMIT`: Records returned by `/history` (default: 50)
//! - `MAX_BODY_BYTES`: Request body limit (default: 65536)
//! - `REPOSITORY_TYPE`: `sqlite` or `local`
//! - `DATABASE_URL`: SQLite file path (default: math_calculations.db)
//! - `RUST_LOG`: Log filter (default: info)
//!
//! A `repository.toml` in the working directory or `backend/` takes
//! precedence over the repository variables.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use math_service::config::ServerConfig;
use math_service::db::RepositoryFactory;
use math_service::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting math service");

    let config = ServerConfig::from_env().context("Invalid server configuration")?;

    let repository = RepositoryFactory::from_default_config()
        .await
        .context("Failed to initialize repository")?;
    info!("Repository initialized successfully");

    let state = AppState::from_config(repository, &config);
    let app = create_router(state);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/api/v1/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
