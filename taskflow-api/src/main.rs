//! # TaskFlow API Server
//!
//! Multi-tenant project and task management backend.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/taskflow JWT_SECRET=$(openssl rand -hex 32) \
//!     cargo run -p taskflow-api
//! ```

use std::sync::Arc;

use taskflow_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskflow_shared::auth::jwt::{TokenConfig, TokenService};
use taskflow_shared::auth::password::PasswordService;
use taskflow_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
use taskflow_shared::store::PgStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskflow_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "TaskFlow API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    tracing::info!(production = config.production(), "Configuration loaded");

    let pool = create_pool(DatabaseConfig {
        max_connections: config.database.max_connections,
        ..DatabaseConfig::from_url(config.database.url.clone())
    })
    .await?;

    let tokens = TokenService::new(TokenConfig::new(config.jwt.secret.clone()))?;
    let bind_address = config.bind_address();

    let state = AppState::new(
        Arc::new(PgStore::new(pool.clone())),
        tokens,
        PasswordService::default(),
        config,
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
