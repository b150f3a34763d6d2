//! Server bootstrap: store selection, services, HTTP listener.
//!
//! With the `postgres` feature the daemon serves from PostgreSQL through the
//! connection registry; without it, from the in-memory store (development
//! and test runs only).

use crate::api::{create_router, ApiState};
use crate::config::Config;
use anyhow::Context;
use merx_store::{Paginator, Store};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Run the daemon until the server exits.
#[cfg(feature = "postgres")]
pub async fn run(config: Config) -> anyhow::Result<()> {
    use merx_store::{PgStore, PoolRegistry, QueryCatalog};

    let url = config
        .database
        .url
        .as_deref()
        .context("DATABASE_URL is required")?;

    let registry = PoolRegistry::connect("primary", url, config.database.max_connections).await?;

    let store = Arc::new(PgStore::new(
        registry.primary(),
        QueryCatalog::embedded(),
        Paginator::new(config.pagination.clone()),
    ));

    serve(store, &config).await
}

/// Run the daemon over the in-memory store.
#[cfg(not(feature = "postgres"))]
pub async fn run(config: Config) -> anyhow::Result<()> {
    use merx_store::MemoryStore;

    tracing::warn!("postgres feature disabled; serving from the in-memory store");

    let store = Arc::new(MemoryStore::new());
    serve(store, &config).await
}

async fn serve<S: Store + 'static>(store: Arc<S>, config: &Config) -> anyhow::Result<()> {
    let paginator = Paginator::new(config.pagination.clone());
    let state = Arc::new(ApiState::new(store, paginator));
    let app = create_router(state).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.api.host, config.api.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(addr = %listener.local_addr()?, environment = %config.environment, "merxd listening");

    axum::serve(listener, app).await?;
    Ok(())
}
