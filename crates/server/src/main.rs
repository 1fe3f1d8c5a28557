use std::sync::Arc;

use frontrow::{
    AppState,
    config::{Backend, Config},
    memory::MemoryStore,
    postgres::PgStore,
    store::Store,
};

// ===== Main =====

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::load()?;

    let store: Arc<dyn Store> = match &config.backend {
        Backend::Postgres { database_url } => {
            let store =
                PgStore::connect(database_url, config.max_connections, config.store_timeout).await?;
            store.apply_schema().await?;
            Arc::new(store)
        }
        Backend::Memory => {
            tracing::warn!("Using the in-memory store, nothing will survive a restart");
            Arc::new(MemoryStore::new())
        }
    };
    tracing::info!("Store ready ({})", store.backend_tag());

    let app = frontrow::app(AppState::new(store, config.store_timeout));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server running on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
