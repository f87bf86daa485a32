use dotenv::dotenv;
use quote_service::config::Config;
use quote_service::db::QuoteStore;
use quote_service::error::Result;
use quote_service::{router, AppState};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv().ok();

    let config = Config::from_env()?;

    let store = QuoteStore::open(&config.sqlite_path, config.max_connections, config.store_timeout).await?;
    info!("Using database at {}", config.sqlite_path);
    info!(
        "Fetch budget: {:?}, store budget: {:?}",
        config.fetch_timeout, config.store_timeout
    );

    let state = Arc::new(AppState::new(&config, store.clone()));
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    info!("Starting quote service on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Quote service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
