//! USD/BRL quote service: fetch the upstream quote, append its bid to SQLite and
//! answer the caller, each stage under its own deadline.

pub mod api;
pub mod config;
pub mod db;
pub mod deadline;
pub mod error;
pub mod handlers;
pub mod models;

use crate::api::QuoteFetcher;
use crate::config::Config;
use crate::db::QuoteStore;
use crate::deadline::Deadline;
use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

// App state
pub struct AppState {
    pub fetcher: QuoteFetcher,
    pub store: QuoteStore,
    pub request_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(config: &Config, store: QuoteStore) -> Self {
        Self {
            fetcher: QuoteFetcher::new(config),
            store,
            request_timeout: config.request_timeout,
        }
    }

    pub fn request_deadline(&self) -> Deadline {
        match self.request_timeout {
            Some(budget) => Deadline::after(budget),
            None => Deadline::unbounded(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/cotacao", get(handlers::get_quote))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}
