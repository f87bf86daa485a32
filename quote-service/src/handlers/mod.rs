use crate::error::Result;
use crate::models::{HealthResponse, QuoteResponse};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Quote service is healthy".to_string(),
    })
}

/// `GET /cotacao`: fetch, persist, then answer with the bid.
///
/// A timeout in either stage answers 504, any other failure 500, both with an empty
/// body. A quote that was fetched but not stored is still a failure.
pub async fn get_quote(State(state): State<Arc<AppState>>) -> Response {
    match fetch_and_store(&state).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => {
            let status = StatusCode::from(&e);
            warn!("Quote request failed ({:?}, {}): {}", e.kind(), status, e);
            status.into_response()
        }
    }
}

async fn fetch_and_store(state: &AppState) -> Result<QuoteResponse> {
    let request = state.request_deadline();

    let quote = state.fetcher.fetch(&request).await?;
    let rate = quote.bid_rate()?;
    let record = state.store.save(&request, rate).await?;

    info!("Stored {} bid {} as record {}", quote.code, quote.bid, record.id);
    Ok(QuoteResponse { cotacao: quote.bid })
}
