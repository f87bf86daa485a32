use serde::Deserialize;

/// Body served by the quote service on `/cotacao`.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteResponse {
    pub cotacao: String,
}
