use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

// Upstream payload, all fields arrive as text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub code: String,
    pub codein: String,
    pub name: String,
    pub high: String,
    pub low: String,
    #[serde(rename = "varBid")]
    pub var_bid: String,
    #[serde(rename = "pctChange")]
    pub pct_change: String,
    pub bid: String,
    pub ask: String,
    pub timestamp: String,
    pub create_date: String,
}

impl Quote {
    /// Parses the bid into the value that gets persisted.
    pub fn bid_rate(&self) -> Result<f64, FetchError> {
        match self.bid.trim().parse::<f64>() {
            Ok(rate) if rate.is_finite() => Ok(rate),
            _ => Err(FetchError::Decode(format!("bid is not a number: {:?}", self.bid))),
        }
    }
}

// Database models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub id: i64,
    pub date: NaiveDateTime,
    pub dollar_exchange_rate: f64,
}

// Response models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub cotacao: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}
