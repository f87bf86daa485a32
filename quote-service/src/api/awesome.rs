use crate::config::Config;
use crate::deadline::Deadline;
use crate::error::FetchError;
use crate::models::Quote;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error};

/// Client for the AwesomeAPI `json/last/<PAIR>` endpoint.
#[derive(Clone)]
pub struct QuoteFetcher {
    client: Client,
    url: String,
    pair: String,
    budget: Duration,
}

impl QuoteFetcher {
    pub fn new(config: &Config) -> Self {
        Self::with_client(
            Client::new(),
            &config.quote_api_url,
            &config.quote_pair,
            config.fetch_timeout,
        )
    }

    pub fn with_client(client: Client, url: &str, pair: &str, budget: Duration) -> Self {
        Self {
            client,
            url: url.to_string(),
            pair: pair.to_string(),
            budget,
        }
    }

    /// Single attempt; send, body read and decode all count against the budget.
    pub async fn fetch(&self, parent: &Deadline) -> Result<Quote, FetchError> {
        let deadline = parent.child(self.budget);
        let bound = deadline.remaining().unwrap_or(self.budget);

        debug!("Fetching {} quote from {} (bound {:?})", self.pair, self.url, bound);

        match deadline.run(self.fetch_once(bound)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(bound)),
        }
    }

    async fn fetch_once(&self, bound: Duration) -> Result<Quote, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| classify(e, bound))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Upstream {
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|e| classify(e, bound))?;
        decode_quote(&text, &self.pair).map_err(|e| {
            error!("Quote API raw response: {}", text);
            e
        })
    }
}

fn classify(err: reqwest::Error, bound: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(bound)
    } else {
        FetchError::Transport(err)
    }
}

/// The provider answers with an object keyed by pair, e.g. `{"USDBRL": {...}}`.
pub(crate) fn decode_quote(body: &str, pair: &str) -> Result<Quote, FetchError> {
    let mut payload: HashMap<String, Value> = serde_json::from_str(body)?;
    let entry = payload
        .remove(pair)
        .ok_or_else(|| FetchError::Decode(format!("missing {} entry", pair)))?;
    Ok(serde_json::from_value(entry)?)
}
