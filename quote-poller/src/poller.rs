use crate::config::Config;
use crate::error::{PollerError, Result};
use crate::models::QuoteResponse;
use reqwest::Client;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub fn render(bid: &str) -> String {
    format!("Dólar: {}", bid)
}

pub struct Poller {
    client: Client,
    config: Config,
}

impl Poller {
    pub fn new(config: Config) -> Result<Self> {
        // The client timeout covers connect, headers and body.
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(PollerError::HttpError)?;

        Ok(Self { client, config })
    }

    /// One poll: fetch the bid, render it and replace the output file.
    /// Nothing is written unless every step before the write succeeded.
    pub async fn run(&self) -> Result<String> {
        let bid = self.fetch_bid().await?;
        let line = render(&bid);

        write_atomically(&self.config.output_path, &line)?;
        info!("Wrote {:?} to {}", line, self.config.output_path.display());
        Ok(line)
    }

    pub async fn fetch_bid(&self) -> Result<String> {
        debug!("Requesting quote from {}", self.config.quote_url);

        let response = self
            .client
            .get(&self.config.quote_url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollerError::ApiError {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        let quote: QuoteResponse = serde_json::from_slice(&body)?;
        Ok(quote.cotacao)
    }

    fn classify(&self, err: reqwest::Error) -> PollerError {
        if err.is_timeout() {
            PollerError::Timeout(self.config.timeout)
        } else {
            PollerError::HttpError(err)
        }
    }
}

fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    file.persist(path).map_err(|e| PollerError::Io(e.error))?;
    Ok(())
}
