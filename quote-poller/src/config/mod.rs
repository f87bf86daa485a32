use crate::error::{PollerError, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub quote_url: String,
    pub timeout: Duration,
    pub output_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quote_url: "http://localhost:8080/cotacao".to_string(),
            timeout: Duration::from_millis(300),
            output_path: PathBuf::from("cotacao.txt"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let timeout = match env::var("POLL_TIMEOUT_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| PollerError::ConfigError("Invalid POLL_TIMEOUT_MS".to_string()))?,
            Err(_) => defaults.timeout,
        };

        Ok(Self {
            quote_url: env::var("COTACAO_URL").unwrap_or(defaults.quote_url),
            timeout,
            output_path: env::var("OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_path),
        })
    }
}
