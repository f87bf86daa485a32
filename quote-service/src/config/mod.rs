use crate::error::{Result, ServiceError};
use std::env;
use std::time::Duration;

pub const DEFAULT_QUOTE_API_URL: &str = "https://economia.awesomeapi.com.br/json/last/USD-BRL";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub sqlite_path: String,
    pub max_connections: u32,
    pub quote_api_url: String,
    pub quote_pair: String,
    pub fetch_timeout: Duration,
    pub store_timeout: Duration,
    /// Overall bound for one inbound request; stage budgets are capped by it.
    pub request_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            sqlite_path: "cotacao.db".to_string(),
            max_connections: 5,
            quote_api_url: DEFAULT_QUOTE_API_URL.to_string(),
            quote_pair: "USDBRL".to_string(),
            fetch_timeout: Duration::from_millis(200),
            store_timeout: Duration::from_millis(10),
            request_timeout: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = env::var("PORT")
            .unwrap_or_else(|_| defaults.port.to_string())
            .parse::<u16>()
            .map_err(|_| ServiceError::Config("Invalid PORT".to_string()))?;

        let max_connections = env::var("MAX_CONNECTIONS")
            .unwrap_or_else(|_| defaults.max_connections.to_string())
            .parse::<u32>()
            .map_err(|_| ServiceError::Config("Invalid MAX_CONNECTIONS".to_string()))?;
        if max_connections == 0 {
            return Err(ServiceError::Config("MAX_CONNECTIONS must be at least 1".to_string()));
        }

        let fetch_timeout = millis_var("FETCH_TIMEOUT_MS")?.unwrap_or(defaults.fetch_timeout);
        let store_timeout = millis_var("STORE_TIMEOUT_MS")?.unwrap_or(defaults.store_timeout);
        let request_timeout = millis_var("REQUEST_TIMEOUT_MS")?;

        Ok(Self {
            port,
            sqlite_path: env::var("SQLITE_DB_PATH").unwrap_or(defaults.sqlite_path),
            max_connections,
            quote_api_url: env::var("QUOTE_API_URL").unwrap_or(defaults.quote_api_url),
            quote_pair: env::var("QUOTE_PAIR").unwrap_or(defaults.quote_pair),
            fetch_timeout,
            store_timeout,
            request_timeout,
        })
    }
}

fn millis_var(name: &str) -> Result<Option<Duration>> {
    match env::var(name) {
        Ok(raw) => parse_millis(&raw)
            .map(Some)
            .ok_or_else(|| ServiceError::Config(format!("Invalid {}", name))),
        Err(_) => Ok(None),
    }
}

fn parse_millis(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(Duration::from_millis)
}
