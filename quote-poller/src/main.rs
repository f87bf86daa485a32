use dotenv::dotenv;
use quote_poller::config::Config;
use quote_poller::error::Result;
use quote_poller::Poller;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv().ok();

    match run().await {
        Ok(line) => {
            info!("Quote poll finished: {}", line);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Quote poll failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<String> {
    let config = Config::from_env()?;
    let poller = Poller::new(config)?;
    poller.run().await
}
