//! Tribe Relay - Binary Entry Point

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use tribe_relay::{server, RelayConfig, RelayResult};

#[tokio::main]
async fn main() -> RelayResult<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!(version = tribe_relay::VERSION, "starting {}", tribe_relay::NAME);
    let config = RelayConfig::from_env()?;

    server::run(config).await
}
