//! Vitals status server binary.

use std::sync::Arc;
use vitals::ResponsePolicy;
use vitals_server::{Config, StatusServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Can't use tracing yet, the log level comes from the config.
    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            eprintln!("Using default configuration");
            Config::default()
        }
    };

    let level = config.logging.level.as_deref().unwrap_or("info");
    let json = config.logging.format.as_deref() == Some("json");
    common::logging::init_with_level(level, json);

    tracing::info!(checks = config.checks.len(), "Vitals status server starting");

    let registry = Arc::new(config.build_registry()?);
    let policy = ResponsePolicy::new(config.server.degraded_status_code)?;

    let server = StatusServer::new(registry, policy, config.server.listen.clone());
    server.run().await?;

    Ok(())
}
