use std::sync::Arc;
use std::time::Duration;

use unicorn_core::balancer::BalancerServer;
use unicorn_core::config::Config;
use unicorn_core::session::{FfmpegRewriter, SessionsManager};
use unicorn_core::store;

pub async fn run(mut config: Config, port_override: Option<u16>) -> anyhow::Result<()> {
    // Apply port override if provided
    if let Some(port) = port_override {
        config.server.port = port;
    }

    tracing::info!("Starting Unicorn Balancer...");
    tracing::info!("  Port: {}", config.server.port);
    tracing::info!("  Host: {}", config.server.host);
    tracing::info!("  Public URL: {}", config.server.public_url());
    tracing::info!("  Plex URL: {}", config.plex.url());
    tracing::info!("  Store: {:?}", config.store.mode);

    let store = store::from_config(&config.store)?;
    let sessions = Arc::new(SessionsManager::new(FfmpegRewriter::from_config(&config), store));

    let server = BalancerServer::new(
        config.server.host.clone(),
        config.server.port,
        sessions,
        Duration::from_millis(config.timeouts.session_wait_ms),
    );

    tracing::info!("Press Ctrl+C to stop");

    // Run server (blocks until shutdown)
    server.run().await?;

    Ok(())
}
