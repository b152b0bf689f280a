use unicorn_core::config::{expand_path, Config};

use super::local_base_url;

pub async fn run(config: &Config) -> anyhow::Result<()> {
    println!("Unicorn Balancer Status");
    println!("=======================");
    println!();
    println!("Configuration:");
    match &config.source {
        Some(path) => println!("  Config file: {:?}", path),
        None => println!("  Config file: (none, using defaults)"),
    }
    println!("  Store: {:?} ({:?})", config.store.mode, expand_path(&config.store.directory));
    println!();
    println!("Server settings:");
    println!("  Host: {}", config.server.host);
    println!("  Port: {}", config.server.port);
    println!("  Public URL: {}", config.server.public_url());
    println!("  Plex URL: {}", config.plex.url());

    // Check if server is reachable
    println!();
    let url = format!("{}/healthz", local_base_url(config));
    match reqwest::get(&url).await {
        Ok(resp) if resp.status().is_success() => {
            println!("Server: RUNNING ✓");
        }
        _ => {
            println!("Server: NOT RUNNING");
        }
    }

    Ok(())
}
