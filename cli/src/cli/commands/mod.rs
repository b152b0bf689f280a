pub mod rewrite;
pub mod sessions;
pub mod start;
pub mod status;

use unicorn_core::config::Config;

/// Base URL for reaching the local balancer from this machine
pub fn local_base_url(config: &Config) -> String {
    let host = match config.server.host.as_str() {
        "0.0.0.0" | "::" => "127.0.0.1",
        host => host,
    };
    format!("http://{}:{}", host, config.server.port)
}
