use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Balancer configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub plex: PlexConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// File this config was loaded from, `None` when running on defaults
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Base URL clients and transcoders use to reach the balancer
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            public_url: default_public_url(),
        }
    }
}

impl ServerConfig {
    /// Public base URL, always ending in `/`
    pub fn public_url(&self) -> String {
        with_trailing_slash(&self.public_url)
    }
}

/// Origin Plex Media Server the transcoders talk to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlexConfig {
    #[serde(default = "default_plex_host")]
    pub host: String,

    #[serde(default = "default_plex_port")]
    pub port: u16,

    /// Transcode session cache directory on the Plex host
    #[serde(default = "default_sessions_path")]
    pub sessions_path: String,

    /// Plex install prefix (codecs, resources)
    #[serde(default = "default_resources_path")]
    pub resources_path: String,
}

impl Default for PlexConfig {
    fn default() -> Self {
        Self {
            host: default_plex_host(),
            port: default_plex_port(),
            sessions_path: default_sessions_path(),
            resources_path: default_resources_path(),
        }
    }
}

impl PlexConfig {
    /// Internal base URL of the transcoding engine, always ending in `/`
    pub fn url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StoreMode {
    Memory,
    File,
}

impl Default for StoreMode {
    fn default() -> Self {
        Self::Memory
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub mode: StoreMode,

    #[serde(default = "default_store_dir")]
    pub directory: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            mode: StoreMode::default(),
            directory: default_store_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// How long `GET /api/session/:session` waits for the snapshot to land
    #[serde(default = "default_session_wait_ms")]
    pub session_wait_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            session_wait_ms: default_session_wait_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_port() -> u16 { 3001 }
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_public_url() -> String { "http://127.0.0.1:3001/".to_string() }
fn default_plex_host() -> String { "127.0.0.1".to_string() }
fn default_plex_port() -> u16 { 32400 }
fn default_session_wait_ms() -> u64 { 10_000 }
fn default_log_level() -> String { "info".to_string() }

fn default_sessions_path() -> String {
    "/var/lib/plexmediaserver/Library/Application Support/Plex Media Server/Cache/Transcode/Sessions/"
        .to_string()
}

fn default_resources_path() -> String {
    "/usr/lib/plexmediaserver/".to_string()
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("~/.unicorn/sessions")
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

/// Get default config file path
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("unicorn-balancer")
        .join("config.toml")
}

/// Load config from file, or return defaults if not found.
///
/// Loading order:
/// 1. Specified path (if provided)
/// 2. ./config.toml (if exists)
/// 3. default_config_path() (usually ~/.config/unicorn-balancer/config.toml)
pub fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    if let Some(config_path) = path {
        if config_path.exists() {
            let config = read_config(&config_path)?;
            tracing::info!("Loaded config from specified path {:?}", config_path);
            return Ok(config);
        } else {
            anyhow::bail!("Specified config file not found: {:?}", config_path);
        }
    }

    let local_config = PathBuf::from("config.toml");
    if local_config.exists() {
        match std::fs::read_to_string(&local_config) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(mut config) => {
                    config.source = Some(local_config.clone());
                    tracing::info!("Loaded config from current directory {:?}", local_config);
                    return Ok(config);
                }
                Err(e) => {
                    tracing::error!("Failed to parse ./config.toml: {}. Falling back to default path.", e);
                }
            },
            Err(e) => {
                tracing::error!("Failed to read ./config.toml: {}. Falling back to default path.", e);
            }
        }
    }

    let default_path = default_config_path();
    if default_path.exists() {
        let config = read_config(&default_path)?;
        tracing::info!("Loaded config from default path {:?}", default_path);
        Ok(config)
    } else {
        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }
}

fn read_config(path: &PathBuf) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;
    config.source = Some(path.clone());
    Ok(config)
}

/// Expand ~ in path to home directory
pub fn expand_path(path: &PathBuf) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(rest) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
    }
    path.clone()
}
