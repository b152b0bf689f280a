//! Logging setup
//!
//! The subscriber is installed before the config is read so that config
//! discovery can report what it loaded or why it fell back. The configured
//! level is applied afterwards through a reload handle. A non-empty `RUST_LOG`
//! always wins.

use tracing::Subscriber;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter, Registry};

const DEFAULT_LEVEL: &str = "info";

pub struct Logging {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl Logging {
    /// Install the global subscriber at the default level
    pub fn init() -> anyhow::Result<Self> {
        let (subscriber, handle) = subscriber(std::io::stdout);
        subscriber.try_init()?;

        let env = std::env::var("RUST_LOG").ok().filter(|v| !v.trim().is_empty());
        if let Some(directives) = &env {
            handle.reload(EnvFilter::try_new(directives)?)?;
        }
        Ok(Self {
            handle,
            from_env: env.is_some(),
        })
    }

    /// Switch to the level from config, unless `RUST_LOG` was given
    pub fn apply_level(&self, level: &str) -> anyhow::Result<()> {
        if self.from_env {
            return Ok(());
        }
        self.handle.reload(filter_for(level)?)?;
        Ok(())
    }
}

pub fn filter_for(level: &str) -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::try_new(format!(
        "unicorn_balancer={level},unicorn_core={level},tower_http=debug"
    ))?)
}

fn subscriber<W>(
    make_writer: W,
) -> (impl Subscriber + Send + Sync + 'static, reload::Handle<EnvFilter, Registry>)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let initial = filter_for(DEFAULT_LEVEL).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));
    let (filter, handle) = reload::Layer::new(initial);
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(make_writer).with_ansi(false));
    (subscriber, handle)
}
