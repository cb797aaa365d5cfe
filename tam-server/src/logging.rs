//! Tracing subscriber setup
//!
//! The subscriber is installed before the config file is read so messages
//! from config loading are kept. The configured level is applied afterwards
//! through a reload handle, unless `RUST_LOG` is set.

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry};

/// Level used until the config file has been read
pub const STARTUP_LEVEL: &str = "info";

pub type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Filter directives for a configured log level
pub fn directives(level: &str) -> String {
    format!("{},tower_http=info", level)
}

/// Registry with a reloadable filter and a fmt layer writing to `writer`
pub fn layered<W>(filter: EnvFilter, writer: W) -> (impl Subscriber + Send + Sync + 'static, FilterHandle)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::new(filter);
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer));
    (subscriber, handle)
}

/// Install the global subscriber at the startup level (or `RUST_LOG`)
pub fn init_tracing() -> FilterHandle {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives(STARTUP_LEVEL)));
    let (subscriber, handle) = layered(filter, std::io::stdout);
    subscriber.init();
    handle
}

/// Switch to `level` now that configuration is known
pub fn reload_level(handle: &FilterHandle, level: &str) {
    if let Err(e) = handle.reload(EnvFilter::new(directives(level))) {
        tracing::warn!("Failed to apply log level {}: {}", level, e);
    }
}

/// Apply the configured level unless `RUST_LOG` already chose one
pub fn apply_configured_level(handle: &FilterHandle, level: &str) {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return;
    }
    reload_level(handle, level);
}
