//! Tracing subscriber setup

use anyhow::Result;
use tracing::Subscriber;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// `RUST_LOG` when set, otherwise `default_level` with quieter HTTP internals
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},hyper=info,h2=info", default_level)))
}

/// Formatting subscriber gated only by `filter`
pub fn subscriber(filter: EnvFilter) -> impl Subscriber + Send + Sync + 'static {
    FmtSubscriber::builder().with_env_filter(filter).finish()
}

/// Install the global subscriber
pub fn init(default_level: &str) -> Result<()> {
    tracing::subscriber::set_global_default(subscriber(env_filter(default_level)))?;
    Ok(())
}
