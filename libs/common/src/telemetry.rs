//! Logging initialisation for binaries and integration tests

use anyhow::Result;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `default_level` when set. Calling this twice is a
/// no-op for the second caller.
pub fn init(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow::anyhow!("Invalid log filter {}: {}", default_level, e))?;

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }

    Ok(())
}
