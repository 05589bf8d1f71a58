//! Logging and optional Prometheus metrics

#[cfg(feature = "metrics")]
mod metrics;

#[cfg(feature = "metrics")]
pub use metrics::{
    init_metrics, record_backend_failover, record_cache_eviction, record_cache_hit,
    record_cache_miss, record_production, render_metrics, set_cache_size,
};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::TelemetryConfig;
use crate::{Error, Result};

/// Install the global tracing subscriber (and metrics recorder, if enabled)
///
/// `RUST_LOG` takes precedence over the configured log level. Logs go to
/// stderr so stdout carries only UserInfo JSON.
pub fn init_observability(config: &TelemetryConfig) -> Result<()> {
    #[cfg(feature = "metrics")]
    {
        init_metrics()?;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to install tracing subscriber: {e}")))?;

    tracing::debug!(json_logs = config.json_logs, "logging initialized");
    Ok(())
}

/// Flush observability state before exit
#[allow(clippy::missing_const_for_fn)]
pub fn shutdown_observability() {
    #[cfg(feature = "metrics")]
    {
        let rendered = render_metrics();
        if !rendered.is_empty() {
            tracing::debug!(metrics = %rendered, "final metrics snapshot");
        }
    }
}
