//! Prometheus metrics for userinfo-claims

use std::sync::OnceLock;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::Result;
use crate::error::Error;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static START_TIME: OnceLock<Instant> = OnceLock::new();

const METRIC_UPTIME: &str = "userinfo_claims_uptime_seconds";
const METRIC_INFO: &str = "userinfo_claims_info";

// Cache metrics
const METRIC_CACHE_HITS: &str = "userinfo_claims_cache_hits_total";
const METRIC_CACHE_MISSES: &str = "userinfo_claims_cache_misses_total";
const METRIC_CACHE_EVICTIONS: &str = "userinfo_claims_cache_evictions_total";
const METRIC_CACHE_SIZE: &str = "userinfo_claims_cache_size";

// Production metrics
const METRIC_PRODUCTIONS: &str = "userinfo_claims_productions_total";
const METRIC_PRODUCTION_FAILURES: &str = "userinfo_claims_production_failures_total";

// Backend metrics
const METRIC_BACKEND_FAILOVERS: &str = "userinfo_claims_backend_failovers_total";

/// Initialize Prometheus metrics recorder.
pub fn init_metrics() -> Result<()> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::Config(format!("Failed to install metrics recorder: {e}")))?;

    PROMETHEUS_HANDLE.set(handle).ok();
    START_TIME.set(Instant::now()).ok();

    register_metrics();
    tracing::info!("Prometheus metrics initialized");
    Ok(())
}

fn register_metrics() {
    describe_gauge!(METRIC_UPTIME, "Process uptime in seconds");
    describe_gauge!(METRIC_INFO, "Build information (always 1)");

    describe_counter!(METRIC_CACHE_HITS, "UserInfo cache hits");
    describe_counter!(METRIC_CACHE_MISSES, "UserInfo cache misses");
    describe_counter!(METRIC_CACHE_EVICTIONS, "UserInfo cache LRU evictions");
    describe_gauge!(METRIC_CACHE_SIZE, "Cached UserInfo records");

    describe_counter!(METRIC_PRODUCTIONS, "Successful UserInfo productions");
    describe_counter!(METRIC_PRODUCTION_FAILURES, "Failed UserInfo productions");

    describe_counter!(
        METRIC_BACKEND_FAILOVERS,
        "Calls routed to the fallback backend"
    );

    gauge!(
        METRIC_INFO,
        "version" => env!("CARGO_PKG_VERSION"),
    )
    .set(1.0);
}

/// Render metrics in Prometheus text format.
#[must_use]
pub fn render_metrics() -> String {
    if let Some(start) = START_TIME.get() {
        gauge!(METRIC_UPTIME).set(start.elapsed().as_secs_f64());
    }

    PROMETHEUS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

pub fn record_cache_hit() {
    counter!(METRIC_CACHE_HITS).increment(1);
}

pub fn record_cache_miss() {
    counter!(METRIC_CACHE_MISSES).increment(1);
}

pub fn record_cache_eviction() {
    counter!(METRIC_CACHE_EVICTIONS).increment(1);
}

/// Update cache size gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_cache_size(size: usize) {
    gauge!(METRIC_CACHE_SIZE).set(size as f64);
}

/// Record the outcome of one UserInfo production.
pub fn record_production(success: bool) {
    if success {
        counter!(METRIC_PRODUCTIONS).increment(1);
    } else {
        counter!(METRIC_PRODUCTION_FAILURES).increment(1);
    }
}

/// Record a call routed to the fallback backend.
pub fn record_backend_failover(operation: &str) {
    counter!(METRIC_BACKEND_FAILOVERS, "operation" => operation.to_owned()).increment(1);
}
