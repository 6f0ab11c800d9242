use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

pub fn describe() {
    describe_counter!(
        "dashboard_refresh_cycles_total",
        "Refresh cycles by outcome (ok, error, stale)."
    );
    describe_histogram!(
        "dashboard_refresh_latency_ms",
        "Time for all five monitor requests of a cycle to settle, in milliseconds."
    );
    describe_counter!(
        "dashboard_api_requests_total",
        "Requests made to the monitor API, by path and status."
    );
    describe_counter!(
        "dashboard_filter_updates_total",
        "Filter updates received, by whether they changed a value."
    );
    describe_gauge!(
        "dashboard_build_info",
        "Build info for the dashboard (value is always 1)."
    );
}

/// Install the global recorder and serve `/metrics` on `port`. Must be
/// called from inside the tokio runtime.
pub fn install_prometheus(port: u16) -> Result<()> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("failed to start prometheus exporter on {addr}"))?;
    describe();
    metrics::gauge!("dashboard_build_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    Ok(())
}
