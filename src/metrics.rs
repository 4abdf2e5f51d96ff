use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    // Pre-register counters so they appear even before the first increment.
    counter!("trades_ingested").absolute(0);
    counter!("duplicate_trades").absolute(0);
    counter!("wallet_fetch_errors").absolute(0);
    counter!("orders_simulated").absolute(0);
    counter!("orders_executed").absolute(0);
    counter!("orders_failed").absolute(0);
    counter!("execution_store_failures").absolute(0);

    gauge!("active_wallets").set(0.0);
    gauge!("open_positions").set(0.0);

    // Histogram is lazily created on first record; force creation.
    histogram!("monitor_cycle_seconds").record(0.0);

    Ok(handle)
}
