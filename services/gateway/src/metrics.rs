// Prometheus metrics for the Tipjar gateway.
// Tracks: webhook volume, ledger writes, leaderboard reads, failures.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_with_registry, register_histogram_with_registry, Counter, Encoder,
    Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};

pub static METRICS: Lazy<Metrics> =
    Lazy::new(|| Metrics::new().expect("metrics registration cannot fail at startup"));

pub struct Metrics {
    pub registry: Registry,

    // Webhook metrics
    pub webhook_events_total: Counter,
    pub webhook_events_ignored_total: Counter,
    pub webhook_signature_failures_total: Counter,

    // Ledger metrics
    pub payments_recorded_total: Counter,
    pub payment_volume_dollars_total: Counter,
    pub store_errors_total: Counter,

    // Checkout metrics
    pub checkout_sessions_created_total: Counter,

    // Leaderboard metrics
    pub leaderboard_requests_total: Counter,
    pub leaderboard_compute_duration_seconds: Histogram,
}

impl Metrics {
    fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let webhook_events_total = register_counter_with_registry!(
            Opts::new("tipjar_webhook_events_total", "Webhook events received"),
            registry
        )?;

        let webhook_events_ignored_total = register_counter_with_registry!(
            Opts::new(
                "tipjar_webhook_events_ignored_total",
                "Webhook events acknowledged but not acted on"
            ),
            registry
        )?;

        let webhook_signature_failures_total = register_counter_with_registry!(
            Opts::new(
                "tipjar_webhook_signature_failures_total",
                "Webhook deliveries rejected for bad signatures"
            ),
            registry
        )?;

        let payments_recorded_total = register_counter_with_registry!(
            Opts::new("tipjar_payments_recorded_total", "Payments written to the ledger"),
            registry
        )?;

        let payment_volume_dollars_total = register_counter_with_registry!(
            Opts::new(
                "tipjar_payment_volume_dollars_total",
                "Total donation volume in dollars"
            ),
            registry
        )?;

        let store_errors_total = register_counter_with_registry!(
            Opts::new("tipjar_store_errors_total", "Ledger store failures"),
            registry
        )?;

        let checkout_sessions_created_total = register_counter_with_registry!(
            Opts::new(
                "tipjar_checkout_sessions_created_total",
                "Checkout sessions created with the processor"
            ),
            registry
        )?;

        let leaderboard_requests_total = register_counter_with_registry!(
            Opts::new("tipjar_leaderboard_requests_total", "Leaderboard reads"),
            registry
        )?;

        let leaderboard_compute_duration_seconds = register_histogram_with_registry!(
            HistogramOpts::new(
                "tipjar_leaderboard_compute_duration_seconds",
                "Full-ledger aggregation duration in seconds"
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            registry
        )?;

        Ok(Self {
            registry,
            webhook_events_total,
            webhook_events_ignored_total,
            webhook_signature_failures_total,
            payments_recorded_total,
            payment_volume_dollars_total,
            store_errors_total,
            checkout_sessions_created_total,
            leaderboard_requests_total,
            leaderboard_compute_duration_seconds,
        })
    }

    pub fn export(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_contains_registered_metrics() {
        METRICS.webhook_events_total.inc();
        let exported = METRICS.export().unwrap();
        assert!(exported.contains("tipjar_webhook_events_total"));
    }
}
