use anyhow::Context;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the process-wide Prometheus recorder. Fails if one is already installed.
    pub fn install() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// Register HELP text once per process. Safe to call from any hot path.
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("watch_cycles_total", "Poll cycles started.");
        describe_counter!(
            "watch_cycle_errors_total",
            "Poll cycles aborted by a cycle-level error."
        );
        describe_counter!(
            "ingest_listings_total",
            "Listings extracted from search pages, by platform."
        );
        describe_counter!(
            "ingest_source_errors_total",
            "Search URLs whose fetch or parse failed, by platform."
        );
        describe_counter!("watch_notified_total", "Listings accepted and sent.");
        describe_counter!(
            "watch_rejected_total",
            "Listings rejected, labelled by the first failing criterion."
        );
        describe_counter!(
            "watch_duplicates_total",
            "Listings skipped because their fingerprint was already seen."
        );
        describe_counter!(
            "notify_delivery_errors_total",
            "Notifications the channel did not accept."
        );
        describe_gauge!("watch_seen_fingerprints", "Size of the in-memory seen set.");
        describe_gauge!(
            "watch_last_cycle_ts",
            "Unix ts when the last poll cycle finished."
        );
    });
}
