//! Prometheus metrics for the activity engine.
//!
//! [`EngineMetrics`] owns a dedicated [`Registry`] that a host process can
//! encode into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

pub struct EngineMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Inbound updates handled, labelled by update kind.
    pub updates_handled: IntCounterVec,
    /// Previous activities superseded through id replacement.
    pub ids_replaced: IntCounter,
    /// Activities written into `byId`.
    pub activities_inserted: IntCounter,
    /// Activities removed from an account's indices.
    pub activities_removed: IntCounter,
    /// Local activities hidden because their confirmation was already known.
    pub locals_hidden: IntCounter,
    /// Durable writes that failed and were dropped.
    pub persistence_failures: IntCounter,
    /// History pages requested from the fetcher.
    pub pagination_pages: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Accounts with in-memory state.
    pub tracked_accounts: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Time spent applying one update transaction, in milliseconds.
    pub transaction_time_ms: Histogram,
}

impl EngineMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let updates_handled = register_int_counter_vec_with_registry!(
            Opts::new("mtw_updates_handled_total", "Activity updates handled by kind"),
            &["kind"],
            registry
        )
        .expect("failed to register updates_handled counter");

        let ids_replaced = register_int_counter_with_registry!(
            Opts::new("mtw_ids_replaced_total", "Activity ids superseded by replacement"),
            registry
        )
        .expect("failed to register ids_replaced counter");

        let activities_inserted = register_int_counter_with_registry!(
            Opts::new("mtw_activities_inserted_total", "Activities written to account state"),
            registry
        )
        .expect("failed to register activities_inserted counter");

        let activities_removed = register_int_counter_with_registry!(
            Opts::new("mtw_activities_removed_total", "Activities removed from account state"),
            registry
        )
        .expect("failed to register activities_removed counter");

        let locals_hidden = register_int_counter_with_registry!(
            Opts::new("mtw_locals_hidden_total", "Local activities hidden as outdated"),
            registry
        )
        .expect("failed to register locals_hidden counter");

        let persistence_failures = register_int_counter_with_registry!(
            Opts::new("mtw_persistence_failures_total", "Failed durable writes"),
            registry
        )
        .expect("failed to register persistence_failures counter");

        let pagination_pages = register_int_counter_with_registry!(
            Opts::new("mtw_pagination_pages_total", "History pages fetched"),
            registry
        )
        .expect("failed to register pagination_pages counter");

        let tracked_accounts = register_int_gauge_with_registry!(
            Opts::new("mtw_tracked_accounts", "Accounts with in-memory activity state"),
            registry
        )
        .expect("failed to register tracked_accounts gauge");

        // 0.05 ms to ~800 ms.
        let transaction_time_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "mtw_transaction_time_ms",
                "Time spent applying one account transaction in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(0.05, 2.0, 15).expect("valid bucket layout")),
            registry
        )
        .expect("failed to register transaction_time_ms histogram");

        Self {
            registry,
            updates_handled,
            ids_replaced,
            activities_inserted,
            activities_removed,
            locals_hidden,
            persistence_failures,
            pagination_pages,
            tracked_accounts,
            transaction_time_ms,
        }
    }

    /// Render every metric in the Prometheus text format.
    pub fn encode_text(&self) -> String {
        let mut buffer = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!(error = %e, "failed to encode metrics");
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
