//! Prometheus metrics for a store.
//!
//! Metrics are registered in a caller-supplied [`Registry`], so several
//! stores can be exported side by side (one registry each) and tests never
//! collide on global names.

use prometheus::{
    register_gauge_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, Gauge,
    IntCounter, IntCounterVec, IntGauge, Registry, TextEncoder,
};

use lapse_core::{CacheError, CacheResult, Timestamp};

use crate::observer::{StoreEvent, StoreObserver, StoreOp};

/// [`StoreObserver`] feeding Prometheus metrics.
///
/// | Metric | Type | Labels |
/// |--------|------|--------|
/// | `lapse_operations_total` | counter | `operation`, `status` |
/// | `lapse_items` | gauge | |
/// | `lapse_evictions_total` | counter | |
/// | `lapse_janitor_last_run_timestamp_seconds` | gauge | |
#[derive(Clone)]
pub struct PrometheusObserver {
    registry: Registry,

    /// Operation counter - labels: operation, status (success/failure)
    pub operations_total: IntCounterVec,

    /// Entries in the map, expired ones included
    pub items: IntGauge,

    /// Entries removed by delete or an expiration sweep
    pub evictions_total: IntCounter,

    /// Unix time of the last janitor sweep
    pub janitor_last_run: Gauge,
}

impl PrometheusObserver {
    /// Create and register all metrics with `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Metrics`] if a metric with the same name is
    /// already registered there.
    pub fn new(registry: &Registry) -> CacheResult<Self> {
        Ok(Self {
            registry: registry.clone(),

            operations_total: register_int_counter_vec_with_registry!(
                "lapse_operations_total",
                "Total number of cache operations",
                &["operation", "status"],
                registry
            )
            .map_err(|e| metrics_error("lapse_operations_total", e))?,

            items: register_int_gauge_with_registry!(
                "lapse_items",
                "Current number of cached items",
                registry
            )
            .map_err(|e| metrics_error("lapse_items", e))?,

            evictions_total: register_int_counter_with_registry!(
                "lapse_evictions_total",
                "Total number of entries removed by delete or expiration",
                registry
            )
            .map_err(|e| metrics_error("lapse_evictions_total", e))?,

            janitor_last_run: register_gauge_with_registry!(
                "lapse_janitor_last_run_timestamp_seconds",
                "Timestamp of the last janitor run",
                registry
            )
            .map_err(|e| metrics_error("lapse_janitor_last_run_timestamp_seconds", e))?,
        })
    }

    /// Render the registry in Prometheus text format.
    pub fn encode(&self) -> CacheResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| CacheError::Metrics {
                reason: e.to_string(),
            })?;
        String::from_utf8(buffer).map_err(|e| CacheError::Metrics {
            reason: e.to_string(),
        })
    }
}

fn metrics_error(name: &str, err: prometheus::Error) -> CacheError {
    CacheError::Metrics {
        reason: format!("Failed to register {}: {}", name, err),
    }
}

impl StoreObserver for PrometheusObserver {
    fn record(&self, event: &StoreEvent) {
        let status = if event.succeeded { "success" } else { "failure" };
        self.operations_total
            .with_label_values(&[event.op.as_str(), status])
            .inc();

        if event.removed > 0 && event.op != StoreOp::Flush {
            self.evictions_total.inc_by(event.removed as u64);
        }
        self.items.set(event.item_count as i64);
    }

    fn janitor_swept(&self, at: Timestamp, _removed: usize) {
        self.janitor_last_run
            .set(at.timestamp_millis() as f64 / 1000.0);
    }
}

impl std::fmt::Debug for PrometheusObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusObserver")
            .field("items", &self.items.get())
            .field("evictions_total", &self.evictions_total.get())
            .finish()
    }
}
