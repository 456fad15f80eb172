// Harbor - S3-compatible replicating reverse proxy
// Copyright (C) 2026 Harbor Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Metrics registry for tracking dispatch, backend, and repair activity.

use prometheus::{Counter, CounterVec, HistogramOpts, HistogramVec, Opts, Registry};
use std::sync::Arc;
use tracing::warn;

use crate::types::PickerKind;

const LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Central metrics registry for the dispatcher.
///
/// Thread-safe registry that can be cloned and shared across async tasks.
#[derive(Clone)]
pub struct MetricsRegistry {
    inner: Arc<MetricsRegistryInner>,
}

struct MetricsRegistryInner {
    registry: Registry,

    /// Dispatches per picker kind and outcome.
    dispatch_total: CounterVec,
    /// Dispatch latency by picker kind.
    dispatch_duration: HistogramVec,

    /// Backend round-trip latency by host.
    backend_latency: HistogramVec,
    /// Backend round-trip errors by host.
    backend_errors: CounterVec,

    /// Repair records successfully handed to the sink.
    repair_emitted: Counter,
    /// Repair records dropped because the queue was full.
    repair_dropped: Counter,

    /// Multipart requests routed to each backend by the hash ring.
    multipart_ring_selections: CounterVec,
}

impl MetricsRegistry {
    /// Create new metrics registry.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let dispatch_total = CounterVec::new(
            Opts::new("harbor_dispatch_total", "Total dispatches by picker kind and outcome"),
            &["picker", "outcome"],
        )?;
        registry.register(Box::new(dispatch_total.clone()))?;

        let dispatch_duration = HistogramVec::new(
            HistogramOpts::new("harbor_dispatch_duration_seconds", "Dispatch latency in seconds")
                .buckets(LATENCY_BUCKETS.to_vec()),
            &["picker"],
        )?;
        registry.register(Box::new(dispatch_duration.clone()))?;

        let backend_latency = HistogramVec::new(
            HistogramOpts::new("harbor_backend_latency_seconds", "Backend round-trip latency in seconds")
                .buckets(LATENCY_BUCKETS.to_vec()),
            &["backend"],
        )?;
        registry.register(Box::new(backend_latency.clone()))?;

        let backend_errors = CounterVec::new(
            Opts::new("harbor_backend_errors_total", "Backend round-trip errors by host"),
            &["backend"],
        )?;
        registry.register(Box::new(backend_errors.clone()))?;

        let repair_emitted = Counter::with_opts(Opts::new(
            "harbor_repair_records_emitted_total",
            "Repair records successfully handed to the sync sink",
        ))?;
        registry.register(Box::new(repair_emitted.clone()))?;

        let repair_dropped = Counter::with_opts(Opts::new(
            "harbor_repair_records_dropped_total",
            "Repair records dropped because the sync queue was full",
        ))?;
        registry.register(Box::new(repair_dropped.clone()))?;

        let multipart_ring_selections = CounterVec::new(
            Opts::new(
                "harbor_multipart_ring_selections_total",
                "Multipart requests routed to each backend by the consistent-hash ring",
            ),
            &["backend"],
        )?;
        registry.register(Box::new(multipart_ring_selections.clone()))?;

        Ok(Self {
            inner: Arc::new(MetricsRegistryInner {
                registry,
                dispatch_total,
                dispatch_duration,
                backend_latency,
                backend_errors,
                repair_emitted,
                repair_dropped,
                multipart_ring_selections,
            }),
        })
    }

    /// Get reference to Prometheus registry for gathering metrics.
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Record one dispatch's outcome and latency.
    pub fn record_dispatch(&self, picker: PickerKind, success: bool, duration_secs: f64) {
        let outcome = if success { "success" } else { "error" };
        self.inner
            .dispatch_total
            .with_label_values(&[picker.as_label(), outcome])
            .inc();
        self.inner
            .dispatch_duration
            .with_label_values(&[picker.as_label()])
            .observe(duration_secs);
    }

    /// Record one backend round-trip's latency, and an error count if it failed.
    pub fn record_backend_round_trip(&self, backend: &str, success: bool, duration_secs: f64) {
        self.inner
            .backend_latency
            .with_label_values(&[backend])
            .observe(duration_secs);
        if !success {
            self.inner.backend_errors.with_label_values(&[backend]).inc();
        }
    }

    /// Record a repair record successfully queued to the sink.
    pub fn record_repair_emitted(&self) {
        self.inner.repair_emitted.inc();
    }

    /// Record a repair record dropped because the queue was full.
    pub fn record_repair_dropped(&self) {
        self.inner.repair_dropped.inc();
    }

    /// Record a multipart request routed to `backend` by the hash ring.
    pub fn record_multipart_selection(&self, backend: &str) {
        self.inner
            .multipart_ring_selections
            .with_label_values(&[backend])
            .inc();
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new().unwrap_or_else(|e| {
            warn!("failed to create metrics registry: {e}, falling back to a disconnected one");
            Self {
                inner: Arc::new(MetricsRegistryInner {
                    registry: Registry::new(),
                    dispatch_total: CounterVec::new(Opts::new("fallback", "fallback"), &["picker", "outcome"])
                        .unwrap(),
                    dispatch_duration: HistogramVec::new(HistogramOpts::new("fallback", "fallback"), &["picker"])
                        .unwrap(),
                    backend_latency: HistogramVec::new(HistogramOpts::new("fallback", "fallback"), &["backend"])
                        .unwrap(),
                    backend_errors: CounterVec::new(Opts::new("fallback", "fallback"), &["backend"]).unwrap(),
                    repair_emitted: Counter::new("fallback_repair_emitted", "fallback").unwrap(),
                    repair_dropped: Counter::new("fallback_repair_dropped", "fallback").unwrap(),
                    multipart_ring_selections: CounterVec::new(Opts::new("fallback", "fallback"), &["backend"])
                        .unwrap(),
                }),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_dispatch_metrics() {
        let registry = MetricsRegistry::new().unwrap();
        registry.record_dispatch(PickerKind::Object, true, 0.01);
        registry.record_dispatch(PickerKind::Object, false, 0.02);

        let success = registry
            .inner
            .dispatch_total
            .with_label_values(&["object", "success"])
            .get();
        assert_eq!(success, 1.0);
    }

    #[test]
    fn test_backend_metrics() {
        let registry = MetricsRegistry::new().unwrap();
        registry.record_backend_round_trip("b1.local", true, 0.05);
        registry.record_backend_round_trip("b1.local", false, 0.1);

        let errors = registry.inner.backend_errors.with_label_values(&["b1.local"]).get();
        assert_eq!(errors, 1.0);
    }

    #[test]
    fn test_repair_counters() {
        let registry = MetricsRegistry::new().unwrap();
        registry.record_repair_emitted();
        registry.record_repair_emitted();
        registry.record_repair_dropped();

        assert_eq!(registry.inner.repair_emitted.get(), 2.0);
        assert_eq!(registry.inner.repair_dropped.get(), 1.0);
    }

    #[test]
    fn test_multipart_ring_selection_counter() {
        let registry = MetricsRegistry::new().unwrap();
        registry.record_multipart_selection("b2.local");
        registry.record_multipart_selection("b2.local");

        let count = registry
            .inner
            .multipart_ring_selections
            .with_label_values(&["b2.local"])
            .get();
        assert_eq!(count, 2.0);
    }
}
