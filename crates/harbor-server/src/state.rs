//! Shared application state for the proxy and admin HTTP servers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use harbor_config::ConfigHandle;
use harbor_metrics::{BackendStatus, MetricsRegistry, StatusProvider};

/// Generates per-request IDs used to correlate a dispatch with any repair record it emits.
#[derive(Default)]
pub struct RequestIdGenerator {
    next: AtomicU64,
}

impl RequestIdGenerator {
    /// A monotonically increasing, process-local request ID.
    pub fn next(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("req-{n}")
    }
}

/// Everything the proxy and admin handlers need: the live, hot-reloadable dispatcher, the
/// metrics registry, and a request ID generator.
pub struct AppState {
    /// Hot-swappable handle onto the current configuration generation's dispatcher.
    pub config: ConfigHandle,
    /// Prometheus metrics recorded by the proxy handler.
    pub metrics: Arc<MetricsRegistry>,
    request_ids: RequestIdGenerator,
}

impl AppState {
    /// Builds app state around an already-loaded configuration handle.
    pub fn new(config: ConfigHandle, metrics: MetricsRegistry) -> Self {
        Self {
            config,
            metrics: Arc::new(metrics),
            request_ids: RequestIdGenerator::default(),
        }
    }

    /// Allocates a fresh request ID for one inbound request.
    pub fn next_request_id(&self) -> String {
        self.request_ids.next()
    }
}

impl StatusProvider for AppState {
    fn backend_statuses(&self) -> Vec<BackendStatus> {
        let dispatcher = self.config.current();
        dispatcher
            .router()
            .regions()
            .flat_map(|region| {
                let cluster = region.cluster.name.clone();
                region.cluster.backends.iter().map(move |backend| BackendStatus {
                    host: backend.host(),
                    cluster: cluster.clone(),
                    maintenance: backend.maintenance,
                })
            })
            .collect()
    }
}
