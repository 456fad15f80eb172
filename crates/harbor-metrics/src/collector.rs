//! Prometheus collector wrapping [`MetricsRegistry`] for `/metrics` scraping.

use prometheus::{core::Collector, proto::MetricFamily};
use std::sync::Arc;
use tracing::debug;

use crate::MetricsRegistry;

/// Custom Prometheus collector for Harbor's dispatch/backend/repair metrics.
pub struct HarborCollector {
    registry: Arc<MetricsRegistry>,
}

impl HarborCollector {
    /// Create a new collector wrapping the given metrics registry.
    pub fn new(registry: MetricsRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Get reference to the underlying metrics registry.
    pub fn registry(&self) -> &MetricsRegistry {
        &self.registry
    }
}

impl Collector for HarborCollector {
    fn desc(&self) -> Vec<&prometheus::core::Desc> {
        vec![]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        debug!("collecting harbor metrics");
        self.registry.registry().gather()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PickerKind;

    #[test]
    fn test_collector_creation() {
        let registry = MetricsRegistry::new().unwrap();
        let collector = HarborCollector::new(registry);
        assert!(Arc::strong_count(&collector.registry) == 1);
    }

    #[test]
    fn test_collector_gather_metrics() {
        let registry = MetricsRegistry::new().unwrap();
        registry.record_dispatch(PickerKind::Object, true, 0.01);
        registry.record_backend_round_trip("b1.local", true, 0.02);
        registry.record_repair_emitted();

        let collector = HarborCollector::new(registry);
        let families = collector.collect();

        assert!(!families.is_empty());
        let metric_names: Vec<String> = families.iter().map(|f| f.get_name().to_string()).collect();
        assert!(metric_names.iter().any(|n| n.contains("dispatch")));
        assert!(metric_names.iter().any(|n| n.contains("backend")));
        assert!(metric_names.iter().any(|n| n.contains("repair")));
    }
}
