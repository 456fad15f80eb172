//! Common types for metrics collection and the admin endpoint.

use serde::{Deserialize, Serialize};

/// Configuration for the admin HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Port for the admin HTTP server.
    pub port: u16,

    /// Enable the admin server.
    pub enabled: bool,

    /// Bind address (default: 127.0.0.1).
    pub bind_address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: 9090,
            enabled: false,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

impl MetricsConfig {
    /// Create new config with port.
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            enabled: true,
            ..Default::default()
        }
    }

    /// Get bind address with port.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Which arbitration strategy a dispatch used, for labeling dispatch metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickerKind {
    /// Object picker: first success wins, else lowest status with arrival-order tiebreak.
    Object,
    /// Delete picker: succeeds only if every backend agrees.
    Delete,
    /// Bucket-list picker: first success wins, no repair on divergence.
    BucketList,
}

impl PickerKind {
    /// String label for Prometheus.
    pub fn as_label(&self) -> &'static str {
        match self {
            PickerKind::Object => "object",
            PickerKind::Delete => "delete",
            PickerKind::BucketList => "bucket_list",
        }
    }
}

/// One configured backend's current status, for the `/status` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendStatus {
    /// Backend host, as used in repair records and metric labels.
    pub host: String,
    /// Cluster this backend belongs to.
    pub cluster: String,
    /// Whether the backend is currently excluded from active routing.
    pub maintenance: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_config_default() {
        let config = MetricsConfig::default();
        assert_eq!(config.port, 9090);
        assert!(!config.enabled);
        assert_eq!(config.bind_address, "127.0.0.1");
    }

    #[test]
    fn test_metrics_config_with_port() {
        let config = MetricsConfig::with_port(8080);
        assert_eq!(config.port, 8080);
        assert!(config.enabled);
        assert_eq!(config.socket_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_picker_kind_labels() {
        assert_eq!(PickerKind::Object.as_label(), "object");
        assert_eq!(PickerKind::Delete.as_label(), "delete");
        assert_eq!(PickerKind::BucketList.as_label(), "bucket_list");
    }
}
