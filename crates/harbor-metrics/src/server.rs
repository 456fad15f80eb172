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

//! Admin HTTP server: `/metrics`, `/healthz`, `/status`.
//!
//! Bound to a separate address from the main proxy listener so operators can probe it even
//! when the proxy itself is overloaded.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::types::{BackendStatus, MetricsConfig};
use crate::MetricsRegistry;

/// Supplies the current backend list for `/status`. Implemented by whatever holds the live
/// [`harbor_config`]-style configuration handle; kept as a trait here so this crate doesn't
/// need to depend on config or dispatch types.
pub trait StatusProvider: Send + Sync {
    /// Every configured backend's current status.
    fn backend_statuses(&self) -> Vec<BackendStatus>;
}

struct AdminState {
    registry: Arc<MetricsRegistry>,
    status: Arc<dyn StatusProvider>,
}

/// The admin HTTP server.
#[derive(Clone)]
pub struct MetricsServer {
    state: Arc<AdminState>,
    config: MetricsConfig,
}

impl MetricsServer {
    /// Create a new admin server bound to `port`.
    pub fn new(registry: MetricsRegistry, status: Arc<dyn StatusProvider>, port: u16) -> Self {
        Self {
            state: Arc::new(AdminState {
                registry: Arc::new(registry),
                status,
            }),
            config: MetricsConfig::with_port(port),
        }
    }

    /// Create a new admin server with custom configuration.
    pub fn with_config(registry: MetricsRegistry, status: Arc<dyn StatusProvider>, config: MetricsConfig) -> Self {
        Self {
            state: Arc::new(AdminState {
                registry: Arc::new(registry),
                status,
            }),
            config,
        }
    }

    /// Get the bind address for the server.
    pub fn bind_address(&self) -> String {
        self.config.socket_addr()
    }

    /// Start the admin server. Runs indefinitely; spawn it as a background task.
    pub async fn serve(self) -> anyhow::Result<()> {
        if !self.config.enabled {
            info!("admin server disabled");
            return Ok(());
        }

        let addr = self.config.socket_addr();
        info!("starting admin server on http://{addr}");

        let app = Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/healthz", get(healthz_handler))
            .route("/status", get(status_handler))
            .with_state(self.state);

        let listener = TcpListener::bind(&addr).await?;
        info!("admin server listening on {addr}");

        axum::serve(listener, app)
            .await
            .map_err(|e| anyhow::anyhow!("admin server error: {e}"))
    }
}

async fn metrics_handler(State(state): State<Arc<AdminState>>) -> Response {
    debug!("serving /metrics");

    let metric_families = state.registry.registry().gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (StatusCode::OK, [("content-type", encoder.format_type())], buffer).into_response(),
        Err(e) => {
            error!("failed to encode metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("failed to encode metrics: {e}")).into_response()
        }
    }
}

async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn status_handler(State(state): State<Arc<AdminState>>) -> impl IntoResponse {
    let backends = state.status.backend_statuses();
    Json(backends)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PickerKind;
    use std::time::Duration;
    use tokio::time::sleep;

    struct FixedStatus(Vec<BackendStatus>);

    impl StatusProvider for FixedStatus {
        fn backend_statuses(&self) -> Vec<BackendStatus> {
            self.0.clone()
        }
    }

    fn status() -> Arc<dyn StatusProvider> {
        Arc::new(FixedStatus(vec![BackendStatus {
            host: "b1.local".into(),
            cluster: "primary".into(),
            maintenance: false,
        }]))
    }

    #[tokio::test]
    async fn test_server_creation() {
        let registry = MetricsRegistry::new().unwrap();
        let server = MetricsServer::new(registry, status(), 9191);
        assert_eq!(server.bind_address(), "127.0.0.1:9191");
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let registry = MetricsRegistry::new().unwrap();
        registry.record_dispatch(PickerKind::Object, true, 0.01);

        let server = MetricsServer::new(registry, status(), 19090);
        let addr = server.bind_address().clone();

        tokio::spawn(async move {
            let _ = server.serve().await;
        });
        sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        if let Ok(response) = client.get(format!("http://{addr}/metrics")).send().await {
            assert_eq!(response.status(), StatusCode::OK);
            let body = response.text().await.unwrap();
            assert!(body.contains("harbor_dispatch_total"));
        }
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let registry = MetricsRegistry::new().unwrap();
        let server = MetricsServer::new(registry, status(), 19092);
        let addr = server.bind_address().clone();

        tokio::spawn(async move {
            let _ = server.serve().await;
        });
        sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        if let Ok(response) = client.get(format!("http://{addr}/status")).send().await {
            assert_eq!(response.status(), StatusCode::OK);
            let body = response.text().await.unwrap();
            assert!(body.contains("b1.local"));
        }
    }

    #[tokio::test]
    async fn test_disabled_server_returns_immediately() {
        let registry = MetricsRegistry::new().unwrap();
        let config = MetricsConfig {
            port: 9092,
            enabled: false,
            bind_address: "127.0.0.1".into(),
        };
        let server = MetricsServer::with_config(registry, status(), config);
        assert!(server.serve().await.is_ok());
    }
}
