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

//! Fans a request out to every backend concurrently.

use std::sync::Arc;

use harbor_backend::{Backend, BackendResponse, DispatchError, ProxyRequest};
use tokio::sync::mpsc;
use tracing::debug;

const CHANNEL_BUFFER: usize = 16;

/// Default cap on the request body accepted for replication, past which every backend would
/// need to buffer a copy. 5 MiB matches the threshold used elsewhere in the fleet for
/// object-level writes.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 5 * 1024 * 1024;

/// Sends `req` to every backend in `backends` concurrently.
///
/// Maintenance backends are skipped entirely (no entry is emitted for them — the object
/// picker only needs real candidates, and emitting a synthetic skip record for every
/// maintenance backend on every request would just add picker-side noise). If the body
/// exceeds `body_limit`, no backend is contacted and the call fails outright.
pub struct ReplicationClient {
    body_limit: usize,
}

impl ReplicationClient {
    /// A client capped at [`DEFAULT_BODY_LIMIT_BYTES`].
    pub fn new() -> Self {
        Self {
            body_limit: DEFAULT_BODY_LIMIT_BYTES,
        }
    }

    /// A client capped at an explicit body size.
    pub fn with_body_limit(body_limit: usize) -> Self {
        Self { body_limit }
    }

    /// Dispatches `req` to every active backend, returning a receiver that yields one
    /// [`BackendResponse`] per contacted backend before closing.
    pub fn do_request(
        &self,
        req: ProxyRequest,
        backends: &[Arc<Backend>],
    ) -> Result<mpsc::Receiver<BackendResponse>, DispatchError> {
        if req.body.len() > self.body_limit {
            return Err(DispatchError::BodyTooLargeForReplication {
                size: req.body.len(),
                limit: self.body_limit,
            });
        }

        let active: Vec<Arc<Backend>> = backends.iter().filter(|b| !b.maintenance).cloned().collect();
        if active.is_empty() {
            return Err(DispatchError::NoActiveBackends);
        }

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
        let req = Arc::new(req);

        for backend in active {
            let tx = tx.clone();
            let req = Arc::clone(&req);
            tokio::spawn(async move {
                let result = backend.round_trip(&req).await;
                let response = match result {
                    Ok(response) => BackendResponse::success(response, Arc::clone(&backend)),
                    Err(err) => {
                        debug!(backend = %backend.host(), error = %err, "backend round-trip failed");
                        BackendResponse::failure(err, Arc::clone(&backend))
                    }
                };
                let _ = tx.send(response).await;
            });
        }
        // Dropping our own `tx` lets the channel close once every spawned task's clone is
        // dropped, rather than staying open for the lifetime of the client.
        drop(tx);

        Ok(rx)
    }
}

impl Default for ReplicationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harbor_backend::transport::{ReqwestTransport, Transport, TransportContainer};
    use http::{HeaderMap, Method};
    use url::Url;

    fn backend(host: &str) -> Arc<Backend> {
        let transports = TransportContainer::with_default(Arc::new(ReqwestTransport::default()));
        Arc::new(Backend::new(Url::parse(&format!("http://{host}")).unwrap(), false, transports))
    }

    fn request() -> ProxyRequest {
        ProxyRequest {
            method: Method::GET,
            path_and_query: "/bucket/key".into(),
            headers: HeaderMap::new(),
            body: bytes::Bytes::new(),
        }
    }

    #[tokio::test]
    async fn rejects_oversized_body_before_contacting_any_backend() {
        let client = ReplicationClient::with_body_limit(4);
        let mut req = request();
        req.body = bytes::Bytes::from_static(b"too big");
        let err = client.do_request(req, &[backend("b1")]).unwrap_err();
        assert!(matches!(err, DispatchError::BodyTooLargeForReplication { .. }));
    }

    #[tokio::test]
    async fn fails_when_every_backend_is_under_maintenance() {
        let transports = TransportContainer::with_default(Arc::new(ReqwestTransport::default()));
        let b = Arc::new(Backend::new(
            Url::parse("http://b1").unwrap(),
            true,
            transports,
        ));
        let client = ReplicationClient::new();
        let err = client.do_request(request(), &[b]).unwrap_err();
        assert!(matches!(err, DispatchError::NoActiveBackends));
    }

    struct FailingTransport;

    #[async_trait::async_trait]
    impl Transport for FailingTransport {
        async fn execute(
            &self,
            _base_url: &Url,
            _req: &ProxyRequest,
        ) -> Result<harbor_backend::ProxyResponse, String> {
            Err("connection refused".into())
        }
    }

    #[tokio::test]
    async fn emits_one_response_per_active_backend() {
        let transports = TransportContainer::with_default(Arc::new(FailingTransport));
        let b1 = Arc::new(Backend::new(Url::parse("http://b1").unwrap(), false, transports.clone()));
        let b2 = Arc::new(Backend::new(Url::parse("http://b2").unwrap(), false, transports));

        let client = ReplicationClient::new();
        let mut rx = client.do_request(request(), &[b1, b2]).unwrap();

        let mut seen = Vec::new();
        while let Some(resp) = rx.recv().await {
            seen.push(resp.backend.host());
        }
        seen.sort();
        assert_eq!(seen, vec!["b1".to_string(), "b2".to_string()]);
    }
}
