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

//! Sticky routing for multipart uploads, via a consistent-hash ring over active backends.

use std::collections::HashMap;
use std::sync::Arc;

use harbor_backend::{Backend, BackendResponse, DispatchError, ProxyRequest};
use tokio::sync::mpsc;
use tracing::debug;

use crate::classify::{is_complete_multipart_request, is_complete_upload_response_successful, is_initiate_request};
use crate::ring::BackendRing;

const CHANNEL_BUFFER: usize = 16;

/// Routes one multipart-upload request to a single backend chosen by a hash ring, then, on a
/// successful complete, emits repair sentinels for every backend that missed the upload.
pub struct MultipartClient {
    by_host: HashMap<String, Arc<Backend>>,
    ring: BackendRing,
    all_backends: Vec<Arc<Backend>>,
}

impl MultipartClient {
    /// Builds a client over `backends`. The ring only includes non-maintenance backends;
    /// `all_backends` is kept so repair sentinels can still target a backend under
    /// maintenance.
    pub fn new(backends: &[Arc<Backend>]) -> Self {
        let mut by_host = HashMap::new();
        let mut active_hosts = Vec::new();

        for backend in backends {
            let host = backend.host();
            if !backend.maintenance {
                active_hosts.push(host.clone());
            }
            by_host.insert(host, Arc::clone(backend));
        }

        Self {
            by_host,
            ring: BackendRing::new(active_hosts),
            all_backends: backends.to_vec(),
        }
    }

    fn has_active_member(&self) -> bool {
        self.all_backends.iter().any(|b| !b.maintenance)
    }

    fn pick_backend(&self, object_path: &str) -> Option<Arc<Backend>> {
        let host = self.ring.get_node(object_path)?;
        self.by_host.get(host).cloned()
    }

    /// Dispatches `req` to its sticky backend, returning a receiver with one primary response
    /// and, if this was a successful complete, one repair sentinel per other backend.
    pub fn do_request(&self, req: ProxyRequest) -> Result<mpsc::Receiver<BackendResponse>, DispatchError> {
        if !self.has_active_member() {
            return Err(DispatchError::NoMultipartTarget);
        }

        let target = self
            .pick_backend(req.path())
            .ok_or(DispatchError::NoMultipartTarget)?;

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
        let others: Vec<Arc<Backend>> = self
            .all_backends
            .iter()
            .filter(|b| b.host() != target.host())
            .cloned()
            .collect();

        tokio::spawn(async move {
            let is_complete = is_complete_multipart_request(&req);
            let is_initiate = is_initiate_request(&req);

            let result = target.round_trip(&req).await;
            let needs_repair_fanout = match &result {
                Ok(resp) => is_complete && !is_initiate && is_complete_upload_response_successful(&req, resp),
                Err(_) => false,
            };

            let primary = match result {
                Ok(resp) => BackendResponse::success(resp, Arc::clone(&target)),
                Err(err) => {
                    debug!(backend = %target.host(), error = %err, "multipart round-trip failed");
                    BackendResponse::failure(err, Arc::clone(&target))
                }
            };
            if tx.send(primary).await.is_err() {
                return;
            }

            if needs_repair_fanout {
                for other in others {
                    let sentinel = BackendResponse::failure(
                        DispatchError::NeedsRepair {
                            backend: other.host(),
                            object_path: req.path().to_string(),
                        },
                        Arc::clone(&other),
                    );
                    if tx.send(sentinel).await.is_err() {
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harbor_backend::transport::{ReqwestTransport, Transport, TransportContainer};
    use http::{HeaderMap, Method};
    use url::Url;

    fn request(method: Method, path_and_query: &str) -> ProxyRequest {
        ProxyRequest {
            method,
            path_and_query: path_and_query.to_string(),
            headers: HeaderMap::new(),
            body: bytes::Bytes::new(),
        }
    }

    #[tokio::test]
    async fn fails_when_no_active_backend_exists() {
        let transports = TransportContainer::with_default(Arc::new(ReqwestTransport::default()));
        let maintenance = Arc::new(Backend::new(Url::parse("http://b1").unwrap(), true, transports));
        let client = MultipartClient::new(&[maintenance]);

        let err = client
            .do_request(request(Method::POST, "/bucket/key?uploads"))
            .unwrap_err();
        assert!(matches!(err, DispatchError::NoMultipartTarget));
    }

    struct StaticTransport(http::StatusCode, &'static str);

    #[async_trait::async_trait]
    impl Transport for StaticTransport {
        async fn execute(
            &self,
            _base_url: &Url,
            _req: &ProxyRequest,
        ) -> Result<harbor_backend::ProxyResponse, String> {
            Ok(harbor_backend::ProxyResponse {
                status: self.0,
                headers: HeaderMap::new(),
                body: bytes::Bytes::from_static(self.1.as_bytes()),
            })
        }
    }

    #[tokio::test]
    async fn same_object_path_routes_to_same_backend_across_calls() {
        let transports = TransportContainer::with_default(Arc::new(StaticTransport(http::StatusCode::OK, "")));
        let b1 = Arc::new(Backend::new(Url::parse("http://b1").unwrap(), false, transports.clone()));
        let b2 = Arc::new(Backend::new(Url::parse("http://b2").unwrap(), false, transports));
        let client = MultipartClient::new(&[b1, b2]);

        let mut rx1 = client
            .do_request(request(Method::PUT, "/bucket/key?partNumber=1&uploadId=abc"))
            .unwrap();
        let first = rx1.recv().await.unwrap().backend.host();

        let mut rx2 = client
            .do_request(request(Method::PUT, "/bucket/key?partNumber=2&uploadId=abc"))
            .unwrap();
        let second = rx2.recv().await.unwrap().backend.host();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn successful_complete_fans_out_repair_sentinels_to_other_backends() {
        let body = r#"<CompleteMultipartUploadResult><Location>http://x/bucket/key</Location></CompleteMultipartUploadResult>"#;
        let transports = TransportContainer::with_default(Arc::new(StaticTransport(http::StatusCode::OK, body)));
        let b1 = Arc::new(Backend::new(Url::parse("http://b1").unwrap(), false, transports.clone()));
        let b2 = Arc::new(Backend::new(Url::parse("http://b2").unwrap(), false, transports));
        let client = MultipartClient::new(&[b1, b2]);

        let mut rx = client
            .do_request(request(Method::POST, "/bucket/key?uploadId=abc"))
            .unwrap();

        let primary = rx.recv().await.unwrap();
        assert!(primary.error.is_none());

        let sentinel = rx.recv().await.unwrap();
        assert!(matches!(sentinel.error, Some(DispatchError::NeedsRepair { .. })));
        assert!(rx.recv().await.is_none());
    }
}
