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

//! Ties request classification, client selection, and response arbitration together.

use std::sync::Arc;

use harbor_backend::{DispatchError, ProxyRequest, ProxyResponse};
use harbor_sync::SyncSender;
use tracing::instrument;

use crate::classify::is_multipart_upload_request;
use crate::multipart::MultipartClient;
use crate::picker::{pick, pick_for, RepairContext};
use crate::replication::ReplicationClient;
use crate::router::{strip_port, Router};

/// Resolves a request's `Host` to a cluster, picks a client and picker for it, and arbitrates
/// the result. One `Dispatcher` is built per configuration generation; reloads build a new
/// one rather than mutating this one (see `harbor-config`'s hot-swap).
pub struct Dispatcher {
    router: Router,
    replication: ReplicationClient,
    sync: Arc<SyncSender>,
}

impl Dispatcher {
    /// Builds a dispatcher over `router`, sending repair records through `sync`.
    pub fn new(router: Router, sync: Arc<SyncSender>) -> Self {
        Self {
            router,
            replication: ReplicationClient::new(),
            sync,
        }
    }

    /// Builds a dispatcher with an explicit replication body-size cap, e.g. one taken from
    /// configuration rather than the default.
    pub fn with_body_limit(router: Router, sync: Arc<SyncSender>, body_limit: usize) -> Self {
        Self {
            router,
            replication: ReplicationClient::with_body_limit(body_limit),
            sync,
        }
    }

    /// Dispatches one inbound request: resolves its cluster, fans it out, and returns the
    /// arbitrated response.
    #[instrument(skip(self, req), fields(request_id = %request_id, host = %host, method = %req.method, path = %req.path()))]
    pub async fn dispatch(
        &self,
        req: ProxyRequest,
        host: &str,
        request_id: String,
    ) -> Result<ProxyResponse, DispatchError> {
        let region = self.router.resolve(strip_port(host))?;
        let cluster = &region.cluster;

        let picker = pick_for(&req.method, req.path());
        let ctx = RepairContext {
            object_path: req.path().to_string(),
            method: req.method.to_string(),
            request_id,
        };

        let rx = if is_multipart_upload_request(&req) {
            MultipartClient::new(&cluster.backends).do_request(req)?
        } else {
            self.replication.do_request(req, &cluster.backends)?
        };

        pick(picker, rx, ctx, Arc::clone(&self.sync)).await
    }

    /// The router this dispatcher resolves hosts against, for admin reporting.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Consumes the dispatcher and closes its sync sender within a bounded grace period.
    /// Call once the listener has stopped accepting connections and in-flight dispatches have
    /// drained, so this is the last owner of the sync sender.
    pub async fn shutdown(self) {
        if let Ok(sync) = Arc::try_unwrap(self.sync) {
            sync.close().await;
        } else {
            tracing::warn!("sync sender still has other owners at shutdown, skipping flush");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{Cluster, Region};
    use harbor_backend::transport::{ReqwestTransport, Transport, TransportContainer};
    use harbor_sync::JsonLinesFileSink;
    use http::{HeaderMap, Method, StatusCode};
    use url::Url;

    struct StaticTransport(StatusCode);

    #[async_trait::async_trait]
    impl Transport for StaticTransport {
        async fn execute(
            &self,
            _base_url: &Url,
            _req: &ProxyRequest,
        ) -> Result<ProxyResponse, String> {
            Ok(ProxyResponse {
                status: self.0,
                headers: HeaderMap::new(),
                body: bytes::Bytes::new(),
            })
        }
    }

    async fn dispatcher_with(status: StatusCode) -> Dispatcher {
        let transports = TransportContainer::with_default(Arc::new(StaticTransport(status)));
        let backend = Arc::new(harbor_backend::Backend::new(
            Url::parse("http://b1").unwrap(),
            false,
            transports,
        ));
        let cluster = Arc::new(Cluster {
            name: "primary".into(),
            backends: vec![backend],
        });
        let mut router = Router::new();
        router.bind(
            "s3.example.com",
            Region {
                name: "us-east".into(),
                cluster,
            },
        );

        let dir = tempfile::tempdir().unwrap();
        let sync = Arc::new(SyncSender::new(Arc::new(JsonLinesFileSink::new(dir.path().join("r.jsonl")))));
        Dispatcher::new(router, sync)
    }

    fn request(method: Method, path: &str) -> ProxyRequest {
        ProxyRequest {
            method,
            path_and_query: path.to_string(),
            headers: HeaderMap::new(),
            body: bytes::Bytes::new(),
        }
    }

    #[tokio::test]
    async fn dispatch_rejects_unknown_host_before_any_backend_io() {
        let dispatcher = dispatcher_with(StatusCode::OK).await;
        let err = dispatcher
            .dispatch(request(Method::GET, "/bucket/key"), "other.example.com", "req-1".into())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownHost(_)));
    }

    #[tokio::test]
    async fn dispatch_resolves_host_and_returns_backend_response() {
        let dispatcher = dispatcher_with(StatusCode::OK).await;
        let resp = dispatcher
            .dispatch(request(Method::GET, "/bucket/key"), "s3.example.com:443", "req-1".into())
            .await
            .unwrap();
        assert_eq!(resp.status, StatusCode::OK);
    }
}
