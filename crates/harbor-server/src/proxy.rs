//! The reverse-proxy HTTP surface: translates an inbound request into a [`ProxyRequest`],
//! dispatches it, and translates the arbitrated [`ProxyResponse`] back into an HTTP response.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Request, State},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use http::StatusCode;
use tower_http::trace::TraceLayer;
use tracing::{error, instrument};

use harbor_backend::ProxyRequest;
use harbor_dispatch::pick_for;
use harbor_metrics::PickerKind;

use crate::state::AppState;

/// Builds the proxy router: every path and method funnels through [`dispatch_handler`].
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/{*path}", any(dispatch_handler))
        .route("/", any(dispatch_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn picker_kind(method: &http::Method, path: &str) -> PickerKind {
    match pick_for(method, path) {
        harbor_dispatch::Picker::Object => PickerKind::Object,
        harbor_dispatch::Picker::Delete => PickerKind::Delete,
        harbor_dispatch::Picker::BucketList => PickerKind::BucketList,
    }
}

#[instrument(skip(state, request))]
async fn dispatch_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let host = match request
        .headers()
        .get(http::header::HOST)
        .and_then(|h| h.to_str().ok())
    {
        Some(host) => host.to_string(),
        None => return (StatusCode::BAD_REQUEST, "missing Host header").into_response(),
    };

    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "failed to buffer request body");
            return (StatusCode::BAD_REQUEST, "failed to read request body").into_response();
        }
    };

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    let mut headers = parts.headers.clone();
    headers.remove(http::header::HOST);

    let method = parts.method.clone();
    let picker = picker_kind(&method, &path_and_query);

    let req = ProxyRequest {
        method,
        path_and_query,
        headers,
        body: body_bytes,
    };

    let request_id = state.next_request_id();
    let dispatcher = state.config.current();
    let started = Instant::now();

    match dispatcher.dispatch(req, &host, request_id).await {
        Ok(resp) => {
            state
                .metrics
                .record_dispatch(picker, resp.is_success(), started.elapsed().as_secs_f64());
            proxy_response_to_http(resp)
        }
        Err(err) => {
            state
                .metrics
                .record_dispatch(picker, false, started.elapsed().as_secs_f64());
            error!(error = %err, "dispatch failed");
            dispatch_error_to_http(err)
        }
    }
}

fn proxy_response_to_http(resp: harbor_backend::ProxyResponse) -> Response {
    let status = resp.status;
    let headers = resp.headers;

    let mut builder = Response::builder().status(status);
    if let Some(response_headers) = builder.headers_mut() {
        *response_headers = headers;
    }
    builder.body(Body::from(resp.body)).unwrap_or_else(|e| {
        error!(error = %e, "failed to build response");
        (StatusCode::INTERNAL_SERVER_ERROR, "failed to build response").into_response()
    })
}

fn dispatch_error_to_http(err: harbor_backend::DispatchError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, err.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use harbor_backend::transport::{ReqwestTransport, TransportContainer};
    use harbor_backend::{Backend, ProxyResponse};
    use harbor_config::ConfigHandle;
    use harbor_dispatch::{Cluster, Dispatcher, Region, Router};
    use harbor_metrics::MetricsRegistry;
    use harbor_sync::{JsonLinesFileSink, SyncSender};
    use http::{Method, Request as HttpRequest};
    use tower::ServiceExt;
    use url::Url;

    struct StaticTransport(StatusCode);

    #[async_trait::async_trait]
    impl harbor_backend::transport::Transport for StaticTransport {
        async fn execute(
            &self,
            _base_url: &Url,
            _req: &ProxyRequest,
        ) -> Result<ProxyResponse, String> {
            Ok(ProxyResponse {
                status: self.0,
                headers: http::HeaderMap::new(),
                body: bytes::Bytes::from_static(b"ok"),
            })
        }
    }

    fn app() -> Router {
        let transports =
            TransportContainer::with_default(Arc::new(StaticTransport(StatusCode::OK)));
        let backend = Arc::new(Backend::new(Url::parse("http://b1").unwrap(), false, transports));
        let cluster = Arc::new(Cluster { name: "primary".into(), backends: vec![backend] });
        let mut router = Router::new();
        router.bind("s3.example.com", Region { name: "us-east".into(), cluster });

        let dir = tempfile::tempdir().unwrap();
        let sync = Arc::new(SyncSender::new(Arc::new(JsonLinesFileSink::new(dir.path().join("r.jsonl")))));
        let dispatcher = Dispatcher::new(router, sync);

        let state = Arc::new(crate::state::AppState::new(
            ConfigHandle::new(dispatcher),
            MetricsRegistry::new().unwrap(),
        ));
        create_router(state)
    }

    #[tokio::test]
    async fn dispatches_a_request_to_its_backend() {
        let response = app()
            .oneshot(
                HttpRequest::builder()
                    .method(Method::GET)
                    .uri("/bucket/key")
                    .header("host", "s3.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_host_is_not_found() {
        let response = app()
            .oneshot(
                HttpRequest::builder()
                    .method(Method::GET)
                    .uri("/bucket/key")
                    .header("host", "other.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_host_header_is_bad_request() {
        let response = app()
            .oneshot(
                HttpRequest::builder()
                    .method(Method::GET)
                    .uri("/bucket/key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
