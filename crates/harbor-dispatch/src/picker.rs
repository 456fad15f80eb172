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

//! Arbitrates between concurrent backend replies and reports divergence for repair.

use std::sync::Arc;

use chrono::Utc;
use harbor_backend::{BackendResponse, DispatchError, ProxyResponse};
use harbor_sync::{RepairRecord, SyncSender};
use tracing::{debug, warn};

use crate::classify::is_bucket_path;

/// Which picker arbitrates a request's backend responses, chosen once per dispatch by
/// [`pick_for`].
pub enum Picker {
    /// First success wins; otherwise lowest status >= 400, tie-broken by arrival order.
    Object,
    /// All backends must answer; success iff every one returned 2xx or 404.
    Delete,
    /// First 2xx wins; other successes are discarded without repair.
    BucketList,
}

/// Selects the picker for a request per the routing rules: bucket path + non-PUT → bucket
/// list; bucket path + PUT, or any DELETE → delete; otherwise object.
pub fn pick_for(method: &http::Method, path: &str) -> Picker {
    let bucket = is_bucket_path(path);
    if bucket && *method != http::Method::PUT {
        Picker::BucketList
    } else if (bucket && *method == http::Method::PUT) || *method == http::Method::DELETE {
        Picker::Delete
    } else {
        Picker::Object
    }
}

/// Metadata needed to turn a divergence into a [`RepairRecord`].
#[derive(Clone)]
pub struct RepairContext {
    /// Path of the object the request addressed.
    pub object_path: String,
    /// HTTP method of the request.
    pub method: String,
    /// Request ID to correlate the repair with logs.
    pub request_id: String,
}

fn repair_record(ctx: &RepairContext, source_backend: &str, target_backend: &str) -> RepairRecord {
    RepairRecord {
        object_path: ctx.object_path.clone(),
        source_backend: source_backend.to_string(),
        target_backend: target_backend.to_string(),
        method: ctx.method.clone(),
        request_id: ctx.request_id.clone(),
        timestamp: Utc::now(),
    }
}

/// Drains `rx` according to `picker`, returns the chosen response (or the terminal error),
/// and forwards any divergence to `sync` as repair records.
pub async fn pick(
    picker: Picker,
    mut rx: tokio::sync::mpsc::Receiver<BackendResponse>,
    ctx: RepairContext,
    sync: Arc<SyncSender>,
) -> Result<ProxyResponse, DispatchError> {
    match picker {
        Picker::Object => pick_object(&mut rx, &ctx, &sync).await,
        Picker::Delete => pick_delete(&mut rx, &ctx, &sync).await,
        Picker::BucketList => pick_bucket_list(&mut rx).await,
    }
}

async fn pick_object(
    rx: &mut tokio::sync::mpsc::Receiver<BackendResponse>,
    ctx: &RepairContext,
    sync: &SyncSender,
) -> Result<ProxyResponse, DispatchError> {
    let mut chosen: Option<BackendResponse> = None;
    let mut best_error: Option<BackendResponse> = None;
    let mut others = Vec::new();
    let mut needs_repair = Vec::new();

    while let Some(entry) = rx.recv().await {
        if let Some(err) = &entry.error {
            if err.is_needs_repair() {
                // A multipart complete already decided this backend needs repair; the
                // source is whichever backend wins below, always the upload's target.
                needs_repair.push(entry);
                continue;
            }
        }

        if entry.is_successful() {
            if chosen.is_none() {
                chosen = Some(entry);
            } else {
                others.push(entry);
            }
            continue;
        }

        let candidate_status = entry
            .response
            .as_ref()
            .map(|r| r.status.as_u16())
            .unwrap_or(502);
        let keep = match &best_error {
            None => true,
            Some(current) => {
                let current_status = current.response.as_ref().map(|r| r.status.as_u16()).unwrap_or(502);
                candidate_status < current_status
            }
        };
        if keep && chosen.is_none() {
            if let Some(previous) = best_error.replace(entry) {
                others.push(previous);
            }
        } else {
            others.push(entry);
        }
    }

    let winner = match chosen {
        Some(winner) => {
            // A divergent error held as the best-so-far before the first success arrived
            // never made it into `others`; fold it in now so it still gets a repair record.
            if let Some(held_error) = best_error {
                others.push(held_error);
            }
            winner
        }
        None => best_error.ok_or_else(|| {
            warn!("object picker drained channel with no responses at all");
            DispatchError::NoActiveBackends
        })?,
    };

    for sentinel in needs_repair {
        sync.send(repair_record(ctx, &winner.backend.host(), &sentinel.backend.host()));
    }

    let winner_class = winner.response.as_ref().map(|r| r.status.as_u16() / 100);
    for other in others {
        let other_class = other.response.as_ref().map(|r| r.status.as_u16() / 100);
        if other_class != winner_class {
            debug!(backend = %other.backend.host(), "response diverged from picked backend, scheduling repair");
            sync.send(repair_record(ctx, &winner.backend.host(), &other.backend.host()));
        }
    }

    match winner.response {
        Some(response) => Ok(response),
        None => Err(winner.error.unwrap_or(DispatchError::NoActiveBackends)),
    }
}

async fn pick_delete(
    rx: &mut tokio::sync::mpsc::Receiver<BackendResponse>,
    ctx: &RepairContext,
    sync: &SyncSender,
) -> Result<ProxyResponse, DispatchError> {
    let mut entries = Vec::new();
    while let Some(entry) = rx.recv().await {
        entries.push(entry);
    }

    let is_acceptable = |resp: &ProxyResponse| resp.is_success() || resp.status.as_u16() == 404;

    let mut first_failure: Option<&BackendResponse> = None;
    for entry in &entries {
        let acceptable = entry.response.as_ref().map(is_acceptable).unwrap_or(false);
        if !acceptable && first_failure.is_none() {
            first_failure = Some(entry);
        }
    }

    if let Some(failure) = first_failure {
        for entry in &entries {
            let acceptable = entry.response.as_ref().map(is_acceptable).unwrap_or(false);
            if !acceptable {
                sync.send(repair_record(ctx, "delete-quorum", &entry.backend.host()));
            }
        }
        return match &failure.response {
            Some(resp) => Ok(resp.clone()),
            None => Err(failure
                .error
                .clone()
                .unwrap_or(DispatchError::NoActiveBackends)),
        };
    }

    entries
        .into_iter()
        .find_map(|e| e.response)
        .ok_or(DispatchError::NoActiveBackends)
}

async fn pick_bucket_list(
    rx: &mut tokio::sync::mpsc::Receiver<BackendResponse>,
) -> Result<ProxyResponse, DispatchError> {
    let mut fallback_response = None;
    let mut fallback_error = None;
    while let Some(entry) = rx.recv().await {
        match entry.response {
            Some(response) => {
                if response.is_success() {
                    return Ok(response);
                }
                fallback_response.get_or_insert(response);
            }
            None => {
                if let Some(err) = entry.error {
                    fallback_error.get_or_insert(err);
                }
            }
        }
    }
    match fallback_response {
        Some(response) => Ok(response),
        None => Err(fallback_error.unwrap_or(DispatchError::NoActiveBackends)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harbor_backend::Backend;
    use harbor_backend::transport::{ReqwestTransport, TransportContainer};
    use harbor_sync::JsonLinesFileSink;
    use http::{HeaderMap, StatusCode};
    use url::Url;

    fn backend(host: &str) -> Arc<Backend> {
        let transports = TransportContainer::with_default(Arc::new(ReqwestTransport::default()));
        Arc::new(Backend::new(Url::parse(&format!("http://{host}")).unwrap(), false, transports))
    }

    fn response(status: StatusCode) -> ProxyResponse {
        ProxyResponse {
            status,
            headers: HeaderMap::new(),
            body: bytes::Bytes::new(),
        }
    }

    fn ctx() -> RepairContext {
        RepairContext {
            object_path: "/bucket/key".into(),
            method: "GET".into(),
            request_id: "req-1".into(),
        }
    }

    async fn sync_sender() -> Arc<SyncSender> {
        let dir = tempfile::tempdir().unwrap();
        Arc::new(SyncSender::new(Arc::new(JsonLinesFileSink::new(dir.path().join("repair.jsonl")))))
    }

    #[test]
    fn routing_picks_bucket_list_for_bucket_get() {
        assert!(matches!(
            pick_for(&http::Method::GET, "/mybucket"),
            Picker::BucketList
        ));
    }

    #[test]
    fn routing_picks_delete_for_bucket_put() {
        assert!(matches!(pick_for(&http::Method::PUT, "/mybucket"), Picker::Delete));
    }

    #[test]
    fn routing_picks_delete_for_delete_method() {
        assert!(matches!(
            pick_for(&http::Method::DELETE, "/mybucket/key"),
            Picker::Delete
        ));
    }

    #[test]
    fn routing_picks_object_for_plain_get() {
        assert!(matches!(
            pick_for(&http::Method::GET, "/mybucket/key"),
            Picker::Object
        ));
    }

    #[tokio::test]
    async fn object_picker_returns_first_success() {
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        tx.send(BackendResponse::success(response(StatusCode::OK), backend("b1")))
            .await
            .unwrap();
        tx.send(BackendResponse::success(response(StatusCode::OK), backend("b2")))
            .await
            .unwrap();
        drop(tx);

        let sync = sync_sender().await;
        let resp = pick(Picker::Object, rx, ctx(), sync).await.unwrap();
        assert_eq!(resp.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn object_picker_falls_back_to_lowest_error_status() {
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        tx.send(BackendResponse::success(response(StatusCode::INTERNAL_SERVER_ERROR), backend("b1")))
            .await
            .unwrap();
        tx.send(BackendResponse::success(response(StatusCode::NOT_FOUND), backend("b2")))
            .await
            .unwrap();
        drop(tx);

        let sync = sync_sender().await;
        let resp = pick(Picker::Object, rx, ctx(), sync).await.unwrap();
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn object_picker_repairs_divergent_error_received_before_first_success() {
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        // The 404 arrives before either success, so it is held in `best_error` first.
        tx.send(BackendResponse::success(response(StatusCode::NOT_FOUND), backend("b3")))
            .await
            .unwrap();
        tx.send(BackendResponse::success(response(StatusCode::OK), backend("b1")))
            .await
            .unwrap();
        tx.send(BackendResponse::success(response(StatusCode::OK), backend("b2")))
            .await
            .unwrap();
        drop(tx);

        let dir = tempfile::tempdir().unwrap();
        let sink_path = dir.path().join("repair.jsonl");
        let sync = Arc::new(SyncSender::new(Arc::new(JsonLinesFileSink::new(&sink_path))));
        let resp = pick(Picker::Object, rx, ctx(), sync.clone()).await.unwrap();
        assert_eq!(resp.status, StatusCode::OK);

        drop(sync);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let contents = std::fs::read_to_string(&sink_path).unwrap_or_default();
        assert!(
            contents.contains("b3"),
            "expected a repair record targeting b3, got: {contents}"
        );
    }

    #[tokio::test]
    async fn object_picker_repairs_transport_error_received_before_first_success() {
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        tx.send(BackendResponse::failure(
            DispatchError::Backend { backend: "b2".into(), cause: "connection reset".into() },
            backend("b2"),
        ))
        .await
        .unwrap();
        tx.send(BackendResponse::success(response(StatusCode::OK), backend("b1")))
            .await
            .unwrap();
        drop(tx);

        let dir = tempfile::tempdir().unwrap();
        let sink_path = dir.path().join("repair.jsonl");
        let sync = Arc::new(SyncSender::new(Arc::new(JsonLinesFileSink::new(&sink_path))));
        let resp = pick(Picker::Object, rx, ctx(), sync.clone()).await.unwrap();
        assert_eq!(resp.status, StatusCode::OK);

        drop(sync);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let contents = std::fs::read_to_string(&sink_path).unwrap_or_default();
        assert!(
            contents.contains("b2"),
            "expected a repair record targeting b2, got: {contents}"
        );
    }

    #[tokio::test]
    async fn bucket_list_picker_finds_later_success_after_early_error() {
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        tx.send(BackendResponse::failure(
            DispatchError::Backend { backend: "b3".into(), cause: "connection reset".into() },
            backend("b3"),
        ))
        .await
        .unwrap();
        tx.send(BackendResponse::success(response(StatusCode::OK), backend("b1")))
            .await
            .unwrap();
        tx.send(BackendResponse::success(response(StatusCode::OK), backend("b2")))
            .await
            .unwrap();
        drop(tx);

        let mut rx = rx;
        let resp = pick_bucket_list(&mut rx).await.unwrap();
        assert_eq!(resp.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn delete_picker_succeeds_when_all_respond_2xx_or_404() {
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        tx.send(BackendResponse::success(response(StatusCode::OK), backend("b1")))
            .await
            .unwrap();
        tx.send(BackendResponse::success(response(StatusCode::NOT_FOUND), backend("b2")))
            .await
            .unwrap();
        drop(tx);

        let sync = sync_sender().await;
        let resp = pick(Picker::Delete, rx, ctx(), sync).await.unwrap();
        assert!(resp.is_success());
    }

    #[tokio::test]
    async fn delete_picker_fails_on_any_non_idempotent_error() {
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        tx.send(BackendResponse::success(response(StatusCode::OK), backend("b1")))
            .await
            .unwrap();
        tx.send(
            BackendResponse::success(response(StatusCode::INTERNAL_SERVER_ERROR), backend("b2")),
        )
        .await
        .unwrap();
        drop(tx);

        let sync = sync_sender().await;
        let resp = pick(Picker::Delete, rx, ctx(), sync).await.unwrap();
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn bucket_list_picker_returns_first_2xx_and_ignores_others() {
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        tx.send(BackendResponse::success(response(StatusCode::OK), backend("b1")))
            .await
            .unwrap();
        tx.send(BackendResponse::success(response(StatusCode::OK), backend("b2")))
            .await
            .unwrap();
        drop(tx);

        let mut rx = rx;
        let resp = pick_bucket_list(&mut rx).await.unwrap();
        assert_eq!(resp.status, StatusCode::OK);
    }
}
