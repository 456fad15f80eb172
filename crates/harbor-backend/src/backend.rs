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

//! A single S3-speaking endpoint: identity, signing, and the HTTP round-trip.

use std::sync::Arc;

use url::Url;

use crate::error::DispatchError;
use crate::message::{ProxyRequest, ProxyResponse};
use crate::transport::{passthrough_decorator, RequestDecorator, TransportContainer};

/// A single storage endpoint, immutable after construction.
///
/// `Backend` is cheap to clone (everything inside is `Arc`-backed) and is shared across
/// concurrent requests; config reloads build a fresh set rather than mutating one in place.
#[derive(Clone)]
pub struct Backend {
    /// The backend's base URL. Its host is the stable identity used by the hash ring and
    /// repair records.
    pub endpoint: Url,
    /// Excludes this backend from active hash rings and replication fan-out, but it still
    /// appears in the full backend list so repair records can target it.
    pub maintenance: bool,
    transports: TransportContainer,
    decorator: RequestDecorator,
}

impl Backend {
    /// Builds a new backend. `decorator` composes signing around whichever transport the
    /// container selects; pass [`passthrough_decorator`] for unsigned backends.
    pub fn new(endpoint: Url, maintenance: bool, transports: TransportContainer) -> Self {
        Self {
            endpoint,
            maintenance,
            transports,
            decorator: passthrough_decorator(),
        }
    }

    /// Replaces the signing decorator, e.g. with one from `harbor-auth`.
    pub fn with_decorator(mut self, decorator: RequestDecorator) -> Self {
        self.decorator = decorator;
        self
    }

    /// The backend's host, used as its identity on the hash ring and in repair records.
    pub fn host(&self) -> String {
        self.endpoint
            .host_str()
            .map(|h| match self.endpoint.port() {
                Some(p) => format!("{h}:{p}"),
                None => h.to_string(),
            })
            .unwrap_or_default()
    }

    /// Performs the HTTP round-trip: selects a transport, decorates it, and dispatches.
    ///
    /// Host rewrite happens inside the selected [`crate::transport::Transport`] (it builds
    /// the outbound URL from this backend's endpoint, not the caller's). On transport
    /// failure the error is wrapped with this backend's host so pickers and logs can
    /// attribute it.
    pub async fn round_trip(&self, req: &ProxyRequest) -> Result<ProxyResponse, DispatchError> {
        let base_transport = self.transports.select(req)?;
        let transport = (self.decorator)(base_transport);

        transport
            .execute(&self.endpoint, req)
            .await
            .map_err(|cause| DispatchError::Backend {
                backend: self.host(),
                cause,
            })
    }
}

/// The outcome of dispatching a single request to a single backend.
///
/// Exactly one of `response` / `error` is populated, with the sole exception of the
/// [`DispatchError::NeedsRepair`] sentinel, which has no accompanying response. `backend` is
/// always set so pickers and the sync-drainer can attribute both successes and failures.
#[derive(Clone)]
pub struct BackendResponse {
    /// The backend's reply, if the round-trip succeeded.
    pub response: Option<ProxyResponse>,
    /// The failure (or repair sentinel), if the round-trip did not produce a response.
    pub error: Option<DispatchError>,
    /// The backend this result came from.
    pub backend: Arc<Backend>,
}

impl BackendResponse {
    /// Wraps a successful round-trip.
    pub fn success(response: ProxyResponse, backend: Arc<Backend>) -> Self {
        Self {
            response: Some(response),
            error: None,
            backend,
        }
    }

    /// Wraps a failed round-trip.
    pub fn failure(error: DispatchError, backend: Arc<Backend>) -> Self {
        Self {
            response: None,
            error: Some(error),
            backend,
        }
    }

    /// True if this entry carries a real response with a status below 400.
    pub fn is_successful(&self) -> bool {
        self.response
            .as_ref()
            .map(ProxyResponse::is_ok_for_arbitration)
            .unwrap_or(false)
    }
}
