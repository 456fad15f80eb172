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

//! Mock storage backends and dispatcher wiring for integration tests.
//!
//! Builds the same `Cluster` / `Router` / `Dispatcher` graph `harbor-config` assembles from a
//! configuration file, but over in-process `wiremock` servers instead of real S3-compatible
//! endpoints.

use std::path::PathBuf;
use std::sync::Arc;

use harbor_backend::transport::{ReqwestTransport, TransportContainer};
use harbor_backend::Backend;
use harbor_dispatch::{Cluster, Dispatcher, Region, Router};
use harbor_sync::{JsonLinesFileSink, SyncSender};
use tempfile::TempDir;
use url::Url;
use wiremock::MockServer;

/// A running mock storage endpoint.
///
/// Wraps a [`wiremock::MockServer`]; register expectations on [`MockBackend::server`] before
/// wiring it into a cluster.
pub struct MockBackend {
    server: MockServer,
}

impl MockBackend {
    /// Starts a fresh mock server listening on a random local port.
    pub async fn start() -> Self {
        Self { server: MockServer::start().await }
    }

    /// The underlying `wiremock` server, for registering `Mock::given(...)` expectations.
    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// The mock server's base URL.
    pub fn url(&self) -> Url {
        Url::parse(&self.server.uri()).expect("wiremock URI is always a valid URL")
    }

    /// `host:port` identity, matching what `Backend::host()` and repair records use.
    pub fn host(&self) -> String {
        self.url()
            .host_str()
            .map(|h| format!("{h}:{}", self.server.address().port()))
            .unwrap_or_default()
    }
}

/// Builds a [`Backend`] over a mock server, using the default `reqwest`-backed transport and
/// no signing.
pub fn backend_of(mock: &MockBackend) -> Arc<Backend> {
    let transports = TransportContainer::with_default(Arc::new(ReqwestTransport::default()));
    Arc::new(Backend::new(mock.url(), false, transports))
}

/// Groups mock backends into a named [`Cluster`], in the given order.
pub fn cluster_of(name: &str, mocks: &[&MockBackend]) -> Arc<Cluster> {
    Arc::new(Cluster {
        name: name.to_string(),
        backends: mocks.iter().map(|m| backend_of(m)).collect(),
    })
}

/// Assembles a [`Router`] / [`Dispatcher`] pair backed by a temporary JSON-lines repair sink,
/// so a test can both dispatch requests and inspect the repair records they produced.
pub struct TestDispatcher {
    router: Router,
    sink_dir: TempDir,
}

impl TestDispatcher {
    /// An empty dispatcher builder with no domains bound yet.
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            sink_dir: TempDir::new().expect("failed to create repair sink directory"),
        }
    }

    /// Binds `domain` to a region named `region_name` serving `cluster`.
    pub fn bind(mut self, domain: &str, region_name: &str, cluster: Arc<Cluster>) -> Self {
        self.router.bind(
            domain,
            Region { name: region_name.to_string(), cluster },
        );
        self
    }

    /// Path of the repair sink's JSON-lines log, for assertions after dispatch.
    pub fn sink_path(&self) -> PathBuf {
        self.sink_dir.path().join("repair.jsonl")
    }

    /// Builds the [`Dispatcher`]. The returned dispatcher keeps the sink directory alive only
    /// as long as this [`TestDispatcher`] is not dropped; hold onto it (or its path) for the
    /// lifetime of the test.
    pub fn build(&self) -> Dispatcher {
        let sink = Arc::new(JsonLinesFileSink::new(self.sink_path()));
        Dispatcher::new(self.router.clone(), Arc::new(SyncSender::new(sink)))
    }
}

impl Default for TestDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
