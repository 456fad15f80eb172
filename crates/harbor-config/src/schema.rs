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

//! The as-parsed, not-yet-validated configuration shape.

use serde::Deserialize;

fn default_backend_type() -> String {
    "s3".to_string()
}

fn default_signing_type() -> String {
    "passthrough".to_string()
}

fn default_sink_path() -> String {
    "repair.jsonl".to_string()
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_body_limit_bytes() -> usize {
    5 * 1024 * 1024
}

/// How a backend's requests are signed before being sent.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSigning {
    /// One of `passthrough`, `S3FixedKey`, `S3AuthService`.
    #[serde(rename = "type", default = "default_signing_type")]
    pub signing_type: String,
    /// Required for `S3FixedKey`.
    pub access_key: Option<String>,
    /// Required for `S3FixedKey`.
    pub secret: Option<String>,
    /// Optional region claim used when computing the SigV4 signature.
    pub region: Option<String>,
    /// Required for `S3AuthService`; `"default"` is accepted as a sentinel meaning "use the
    /// deployment's default auth service".
    pub auth_service_endpoint: Option<String>,
}

impl Default for RawSigning {
    fn default() -> Self {
        Self {
            signing_type: default_signing_type(),
            access_key: None,
            secret: None,
            region: None,
            auth_service_endpoint: None,
        }
    }
}

/// A single configured backend descriptor, before it becomes a [`harbor_backend::Backend`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawBackend {
    /// Unique name, referenced by [`RawCluster::backends`].
    pub name: String,
    /// Base URL the backend is reached at.
    pub endpoint: String,
    /// Excludes the backend from active routing while still keeping it in the full list.
    #[serde(default)]
    pub maintenance: bool,
    /// Informational only today; reserved for future non-S3 backend kinds.
    #[serde(default = "default_backend_type")]
    pub backend_type: String,
    /// Signing configuration for requests sent to this backend.
    #[serde(default)]
    pub signing: RawSigning,
}

/// An ordered group of backends served together.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCluster {
    /// Cluster name, referenced by [`RawRegion::cluster`].
    pub name: String,
    /// Names of backends in this cluster, in configured order. Must all exist in
    /// [`RawConfig::backends`].
    pub backends: Vec<String>,
}

/// Binds a set of inbound domains to a cluster.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRegion {
    /// Region name, for logging and `/status`.
    pub name: String,
    /// `Host` header values (without port) this region answers for.
    pub domains: Vec<String>,
    /// Name of the cluster this region dispatches to. Must exist in [`RawConfig::clusters`].
    pub cluster: String,
}

/// Sync-sender sink configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSyncConfig {
    /// Path of the JSON-lines repair log.
    #[serde(default = "default_sink_path")]
    pub sink_path: String,
    /// Bounded queue capacity before repair records are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for RawSyncConfig {
    fn default() -> Self {
        Self {
            sink_path: default_sink_path(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Replication client tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct RawReplicationConfig {
    /// Request bodies larger than this are rejected before any backend sees them.
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

impl Default for RawReplicationConfig {
    fn default() -> Self {
        Self {
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

/// The full as-parsed configuration document.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfig {
    /// Every backend this deployment knows about.
    pub backends: Vec<RawBackend>,
    /// Clusters built from those backends.
    pub clusters: Vec<RawCluster>,
    /// Regions bound to those clusters.
    pub regions: Vec<RawRegion>,
    /// Sync sender settings.
    #[serde(default)]
    pub sync: RawSyncConfig,
    /// Replication client settings.
    #[serde(default)]
    pub replication: RawReplicationConfig,
}
