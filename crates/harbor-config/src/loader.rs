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

//! Loads configuration from disk and keeps a live [`Dispatcher`] behind an [`ArcSwap`],
//! rebuilding it wholesale on every reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use harbor_dispatch::Dispatcher;
use harbor_sync::{JsonLinesFileSink, SyncSender};
use tracing::{error, info};

use crate::error::LoadError;
use crate::schema::RawConfig;
use crate::validate::{validate, ValidatedConfig};

/// Reads `path`, parses it as YAML, and validates it.
pub async fn load(path: &Path) -> Result<ValidatedConfig, LoadError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| LoadError::Io {
            path: path.display().to_string(),
            cause: e.to_string(),
        })?;
    let raw: RawConfig = serde_yaml::from_str(&contents)?;
    validate(&raw).map_err(LoadError::Invalid)
}

/// Turns a [`ValidatedConfig`] into a live [`Dispatcher`], spawning the sync sender's
/// background drainer.
pub fn build_dispatcher(validated: ValidatedConfig) -> Dispatcher {
    let sink = Arc::new(JsonLinesFileSink::new(validated.sync_sink_path));
    let sync = Arc::new(SyncSender::with_capacity(sink, validated.sync_queue_capacity));
    Dispatcher::with_body_limit(validated.router, sync, validated.replication_body_limit)
}

/// Loads `path` and builds the initial [`Dispatcher`] in one step, for process startup.
pub async fn load_dispatcher(path: &Path) -> Result<Dispatcher, LoadError> {
    load(path).await.map(build_dispatcher)
}

/// A [`Dispatcher`] that can be atomically replaced by later reloads.
///
/// Holders keep a cheap `Arc<ArcSwap<Dispatcher>>` and call [`ConfigHandle::current`] once per
/// request; in-flight requests keep the `Arc<Dispatcher>` they already loaded even if a reload
/// swaps in a new one mid-flight.
#[derive(Clone)]
pub struct ConfigHandle {
    current: Arc<ArcSwap<Dispatcher>>,
}

impl ConfigHandle {
    /// Wraps an already-built dispatcher as the initial generation.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(dispatcher)),
        }
    }

    /// The dispatcher generation in effect right now.
    pub fn current(&self) -> Arc<Dispatcher> {
        self.current.load_full()
    }

    /// Reloads `path` and, on success, atomically swaps in the new dispatcher. On failure the
    /// previous generation is left in place and the error is returned for logging.
    pub async fn reload(&self, path: &Path) -> Result<(), LoadError> {
        let dispatcher = load_dispatcher(path).await?;
        self.current.store(Arc::new(dispatcher));
        Ok(())
    }
}

/// Listens for `SIGHUP` and reloads `path` into `handle` on each one, for the lifetime of the
/// process. Intended to be spawned once at startup and never awaited.
#[cfg(unix)]
pub async fn watch_for_reload(path: PathBuf, handle: ConfigHandle) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangups = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to install SIGHUP handler, config reload is disabled");
            return;
        }
    };

    while hangups.recv().await.is_some() {
        info!(path = %path.display(), "reloading configuration");
        match handle.reload(&path).await {
            Ok(()) => info!("configuration reloaded"),
            Err(e) => error!(error = %e, "configuration reload failed, keeping previous generation"),
        }
    }
}
