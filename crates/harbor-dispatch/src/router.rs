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

//! Maps an inbound `Host` header to the cluster that serves it.

use std::collections::HashMap;
use std::sync::Arc;

use harbor_backend::{Backend, DispatchError};

/// An ordered set of backends plus whatever transport/signing configuration they share.
/// Built once by `harbor-config` and shared by every `Dispatcher` bound to it.
#[derive(Clone)]
pub struct Cluster {
    /// Cluster name, for logging and `/status`.
    pub name: String,
    /// Backends in configured order. Order has no arbitration meaning; it only affects the
    /// order `/status` reports them in.
    pub backends: Vec<Arc<Backend>>,
}

/// A named group of domains bound to one primary cluster.
#[derive(Clone)]
pub struct Region {
    /// Region name, for logging and `/status`.
    pub name: String,
    /// The cluster this region's traffic is dispatched to.
    pub cluster: Arc<Cluster>,
}

/// Resolves an inbound request's `Host` header to the [`Region`] (and therefore [`Cluster`])
/// that should serve it.
#[derive(Clone, Default)]
pub struct Router {
    by_domain: HashMap<String, Region>,
}

impl Router {
    /// An empty router that rejects every host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `domain` to `region`. A later call for the same domain replaces the earlier
    /// binding.
    pub fn bind(&mut self, domain: impl Into<String>, region: Region) {
        self.by_domain.insert(domain.into(), region);
    }

    /// Resolves `host` (a `Host` header value, with any port already stripped by the caller)
    /// to its region, or [`DispatchError::UnknownHost`] if nothing matches.
    pub fn resolve(&self, host: &str) -> Result<&Region, DispatchError> {
        self.by_domain
            .get(host)
            .ok_or_else(|| DispatchError::UnknownHost(host.to_string()))
    }

    /// Every bound region, for admin reporting. Regions sharing a cluster appear once per
    /// domain binding, not once per cluster.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.by_domain.values()
    }
}

/// Strips a trailing `:port` from a `Host` header value, if present.
///
/// IPv6 literal hosts (`[::1]:8080`) keep their brackets; the port is only stripped after the
/// closing bracket.
pub fn strip_port(host: &str) -> &str {
    if let Some(bracket_end) = host.rfind(']') {
        return &host[..=bracket_end];
    }
    host.rsplit_once(':').map(|(h, _)| h).unwrap_or(host)
}
