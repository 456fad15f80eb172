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

//! Consistent-hash stickiness for multipart uploads.
//!
//! One [`BackendRing`] is built per multipart request from the currently-active backends and
//! discarded afterwards; it is never mutated mid-request, so repeated lookups for the same
//! object path during one upload land on the same backend.

use hashring::HashRing;

/// Wraps a [`HashRing`] keyed by backend host strings.
pub struct BackendRing {
    ring: HashRing<String>,
}

impl BackendRing {
    /// Builds a ring over `active_hosts`. An empty slice yields a ring that never resolves a
    /// node.
    pub fn new(active_hosts: Vec<String>) -> Self {
        let mut ring = HashRing::new();
        for host in active_hosts {
            ring.add(host);
        }
        Self { ring }
    }

    /// Resolves the backend host responsible for `object_path`, or `None` if the ring has no
    /// members.
    pub fn get_node(&self, object_path: &str) -> Option<&String> {
        self.ring.get(&object_path.to_string())
    }
}
