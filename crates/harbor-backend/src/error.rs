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

//! Error types shared by every stage of request dispatch.

use thiserror::Error;

/// Errors produced while routing a request to one or more backends.
///
/// Backend-attributed errors are *local*: they never abort a dispatch on their own, they
/// feed arbitration in the response pickers. [`DispatchError::NeedsRepair`] is not a failure
/// at all — it is a sentinel the multipart client uses to tell the sync-drainer that a
/// backend must reconcile an object.
#[derive(Error, Debug, Clone)]
pub enum DispatchError {
    /// A single backend's round-trip failed at the transport level.
    #[error("backend {backend} failed: {cause}")]
    Backend {
        /// Host identity of the backend that failed.
        backend: String,
        /// Human-readable cause, as reported by the transport.
        cause: String,
    },

    /// No transport rule matched the request and the container has no default.
    #[error("no matching transport for {method} {path}")]
    NoMatchingTransport {
        /// Request method that failed to match any rule.
        method: String,
        /// Request path that failed to match any rule.
        path: String,
    },

    /// A multipart request arrived but no active (non-maintenance) backend exists.
    #[error("no active backend available to handle multipart upload")]
    NoMultipartTarget,

    /// The inbound body exceeded the replication buffer threshold.
    #[error("request body of {size} bytes exceeds the {limit}-byte replication buffer")]
    BodyTooLargeForReplication {
        /// Size of the body that was rejected.
        size: usize,
        /// Configured buffer threshold.
        limit: usize,
    },

    /// Sentinel carried in a [`crate::BackendResponse`] marking a backend that must be
    /// repaired. Pickers must ignore this for arbitration but forward it to the sync sender.
    #[error("backend {backend} needs repair for {object_path}")]
    NeedsRepair {
        /// Host identity of the backend that must reconcile.
        backend: String,
        /// Object path the repair concerns.
        object_path: String,
    },

    /// The inbound request's `Host` header matched no configured region.
    #[error("unknown host: {0}")]
    UnknownHost(String),

    /// Every backend was skipped (maintenance) and replication had nothing to send to.
    #[error("no active backend available for replication")]
    NoActiveBackends,
}

impl DispatchError {
    /// Maps this error onto the HTTP status code the client should see.
    ///
    /// Backend-attributed errors never reach a client directly: a picker always converts
    /// them into either a concrete backend response or a synthesized gateway error, so this
    /// mapping only needs to cover the classifier/resource errors that abort dispatch outright
    /// plus the gateway fallback for `Backend`.
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchError::Backend { .. } => 502,
            DispatchError::NoMatchingTransport { .. } => 500,
            DispatchError::NoMultipartTarget => 503,
            DispatchError::BodyTooLargeForReplication { .. } => 413,
            DispatchError::NeedsRepair { .. } => 200,
            DispatchError::UnknownHost(_) => 404,
            DispatchError::NoActiveBackends => 503,
        }
    }

    /// True for the repair sentinel, which arbitration must ignore.
    pub fn is_needs_repair(&self) -> bool {
        matches!(self, DispatchError::NeedsRepair { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_maps_to_bad_gateway() {
        let err = DispatchError::Backend {
            backend: "b1".into(),
            cause: "connection reset".into(),
        };
        assert_eq!(err.status_code(), 502);
    }

    #[test]
    fn needs_repair_is_not_a_failure() {
        let err = DispatchError::NeedsRepair {
            backend: "b1".into(),
            object_path: "/bucket/obj".into(),
        };
        assert!(err.is_needs_repair());
    }

    #[test]
    fn no_multipart_target_is_service_unavailable() {
        assert_eq!(DispatchError::NoMultipartTarget.status_code(), 503);
    }
}
