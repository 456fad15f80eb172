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

//! Transport-agnostic request/response bodies.
//!
//! The dispatcher never talks `reqwest` or `axum` directly outside of `harbor-backend` and
//! `harbor-server`: everywhere else a request is a [`ProxyRequest`] and a response is a
//! [`ProxyResponse`], both with bodies already buffered as [`Bytes`]. This is what lets the
//! replication client snapshot a body once and hand every backend its own cheap clone.

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};

/// A fully-buffered inbound or outbound request.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    /// HTTP method.
    pub method: Method,
    /// Path plus raw query string, e.g. `/bucket/key?uploadId=U`.
    pub path_and_query: String,
    /// Request headers, excluding `Host` (rewritten per backend by [`crate::Backend`]).
    pub headers: HeaderMap,
    /// Request body. Cloning a `Bytes` is a refcount bump, not a copy.
    pub body: Bytes,
}

impl ProxyRequest {
    /// The path component only, with the query string stripped.
    pub fn path(&self) -> &str {
        self.path_and_query
            .split_once('?')
            .map(|(path, _)| path)
            .unwrap_or(&self.path_and_query)
    }

    /// The raw query string, or an empty string if there isn't one.
    pub fn raw_query(&self) -> &str {
        self.path_and_query
            .split_once('?')
            .map(|(_, query)| query)
            .unwrap_or("")
    }
}

/// A fully-buffered response from a single backend.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    /// HTTP status code returned by the backend.
    pub status: StatusCode,
    /// Response headers as returned by the backend.
    pub headers: HeaderMap,
    /// Response body, already read to completion.
    pub body: Bytes,
}

impl ProxyResponse {
    /// True for any 2xx status.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// True for any status below 400, which counts as "successful" for object-picker
    /// purposes (2xx and 3xx both qualify).
    pub fn is_ok_for_arbitration(&self) -> bool {
        self.status.as_u16() < 400
    }
}
