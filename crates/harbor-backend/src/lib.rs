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

//! Per-backend HTTP round-trip.
//!
//! This crate defines the smallest unit the rest of Harbor dispatches onto: a [`Backend`],
//! which pairs an endpoint with a [`transport::TransportContainer`] and a signing
//! [`transport::RequestDecorator`]. Everything above this crate (`harbor-dispatch`,
//! `harbor-sync`) works in terms of the transport-agnostic [`message::ProxyRequest`] /
//! [`message::ProxyResponse`] pair rather than `reqwest` or `axum` types directly.
//!
//! # Core concepts
//!
//! - [`message::ProxyRequest`] / [`message::ProxyResponse`] — fully-buffered request and
//!   response bodies. Buffering up front is what lets the replication client clone one
//!   inbound body across N backends at the cost of a refcount bump each.
//! - [`transport::Transport`] — executes one round-trip against a base URL. The production
//!   implementation, [`transport::ReqwestTransport`], wraps a pooled `reqwest::Client`.
//! - [`transport::TransportContainer`] — picks a transport for a request by method, path
//!   prefix, or query parameter, falling back to a default.
//! - [`backend::Backend`] — a transport container plus a signing decorator, addressed by
//!   endpoint. [`backend::Backend::round_trip`] is the single entry point callers use.
//! - [`backend::BackendResponse`] — the result of one backend's round-trip, as seen by a
//!   response picker: exactly one of a response or an error, tagged with the backend it
//!   came from.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use harbor_backend::{Backend, transport::{ReqwestTransport, TransportContainer}};
//! use url::Url;
//!
//! let transports = TransportContainer::with_default(Arc::new(ReqwestTransport::default()));
//! let backend = Backend::new(Url::parse("http://storage-1.local:9000").unwrap(), false, transports);
//! assert_eq!(backend.host(), "storage-1.local:9000");
//! ```

pub mod backend;
pub mod error;
pub mod message;
pub mod transport;

pub use backend::{Backend, BackendResponse};
pub use error::DispatchError;
pub use message::{ProxyRequest, ProxyResponse};
