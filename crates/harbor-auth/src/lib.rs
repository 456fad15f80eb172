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

//! Signing decorators for backends.
//!
//! A decorator is a pure function `Arc<dyn Transport> -> Arc<dyn Transport>`: it wraps
//! whichever transport a backend's [`harbor_backend::transport::TransportContainer`]
//! selected, adding whatever headers its scheme requires before handing the request on. This
//! keeps [`harbor_backend::Backend`] itself oblivious to signing — it only ever calls the
//! decorated transport.
//!
//! Three schemes are supported, selected by configuration:
//! - [`decorators::passthrough`] — no signing.
//! - [`decorators::s3_fixed_key`] — a single static credential pair, signed with SigV4
//!   ([`sigv4`]).
//! - [`decorators::s3_auth_service`] — credentials fetched from a remote service and
//!   refreshed as they approach expiry.

pub mod auth_service;
pub mod decorators;
pub mod error;
pub mod fixed_key;
pub mod sigv4;

pub use auth_service::AuthServiceTransport;
pub use decorators::{passthrough, s3_auth_service, s3_fixed_key};
pub use error::AuthError;
pub use fixed_key::FixedKeyTransport;
