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

//! Request classification, replication, and arbitration.
//!
//! This crate is the proxy's core: given one inbound request it decides whether this is a
//! plain object operation or part of a multipart upload, fans it out to the right backends,
//! arbitrates the replies, and reports any divergence to `harbor-sync` for repair.
//!
//! # Flow
//!
//! 1. [`router::Router`] resolves the inbound `Host` header to a [`router::Region`] and its
//!    [`router::Cluster`] — the ordered backend list this request will be dispatched against.
//! 2. [`classify::is_multipart_upload_request`] chooses between [`replication::ReplicationClient`]
//!    (fan out to every backend) and [`multipart::MultipartClient`] (sticky routing via a
//!    consistent-hash ring).
//! 3. [`picker::pick_for`] chooses an arbitration strategy — object, delete, or bucket-list —
//!    from the request's method and path.
//! 4. [`picker::pick`] drains the client's channel, returns the arbitrated response, and sends
//!    any divergent backend to the [`harbor_sync::SyncSender`] as a repair record.
//!
//! [`dispatcher::Dispatcher`] wires all four steps together behind a single `dispatch` call.

pub mod classify;
pub mod dispatcher;
pub mod multipart;
pub mod picker;
pub mod replication;
pub mod ring;
pub mod router;

pub use dispatcher::Dispatcher;
pub use multipart::MultipartClient;
pub use picker::{pick, pick_for, Picker, RepairContext};
pub use replication::ReplicationClient;
pub use router::{Cluster, Region, Router};
