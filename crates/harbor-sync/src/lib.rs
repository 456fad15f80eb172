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

//! Best-effort repair record delivery.
//!
//! Response pickers (in `harbor-dispatch`) observe backends that fell out of sync and hand
//! a [`RepairRecord`] to a [`SyncSender`], which queues it and drains it to a [`RepairSink`]
//! on a background task. Sending never blocks request handling; under sustained overload the
//! queue drops records and counts them rather than stalling dispatch.

pub mod record;
pub mod sender;
pub mod sink;

pub use record::RepairRecord;
pub use sender::SyncSender;
pub use sink::{JsonLinesFileSink, RepairSink, SinkError};
