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

//! The repair record written once per divergent backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single backend that fell behind and must reconcile an object.
///
/// Emitted by a response picker for every backend whose reply diverged from the one the
/// picker chose, and by the multipart client for every backend that missed a completed
/// upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairRecord {
    /// Path of the object that needs reconciling.
    pub object_path: String,
    /// Host of the backend whose response was treated as authoritative.
    pub source_backend: String,
    /// Host of the backend that must catch up.
    pub target_backend: String,
    /// HTTP method of the request that exposed the divergence.
    pub method: String,
    /// Request ID the divergence was observed under, for correlating with logs.
    pub request_id: String,
    /// When the divergence was observed.
    pub timestamp: DateTime<Utc>,
}
