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

//! Prometheus metrics and the admin HTTP endpoint.
//!
//! # Key metrics
//!
//! - Dispatch count and latency, by picker kind
//! - Backend round-trip latency and error count, by backend host
//! - Repair records emitted and dropped
//! - Multipart hash-ring selections, by backend host
//!
//! # Example
//!
//! ```ignore
//! use harbor_metrics::{MetricsRegistry, MetricsServer};
//!
//! let registry = MetricsRegistry::new()?;
//! let server = MetricsServer::new(registry.clone(), status_provider, 9090);
//! tokio::spawn(server.serve());
//! ```

pub mod collector;
pub mod registry;
pub mod server;
pub mod types;

pub use collector::HarborCollector;
pub use registry::MetricsRegistry;
pub use server::{MetricsServer, StatusProvider};
pub use types::{BackendStatus, MetricsConfig, PickerKind};

// Re-export prometheus types for convenience.
pub use prometheus::{Encoder, TextEncoder};
