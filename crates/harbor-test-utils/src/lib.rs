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

//! # Harbor Test Utilities
//!
//! Shared test fixtures for Harbor crates providing:
//! - Mock storage backends built on `wiremock`, and cluster/dispatcher builders around them
//! - Sample configuration documents matching `harbor-config`'s schema
//! - Repair-record and HTTP-response assertions
//! - Cross-platform path utilities

pub mod assertions;
pub mod backend;
pub mod config;
pub mod fixtures;
pub mod platform;

// Re-export commonly used items at crate root
pub use assertions::*;
pub use backend::{cluster_of, MockBackend, TestDispatcher};
pub use config::sample_config_yaml;
pub use fixtures::TestFixtures;
pub use platform::TestPaths;
