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

//! YAML configuration: schema, value-returning validator, and hot-reloadable loader.
//!
//! [`schema::RawConfig`] is what serde produces straight off the wire. [`validate::validate`]
//! turns it into a [`validate::ValidatedConfig`], collecting every schema violation it finds
//! into one `Vec<ConfigError>` instead of stopping at the first — an operator fixing a config
//! wants the whole list, not a whack-a-mole loop. [`loader::ConfigHandle`] wraps the resulting
//! [`harbor_dispatch::Dispatcher`] in an `arc-swap` pointer so [`loader::watch_for_reload`] can
//! rebuild and swap it wholesale on every `SIGHUP` without disturbing in-flight requests.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use error::{ConfigError, LoadError};
pub use loader::{build_dispatcher, load, load_dispatcher, ConfigHandle};
pub use schema::RawConfig;
pub use validate::{validate, ValidatedConfig};

#[cfg(unix)]
pub use loader::watch_for_reload;
