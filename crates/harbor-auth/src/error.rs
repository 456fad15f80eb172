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

//! Errors raised building or running a signing decorator.

use thiserror::Error;

/// Failure configuring or running a signing decorator.
#[derive(Error, Debug)]
pub enum AuthError {
    /// A required signing property was missing from the backend's configuration.
    #[error("signing type {signing_type} requires property {property}")]
    MissingProperty {
        /// The signing type being configured, e.g. `S3FixedKey`.
        signing_type: &'static str,
        /// The missing property name, e.g. `AccessKey`.
        property: &'static str,
    },

    /// The remote auth service could not be reached or returned an unusable response.
    #[error("auth service request failed: {0}")]
    AuthService(String),
}
