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

//! Errors produced loading or validating configuration.

use thiserror::Error;

/// One schema violation found while validating a [`crate::schema::RawConfig`].
///
/// The validator accumulates every violation it finds rather than stopping at the first, so
/// operators fix a whole config in one pass instead of playing whack-a-mole.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A cluster referenced a backend name that doesn't exist.
    #[error("cluster {cluster} references unknown backend {backend}")]
    UnknownBackend {
        /// The cluster doing the referencing.
        cluster: String,
        /// The backend name that wasn't found.
        backend: String,
    },

    /// A region referenced a cluster name that doesn't exist.
    #[error("region {region} references unknown cluster {cluster}")]
    UnknownCluster {
        /// The region doing the referencing.
        region: String,
        /// The cluster name that wasn't found.
        cluster: String,
    },

    /// Two backends were declared with the same name.
    #[error("duplicate backend name {0}")]
    DuplicateBackend(String),

    /// Two clusters were declared with the same name.
    #[error("duplicate cluster name {0}")]
    DuplicateCluster(String),

    /// The same domain was bound to more than one region.
    #[error("domain {domain} is bound to more than one region ({first} and {second})")]
    DuplicateDomain {
        /// The domain bound twice.
        domain: String,
        /// The region it was first bound to.
        first: String,
        /// The region it was also bound to.
        second: String,
    },

    /// A backend's endpoint did not parse as a URL.
    #[error("backend {backend} has an invalid endpoint {endpoint:?}: {cause}")]
    InvalidEndpoint {
        /// The offending backend.
        backend: String,
        /// The raw endpoint string that failed to parse.
        endpoint: String,
        /// Parser's error message.
        cause: String,
    },

    /// A signing block named a type other than `passthrough`, `S3FixedKey`, or
    /// `S3AuthService`.
    #[error("backend {backend} has unknown signing type {signing_type:?}")]
    UnknownSigningType {
        /// The offending backend.
        backend: String,
        /// The unrecognized signing type string.
        signing_type: String,
    },

    /// A signing block of a known type was missing one of its required properties.
    #[error("backend {backend} signing type {signing_type} requires property {property}")]
    MissingSigningProperty {
        /// The offending backend.
        backend: String,
        /// The signing type being configured.
        signing_type: String,
        /// The missing property name.
        property: &'static str,
    },

    /// A region declared no domains, so it could never be selected.
    #[error("region {0} declares no domains")]
    RegionHasNoDomains(String),

    /// A cluster declared no backends, so it could never serve traffic.
    #[error("cluster {0} declares no backends")]
    ClusterHasNoBackends(String),
}

/// Errors reading or parsing the configuration document itself, before validation runs.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read configuration file {path}: {cause}")]
    Io {
        /// Path that could not be read.
        path: String,
        /// Underlying I/O error message.
        cause: String,
    },

    /// The file's contents did not parse as YAML.
    #[error("failed to parse configuration as YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The parsed document failed schema validation.
    #[error("configuration failed validation with {} error(s)", .0.len())]
    Invalid(Vec<ConfigError>),
}
