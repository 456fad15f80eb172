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

//! Turns a [`RawConfig`] into a [`ValidatedConfig`], accumulating every schema violation
//! instead of failing on the first (see the design note in the crate root about why this
//! shape was chosen over a pointer-out `&mut Vec<ConfigError>` parameter).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use harbor_auth::{passthrough, s3_auth_service, s3_fixed_key};
use harbor_backend::transport::{ReqwestTransport, TransportContainer};
use harbor_backend::Backend;
use harbor_dispatch::{Cluster, Region, Router};
use url::Url;

use crate::error::ConfigError;
use crate::schema::{RawBackend, RawConfig};

/// Everything needed to build a live [`harbor_dispatch::Dispatcher`].
pub struct ValidatedConfig {
    /// Host-to-cluster routing table.
    pub router: Router,
    /// Where repair records are appended.
    pub sync_sink_path: String,
    /// Bounded queue capacity for the repair sender.
    pub sync_queue_capacity: usize,
    /// Cap on request bodies accepted for replication.
    pub replication_body_limit: usize,
}

fn build_backend(raw: &RawBackend, errors: &mut Vec<ConfigError>) -> Option<Arc<Backend>> {
    let endpoint = match Url::parse(&raw.endpoint) {
        Ok(url) => url,
        Err(e) => {
            errors.push(ConfigError::InvalidEndpoint {
                backend: raw.name.clone(),
                endpoint: raw.endpoint.clone(),
                cause: e.to_string(),
            });
            return None;
        }
    };

    let decorator = match raw.signing.signing_type.as_str() {
        "passthrough" => passthrough(),
        "S3FixedKey" => {
            let access_key = raw.signing.access_key.clone();
            let secret = raw.signing.secret.clone();
            match (access_key, secret) {
                (Some(access_key), Some(secret)) => s3_fixed_key(access_key, secret, raw.signing.region.clone()),
                (access_key, secret) => {
                    if access_key.is_none() {
                        errors.push(ConfigError::MissingSigningProperty {
                            backend: raw.name.clone(),
                            signing_type: raw.signing.signing_type.clone(),
                            property: "AccessKey",
                        });
                    }
                    if secret.is_none() {
                        errors.push(ConfigError::MissingSigningProperty {
                            backend: raw.name.clone(),
                            signing_type: raw.signing.signing_type.clone(),
                            property: "Secret",
                        });
                    }
                    return None;
                }
            }
        }
        "S3AuthService" => {
            let endpoint_str = raw
                .signing
                .auth_service_endpoint
                .clone()
                .unwrap_or_else(|| "default".to_string());
            match Url::parse(&endpoint_str) {
                Ok(auth_url) => s3_auth_service(auth_url, raw.name.clone()),
                Err(e) => {
                    errors.push(ConfigError::InvalidEndpoint {
                        backend: raw.name.clone(),
                        endpoint: endpoint_str,
                        cause: e.to_string(),
                    });
                    return None;
                }
            }
        }
        other => {
            errors.push(ConfigError::UnknownSigningType {
                backend: raw.name.clone(),
                signing_type: other.to_string(),
            });
            return None;
        }
    };

    let transports = TransportContainer::with_default(Arc::new(ReqwestTransport::default()));
    Some(Arc::new(
        Backend::new(endpoint, raw.maintenance, transports).with_decorator(decorator),
    ))
}

/// Validates `raw`, accumulating every violation found. Returns the fully-built routing table
/// on success.
pub fn validate(raw: &RawConfig) -> Result<ValidatedConfig, Vec<ConfigError>> {
    let mut errors = Vec::new();

    let mut backends: HashMap<String, Arc<Backend>> = HashMap::new();
    let mut seen_backend_names = HashSet::new();
    for raw_backend in &raw.backends {
        if !seen_backend_names.insert(raw_backend.name.clone()) {
            errors.push(ConfigError::DuplicateBackend(raw_backend.name.clone()));
            continue;
        }
        if let Some(backend) = build_backend(raw_backend, &mut errors) {
            backends.insert(raw_backend.name.clone(), backend);
        }
    }

    let mut clusters: HashMap<String, Arc<Cluster>> = HashMap::new();
    let mut seen_cluster_names = HashSet::new();
    for raw_cluster in &raw.clusters {
        if !seen_cluster_names.insert(raw_cluster.name.clone()) {
            errors.push(ConfigError::DuplicateCluster(raw_cluster.name.clone()));
            continue;
        }

        let mut resolved = Vec::new();
        for backend_name in &raw_cluster.backends {
            match backends.get(backend_name) {
                Some(backend) => resolved.push(Arc::clone(backend)),
                None => errors.push(ConfigError::UnknownBackend {
                    cluster: raw_cluster.name.clone(),
                    backend: backend_name.clone(),
                }),
            }
        }

        if resolved.is_empty() {
            errors.push(ConfigError::ClusterHasNoBackends(raw_cluster.name.clone()));
            continue;
        }

        clusters.insert(
            raw_cluster.name.clone(),
            Arc::new(Cluster {
                name: raw_cluster.name.clone(),
                backends: resolved,
            }),
        );
    }

    let mut router = Router::new();
    let mut domain_owners: HashMap<String, String> = HashMap::new();
    for raw_region in &raw.regions {
        if raw_region.domains.is_empty() {
            errors.push(ConfigError::RegionHasNoDomains(raw_region.name.clone()));
        }

        let cluster = match clusters.get(&raw_region.cluster) {
            Some(cluster) => Arc::clone(cluster),
            None => {
                errors.push(ConfigError::UnknownCluster {
                    region: raw_region.name.clone(),
                    cluster: raw_region.cluster.clone(),
                });
                continue;
            }
        };

        for domain in &raw_region.domains {
            if let Some(owner) = domain_owners.get(domain) {
                errors.push(ConfigError::DuplicateDomain {
                    domain: domain.clone(),
                    first: owner.clone(),
                    second: raw_region.name.clone(),
                });
                continue;
            }
            domain_owners.insert(domain.clone(), raw_region.name.clone());
            router.bind(
                domain.clone(),
                Region {
                    name: raw_region.name.clone(),
                    cluster: Arc::clone(&cluster),
                },
            );
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidatedConfig {
        router,
        sync_sink_path: raw.sync.sink_path.clone(),
        sync_queue_capacity: raw.sync.queue_capacity,
        replication_body_limit: raw.replication.body_limit_bytes,
    })
}
