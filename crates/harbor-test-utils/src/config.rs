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

//! Sample configuration documents matching `harbor-config`'s schema.

/// A minimal single-region, single-cluster configuration document, with backend endpoints
/// supplied by the caller (typically mock server URIs).
///
/// Mirrors the shape `harbor-config::schema::RawConfig` deserializes, so it can be written to
/// a temp file and loaded through the real config-loading path in integration tests.
pub fn sample_config_yaml(backend_endpoints: &[&str]) -> String {
    let backends: String = backend_endpoints
        .iter()
        .enumerate()
        .map(|(i, endpoint)| {
            format!(
                "  - name: backend-{i}\n    endpoint: \"{endpoint}\"\n"
            )
        })
        .collect();

    let backend_names: String = backend_endpoints
        .iter()
        .enumerate()
        .map(|(i, _)| format!("      - backend-{i}\n"))
        .collect();

    format!(
        "backends:\n{backends}\nclusters:\n  - name: primary\n    backends:\n{backend_names}\nregions:\n  - name: us-east\n    domains:\n      - s3.example.com\n    cluster: primary\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_parseable_yaml() {
        let yaml = sample_config_yaml(&["http://127.0.0.1:9001", "http://127.0.0.1:9002"]);
        assert!(yaml.contains("backend-0"));
        assert!(yaml.contains("backend-1"));
        assert!(yaml.contains("s3.example.com"));
    }
}
