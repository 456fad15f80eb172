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

//! `S3FixedKey`: signs every request with one static access-key/secret pair.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use harbor_backend::transport::Transport;
use harbor_backend::{ProxyRequest, ProxyResponse};
use http::HeaderValue;
use url::Url;

use crate::sigv4::{amz_date, authorization_header, payload_hash, AwsCredentials, SigningInput};

/// Default region used when a backend's configuration doesn't name one; most on-prem S3
/// implementations ignore the region claim entirely but still expect it to be present.
const DEFAULT_REGION: &str = "us-east-1";
const SERVICE: &str = "s3";

/// Wraps a transport, adding `x-amz-date`, `x-amz-content-sha256`, and `Authorization`
/// headers signed with a single static credential pair.
pub struct FixedKeyTransport {
    inner: Arc<dyn Transport>,
    credentials: AwsCredentials,
    region: String,
}

impl FixedKeyTransport {
    /// Wraps `inner`, signing with `access_key`/`secret` for `region` (falls back to
    /// [`DEFAULT_REGION`] if `None`).
    pub fn new(inner: Arc<dyn Transport>, access_key: String, secret: String, region: Option<String>) -> Self {
        Self {
            inner,
            credentials: AwsCredentials {
                access_key_id: access_key,
                secret_access_key: secret,
            },
            region: region.unwrap_or_else(|| DEFAULT_REGION.to_string()),
        }
    }
}

#[async_trait]
impl Transport for FixedKeyTransport {
    async fn execute(&self, base_url: &Url, req: &ProxyRequest) -> Result<ProxyResponse, String> {
        let host = base_url.host_str().ok_or("backend url has no host")?.to_string();
        let host = match base_url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host,
        };

        let now = Utc::now();
        let payload_hash = payload_hash(&req.body);
        let headers = vec![("host".to_string(), host.clone()), ("x-amz-date".to_string(), amz_date(now))];
        let signing_input = SigningInput {
            method: req.method.as_str(),
            canonical_uri: req.path(),
            canonical_query: req.raw_query(),
            canonical_headers: &headers,
            signed_headers: "host;x-amz-date",
            payload_hash: &payload_hash,
        };
        let authorization = authorization_header(&self.credentials, &self.region, SERVICE, now, &signing_input);

        let mut signed = req.clone();
        signed.headers.insert(
            "x-amz-date",
            HeaderValue::from_str(&amz_date(now)).map_err(|e| e.to_string())?,
        );
        signed.headers.insert(
            "x-amz-content-sha256",
            HeaderValue::from_str(&payload_hash).map_err(|e| e.to_string())?,
        );
        signed.headers.insert(
            "authorization",
            HeaderValue::from_str(&authorization).map_err(|e| e.to_string())?,
        );

        self.inner.execute(base_url, &signed).await
    }
}
