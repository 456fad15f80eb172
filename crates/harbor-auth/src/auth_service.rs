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

//! `S3AuthService`: fetches short-lived credentials from a remote auth service and signs
//! locally with them, refreshing when they are close to expiry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use harbor_backend::transport::Transport;
use harbor_backend::{ProxyRequest, ProxyResponse};
use http::HeaderValue;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::error::AuthError;
use crate::sigv4::{amz_date, authorization_header, payload_hash, AwsCredentials, SigningInput};

const DEFAULT_REGION: &str = "us-east-1";
const SERVICE: &str = "s3";
/// Refresh this long before the credential's reported expiry, to tolerate clock skew and the
/// round-trip latency of the refresh call itself.
const REFRESH_SKEW: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct CredentialResponse {
    access_key_id: String,
    secret_access_key: String,
    expiration: DateTime<Utc>,
}

struct CachedCredentials {
    credentials: AwsCredentials,
    expires_at: DateTime<Utc>,
}

/// Wraps a transport, signing with credentials fetched from `AuthServiceEndpoint` and
/// refreshed automatically as they approach expiry.
pub struct AuthServiceTransport {
    inner: Arc<dyn Transport>,
    http: reqwest::Client,
    auth_service_endpoint: Url,
    backend_name: String,
    region: String,
    cached: RwLock<Option<CachedCredentials>>,
}

impl AuthServiceTransport {
    /// Wraps `inner`, fetching credentials for `backend_name` from `auth_service_endpoint`.
    pub fn new(inner: Arc<dyn Transport>, auth_service_endpoint: Url, backend_name: String) -> Self {
        Self {
            inner,
            http: reqwest::Client::new(),
            auth_service_endpoint,
            backend_name,
            region: DEFAULT_REGION.to_string(),
            cached: RwLock::new(None),
        }
    }

    async fn fetch_credentials(&self) -> Result<AwsCredentials, AuthError> {
        let url = self
            .auth_service_endpoint
            .join(&format!("/credentials/{}", self.backend_name))
            .map_err(|e| AuthError::AuthService(e.to_string()))?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AuthError::AuthService(e.to_string()))?
            .error_for_status()
            .map_err(|e| AuthError::AuthService(e.to_string()))?;

        let parsed: CredentialResponse = response
            .json()
            .await
            .map_err(|e| AuthError::AuthService(e.to_string()))?;

        let mut cache = self.cached.write().await;
        *cache = Some(CachedCredentials {
            credentials: AwsCredentials {
                access_key_id: parsed.access_key_id.clone(),
                secret_access_key: parsed.secret_access_key.clone(),
            },
            expires_at: parsed.expiration,
        });

        Ok(AwsCredentials {
            access_key_id: parsed.access_key_id,
            secret_access_key: parsed.secret_access_key,
        })
    }

    async fn credentials(&self) -> Result<AwsCredentials, AuthError> {
        {
            let cache = self.cached.read().await;
            if let Some(entry) = cache.as_ref() {
                let skew = chrono::Duration::from_std(REFRESH_SKEW).unwrap_or_default();
                if entry.expires_at - skew > Utc::now() {
                    return Ok(entry.credentials.clone());
                }
            }
        }
        debug!(backend = %self.backend_name, "refreshing auth-service credentials");
        self.fetch_credentials().await
    }
}

#[async_trait]
impl Transport for AuthServiceTransport {
    async fn execute(&self, base_url: &Url, req: &ProxyRequest) -> Result<ProxyResponse, String> {
        let credentials = self.credentials().await.map_err(|e| e.to_string())?;

        let host = base_url.host_str().ok_or("backend url has no host")?.to_string();
        let host = match base_url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host,
        };

        let now = Utc::now();
        let payload_hash = payload_hash(&req.body);
        let headers = vec![("host".to_string(), host), ("x-amz-date".to_string(), amz_date(now))];
        let signing_input = SigningInput {
            method: req.method.as_str(),
            canonical_uri: req.path(),
            canonical_query: req.raw_query(),
            canonical_headers: &headers,
            signed_headers: "host;x-amz-date",
            payload_hash: &payload_hash,
        };
        let authorization = authorization_header(&credentials, &self.region, SERVICE, now, &signing_input);

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

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, Method, StatusCode};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct CapturingTransport;

    #[async_trait]
    impl Transport for CapturingTransport {
        async fn execute(&self, _base_url: &Url, req: &ProxyRequest) -> Result<ProxyResponse, String> {
            Ok(ProxyResponse {
                status: StatusCode::OK,
                headers: req.headers.clone(),
                body: Bytes::new(),
            })
        }
    }

    #[tokio::test]
    async fn fetches_and_applies_credentials_from_auth_service() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/credentials/storage-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_key_id": "ASIAEXAMPLE",
                "secret_access_key": "examplesecret",
                "expiration": (Utc::now() + chrono::Duration::hours(1)).to_rfc3339(),
            })))
            .mount(&server)
            .await;

        let transport = AuthServiceTransport::new(
            Arc::new(CapturingTransport),
            Url::parse(&server.uri()).unwrap(),
            "storage-1".into(),
        );
        let req = ProxyRequest {
            method: Method::GET,
            path_and_query: "/bucket/key".into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        };
        let resp = transport.execute(&Url::parse("http://b1.local").unwrap(), &req).await.unwrap();

        assert!(resp.headers["authorization"].to_str().unwrap().contains("ASIAEXAMPLE"));
    }

    #[tokio::test]
    async fn cached_credentials_are_reused_before_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/credentials/storage-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_key_id": "ASIAEXAMPLE",
                "secret_access_key": "examplesecret",
                "expiration": (Utc::now() + chrono::Duration::hours(1)).to_rfc3339(),
            })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = AuthServiceTransport::new(
            Arc::new(CapturingTransport),
            Url::parse(&server.uri()).unwrap(),
            "storage-1".into(),
        );
        let req = ProxyRequest {
            method: Method::GET,
            path_and_query: "/bucket/key".into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        };

        transport.execute(&Url::parse("http://b1.local").unwrap(), &req).await.unwrap();
        transport.execute(&Url::parse("http://b1.local").unwrap(), &req).await.unwrap();
        // wiremock's `.expect(1)` is verified when `server` drops; a second fetch would panic.
    }
}
