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

//! Rule-based transport selection and the underlying `reqwest`-backed transport.

use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use url::Url;

use crate::error::DispatchError;
use crate::message::{ProxyRequest, ProxyResponse};

/// A pluggable executor of a single HTTP round-trip.
///
/// Signing decorators (see `harbor-auth`) wrap a `Transport` in another `Transport`, so the
/// decorated type never needs to know about matchers or connection pooling, and `Backend`
/// never needs to know about signing.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute `req` against `base_url` and return the buffered response.
    async fn execute(&self, base_url: &Url, req: &ProxyRequest) -> Result<ProxyResponse, String>;
}

/// A pure function that wraps one transport in another, e.g. to sign requests.
pub type RequestDecorator = Arc<dyn Fn(Arc<dyn Transport>) -> Arc<dyn Transport> + Send + Sync>;

/// Identity decorator used by backends configured with `passthrough` signing.
pub fn passthrough_decorator() -> RequestDecorator {
    Arc::new(|transport| transport)
}

/// One rule in a [`TransportContainer`]: all populated fields must match for the rule to fire.
#[derive(Clone)]
pub struct TransportRule {
    /// Match requests with this method, or any method if `None`.
    pub method: Option<Method>,
    /// Match requests whose path starts with this prefix, or any path if `None`.
    pub path_prefix: Option<String>,
    /// Match requests whose raw query contains this substring, or any query if `None`.
    pub query_param: Option<String>,
    /// The transport to use when this rule matches.
    pub transport: Arc<dyn Transport>,
}

impl TransportRule {
    fn matches(&self, req: &ProxyRequest) -> bool {
        if let Some(method) = &self.method {
            if method != req.method {
                return false;
            }
        }
        if let Some(prefix) = &self.path_prefix {
            if !req.path().starts_with(prefix.as_str()) {
                return false;
            }
        }
        if let Some(param) = &self.query_param {
            if !req.raw_query().contains(param.as_str()) {
                return false;
            }
        }
        true
    }
}

/// An ordered set of transport-selection rules plus an optional default.
///
/// Rules are evaluated in order; the first match wins. If nothing matches, the default
/// transport is used; if there is no default, selection fails with
/// [`DispatchError::NoMatchingTransport`].
#[derive(Clone, Default)]
pub struct TransportContainer {
    rules: Vec<TransportRule>,
    default: Option<Arc<dyn Transport>>,
}

impl TransportContainer {
    /// A container with only a default transport and no matcher rules.
    pub fn with_default(transport: Arc<dyn Transport>) -> Self {
        Self {
            rules: Vec::new(),
            default: Some(transport),
        }
    }

    /// Appends a matcher rule, evaluated after all previously added rules.
    pub fn push_rule(&mut self, rule: TransportRule) {
        self.rules.push(rule);
    }

    /// Selects the transport for `req`, per the matching rules then the default.
    pub fn select(&self, req: &ProxyRequest) -> Result<Arc<dyn Transport>, DispatchError> {
        for rule in &self.rules {
            if rule.matches(req) {
                return Ok(Arc::clone(&rule.transport));
            }
        }
        self.default.clone().ok_or_else(|| DispatchError::NoMatchingTransport {
            method: req.method.to_string(),
            path: req.path().to_string(),
        })
    }
}

/// The production [`Transport`]: a shared `reqwest::Client`.
///
/// Connection pooling lives inside `reqwest::Client` and is shared process-wide; cloning a
/// `ReqwestTransport` is cheap (the client is `Arc`-backed internally).
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Wraps an existing `reqwest::Client`, e.g. one built with a per-backend timeout.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, base_url: &Url, req: &ProxyRequest) -> Result<ProxyResponse, String> {
        let mut url = base_url.clone();
        url.set_path(req.path());
        url.set_query(Some(req.raw_query()).filter(|q| !q.is_empty()));

        let mut builder = self
            .client
            .request(req.method.clone(), url)
            .body(req.body.clone());
        for (name, value) in req.headers.iter() {
            builder = builder.header(name, value);
        }

        let response = builder.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| e.to_string())?;

        Ok(ProxyResponse {
            status,
            headers,
            body,
        })
    }
}
