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

//! Builds a [`RequestDecorator`] for each configured signing type.
//!
//! Mirrors the shape of a lookup table keyed by signing type name, the way backend
//! configuration describes it: `passthrough`, `S3FixedKey`, or `S3AuthService`.

use std::sync::Arc;

use harbor_backend::transport::{passthrough_decorator, RequestDecorator, Transport};
use url::Url;

use crate::auth_service::AuthServiceTransport;
use crate::fixed_key::FixedKeyTransport;

/// The identity decorator, for backends that don't require request signing.
pub fn passthrough() -> RequestDecorator {
    passthrough_decorator()
}

/// Signs every request with one static access-key/secret pair.
pub fn s3_fixed_key(access_key: String, secret: String, region: Option<String>) -> RequestDecorator {
    Arc::new(move |inner: Arc<dyn Transport>| {
        Arc::new(FixedKeyTransport::new(inner, access_key.clone(), secret.clone(), region.clone()))
            as Arc<dyn Transport>
    })
}

/// Fetches and refreshes short-lived credentials from a remote auth service, then signs
/// locally with them.
pub fn s3_auth_service(auth_service_endpoint: Url, backend_name: String) -> RequestDecorator {
    Arc::new(move |inner: Arc<dyn Transport>| {
        Arc::new(AuthServiceTransport::new(
            inner,
            auth_service_endpoint.clone(),
            backend_name.clone(),
        )) as Arc<dyn Transport>
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use harbor_backend::transport::ReqwestTransport;

    #[test]
    fn passthrough_returns_the_same_transport_instance() {
        let decorator = passthrough();
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::default());
        let wrapped = decorator(Arc::clone(&transport));
        assert!(Arc::ptr_eq(&transport, &wrapped));
    }

    #[test]
    fn fixed_key_wraps_in_a_new_transport() {
        let decorator = s3_fixed_key("AKIDEXAMPLE".into(), "secret".into(), None);
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::default());
        let wrapped = decorator(Arc::clone(&transport));
        assert!(!Arc::ptr_eq(&transport, &wrapped));
    }
}
