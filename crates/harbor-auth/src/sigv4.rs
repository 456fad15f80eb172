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

//! Minimal AWS SigV4 canonical-request signing, built on `hmac` + `sha2` directly rather than
//! a dedicated signing crate, so backends that only ever talk to one fixed credential pair
//! don't pull in a full SDK.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// A single static access-key/secret pair used to sign requests to one backend.
#[derive(Clone)]
pub struct AwsCredentials {
    /// AWS-style access key ID.
    pub access_key_id: String,
    /// AWS-style secret access key.
    pub secret_access_key: String,
}

fn hmac(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts a key of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn signing_key(secret: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac(format!("AWS4{secret}").as_bytes(), date_stamp.as_bytes());
    let k_region = hmac(&k_date, region.as_bytes());
    let k_service = hmac(&k_region, service.as_bytes());
    hmac(&k_service, b"aws4_request")
}

/// Everything needed to produce a canonical request and its signature.
pub struct SigningInput<'a> {
    /// HTTP method, upper-case.
    pub method: &'a str,
    /// URL-encoded path, e.g. `/bucket/key`.
    pub canonical_uri: &'a str,
    /// Canonical (sorted, encoded) query string, or empty.
    pub canonical_query: &'a str,
    /// Lower-cased `name:value` header pairs, sorted by name, one per entry.
    pub canonical_headers: &'a [(String, String)],
    /// Semicolon-joined, sorted, lower-cased header names matching `canonical_headers`.
    pub signed_headers: &'a str,
    /// Hex-encoded SHA-256 of the request body (`UNSIGNED-PAYLOAD` is not used here: bodies
    /// are always buffered, so we always hash them).
    pub payload_hash: &'a str,
}

fn canonical_request(input: &SigningInput) -> String {
    let headers_block: String = input
        .canonical_headers
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();

    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        input.method,
        input.canonical_uri,
        input.canonical_query,
        headers_block,
        input.signed_headers,
        input.payload_hash
    )
}

/// Produces the `Authorization` header value for `input`, signed with `credentials` for
/// `region`/`service` at `now`.
pub fn authorization_header(
    credentials: &AwsCredentials,
    region: &str,
    service: &str,
    now: DateTime<Utc>,
    input: &SigningInput,
) -> String {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();

    let canonical = canonical_request(input);
    let canonical_hash = sha256_hex(canonical.as_bytes());
    let credential_scope = format!("{date_stamp}/{region}/{service}/aws4_request");
    let string_to_sign = format!("AWS4-HMAC-SHA256\n{amz_date}\n{credential_scope}\n{canonical_hash}");

    let key = signing_key(&credentials.secret_access_key, &date_stamp, region, service);
    let signature = hex::encode(hmac(&key, string_to_sign.as_bytes()));

    format!(
        "AWS4-HMAC-SHA256 Credential={}/{credential_scope}, SignedHeaders={}, Signature={signature}",
        credentials.access_key_id, input.signed_headers
    )
}

/// Hex-encoded SHA-256 of `body`, used as the payload hash and as the `x-amz-content-sha256`
/// header value.
pub fn payload_hash(body: &[u8]) -> String {
    sha256_hex(body)
}

/// The `x-amz-date` header value for `now`.
pub fn amz_date(now: DateTime<Utc>) -> String {
    now.format("%Y%m%dT%H%M%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_deterministic_for_identical_inputs() {
        let creds = AwsCredentials {
            access_key_id: "AKIDEXAMPLE".into(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY".into(),
        };
        let now = DateTime::parse_from_rfc3339("2026-01-15T12:00:00Z").unwrap().with_timezone(&Utc);
        let headers = vec![("host".to_string(), "examplebucket.s3.amazonaws.com".to_string())];
        let input = SigningInput {
            method: "GET",
            canonical_uri: "/test.txt",
            canonical_query: "",
            canonical_headers: &headers,
            signed_headers: "host",
            payload_hash: &payload_hash(b""),
        };

        let first = authorization_header(&creds, "us-east-1", "s3", now, &input);
        let second = authorization_header(&creds, "us-east-1", "s3", now, &input);
        assert_eq!(first, second);
        assert!(first.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20260115/us-east-1/s3/aws4_request"));
    }

    #[test]
    fn different_bodies_change_the_signature() {
        let creds = AwsCredentials {
            access_key_id: "AKIDEXAMPLE".into(),
            secret_access_key: "secret".into(),
        };
        let now = Utc::now();
        let headers = vec![("host".to_string(), "b1".to_string())];
        let base = SigningInput {
            method: "PUT",
            canonical_uri: "/key",
            canonical_query: "",
            canonical_headers: &headers,
            signed_headers: "host",
            payload_hash: &payload_hash(b"one"),
        };
        let other = SigningInput {
            payload_hash: &payload_hash(b"two"),
            ..base
        };

        let sig_one = authorization_header(&creds, "us-east-1", "s3", now, &base);
        let sig_two = authorization_header(&creds, "us-east-1", "s3", now, &other);
        assert_ne!(sig_one, sig_two);
    }
}
