//! AWS Signature Version 4 request signing.

use crate::Credentials;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use time::{OffsetDateTime, UtcOffset};

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Percent-encodes everything except the RFC 3986 unreserved characters, and
/// `/` unless `encode_slash` is set.
pub fn uri_encode(s: &str, encode_slash: bool) -> String {
    let mut encoded = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(b as char)
            }
            b'/' if !encode_slash => encoded.push('/'),
            _ => encoded.push_str(&format!("%{:02X}", b)),
        }
    }
    encoded
}

pub fn canonical_query(params: &[(&str, &str)]) -> String {
    let mut encoded = params
        .iter()
        .map(|(k, v)| (uri_encode(k, true), uri_encode(v, true)))
        .collect::<Vec<_>>();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC can take a key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

pub fn amz_date(timestamp: OffsetDateTime) -> String {
    let t = timestamp.to_offset(UtcOffset::UTC);
    format!(
        "{}T{:02}{:02}{:02}Z",
        date_stamp(t),
        t.hour(),
        t.minute(),
        t.second()
    )
}

fn date_stamp(timestamp: OffsetDateTime) -> String {
    let t = timestamp.to_offset(UtcOffset::UTC);
    format!("{:04}{:02}{:02}", t.year(), u8::from(t.month()), t.day())
}

pub fn signing_key(secret_access_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(
        format!("AWS4{}", secret_access_key).as_bytes(),
        date_stamp.as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// The parts of an HTTP request that go into the signature.
#[derive(Debug)]
pub struct CanonicalRequest {
    pub method: String,
    /// URI-encoded absolute path.
    pub path: String,
    pub query: String,
    headers: Vec<(String, String)>,
    pub payload_sha256: String,
}

impl CanonicalRequest {
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        query: impl Into<String>,
        payload_sha256: impl Into<String>,
    ) -> Self {
        CanonicalRequest {
            method: method.into(),
            path: path.into(),
            query: query.into(),
            headers: Vec::new(),
            payload_sha256: payload_sha256.into(),
        }
    }

    pub fn header(mut self, name: &str, value: impl AsRef<str>) -> Self {
        self.headers
            .push((name.to_ascii_lowercase(), value.as_ref().trim().to_owned()));
        self.headers.sort();
        self
    }

    pub fn signed_headers(&self) -> String {
        self.headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";")
    }

    fn canonical_string(&self) -> String {
        let headers = self
            .headers
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value))
            .collect::<String>();
        format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            self.method,
            self.path,
            self.query,
            headers,
            self.signed_headers(),
            self.payload_sha256
        )
    }
}

#[derive(Debug)]
pub struct Signer<'a> {
    pub credentials: &'a Credentials,
    pub region: &'a str,
    pub service: &'a str,
}

impl<'a> Signer<'a> {
    pub fn s3(credentials: &'a Credentials, region: &'a str) -> Self {
        Signer {
            credentials,
            region,
            service: "s3",
        }
    }

    fn scope(&self, timestamp: OffsetDateTime) -> String {
        format!(
            "{}/{}/{}/aws4_request",
            date_stamp(timestamp),
            self.region,
            self.service
        )
    }

    pub fn signature(&self, request: &CanonicalRequest, timestamp: OffsetDateTime) -> String {
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date(timestamp),
            self.scope(timestamp),
            sha256_hex(request.canonical_string().as_bytes())
        );
        let key = signing_key(
            &self.credentials.secret_access_key,
            &date_stamp(timestamp),
            self.region,
            self.service,
        );
        hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()))
    }

    /// Value of the `Authorization` header for `request`.
    pub fn authorization(&self, request: &CanonicalRequest, timestamp: OffsetDateTime) -> String {
        format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM,
            self.credentials.access_key_id,
            self.scope(timestamp),
            request.signed_headers(),
            self.signature(request, timestamp)
        )
    }
}
