//! A small blocking S3 client: just enough to list a bucket and upload an object.

mod credentials;
mod list;
pub mod signing;

pub use credentials::*;
pub use list::{ObjectSummary, ParseError};

use signing::{amz_date, canonical_query, sha256_hex, uri_encode, CanonicalRequest, Signer};
use std::time::Duration;
use time::OffsetDateTime;

pub const DEFAULT_ENDPOINT: &str = "https://s3.amazonaws.com";
pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, thiserror::Error)]
#[error("HTTP error")]
pub struct HttpError(#[from] Box<ureq::Transport>);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed")]
    HttpRequestFailed(#[from] HttpError),
    #[error("{method} {url} failed with status {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },
    #[error("failed to read response body")]
    ReadBody(#[source] std::io::Error),
    #[error("invalid listing for bucket '{0}'")]
    InvalidListing(String, #[source] ParseError),
    #[error("invalid endpoint URL '{0}'")]
    InvalidEndpoint(String),
}

/// Access to the objects of a single bucket.
pub trait ObjectStore {
    /// Lists every object whose key starts with `prefix`, following pagination.
    fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, Error>;

    fn put_object(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: String,
    host: String,
}

impl Endpoint {
    pub fn parse(url: &str) -> Result<Endpoint, Error> {
        let (scheme, rest) = url
            .split_once("://")
            .filter(|(scheme, _)| *scheme == "http" || *scheme == "https")
            .ok_or_else(|| Error::InvalidEndpoint(url.to_owned()))?;
        let host = rest.trim_end_matches('/');
        if host.is_empty() || host.contains('/') {
            return Err(Error::InvalidEndpoint(url.to_owned()));
        }
        Ok(Endpoint {
            scheme: scheme.to_owned(),
            host: host.to_owned(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn url(&self, path: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}://{}{}", self.scheme, self.host, path)
        } else {
            format!("{}://{}{}?{}", self.scheme, self.host, path, query)
        }
    }
}

/// A bucket addressed with path-style requests: `{endpoint}/{bucket}/{key}`.
#[derive(Debug)]
pub struct Bucket {
    name: String,
    endpoint: Endpoint,
    region: String,
    credentials: Credentials,
    agent: ureq::Agent,
}

impl Bucket {
    pub fn new(
        name: impl Into<String>,
        endpoint: Endpoint,
        region: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout_read(Duration::from_secs(60))
            .build();
        Bucket {
            name: name.into(),
            endpoint,
            region: region.into(),
            credentials,
            agent,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn object_path(&self, key: &str) -> String {
        format!("/{}/{}", uri_encode(&self.name, true), uri_encode(key, false))
    }

    fn send(
        &self,
        method: &'static str,
        path: &str,
        query: &str,
        body: &[u8],
        content_type: Option<&str>,
    ) -> Result<String, Error> {
        let now = OffsetDateTime::now_utc();
        let payload_sha256 = sha256_hex(body);
        let amz_date = amz_date(now);
        let request = CanonicalRequest::new(method, path, query, payload_sha256.as_str())
            .header("host", self.endpoint.host())
            .header("x-amz-content-sha256", &payload_sha256)
            .header("x-amz-date", &amz_date);
        let authorization = Signer::s3(&self.credentials, &self.region).authorization(&request, now);

        let url = self.endpoint.url(path, query);
        tracing::debug!("{} {}", method, url);
        let mut req = self
            .agent
            .request(method, &url)
            .set("x-amz-content-sha256", &payload_sha256)
            .set("x-amz-date", &amz_date)
            .set("authorization", &authorization);
        if let Some(content_type) = content_type {
            req = req.set("content-type", content_type);
        }

        match req.send_bytes(body) {
            Ok(response) => response.into_string().map_err(Error::ReadBody),
            Err(ureq::Error::Status(status, response)) => Err(Error::Status {
                method,
                url,
                status,
                body: response.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(transport)) => {
                Err(HttpError(Box::new(transport)).into())
            }
        }
    }
}

/// Runs the `ListObjectsV2` pagination: `fetch_page` gets the continuation
/// token of the previous page (none for the first) and returns the XML body.
fn collect_pages(
    bucket: &str,
    mut fetch_page: impl FnMut(Option<&str>) -> Result<String, Error>,
) -> Result<Vec<ObjectSummary>, Error> {
    let mut objects = Vec::new();
    let mut continuation_token: Option<String> = None;
    loop {
        let xml = fetch_page(continuation_token.as_deref())?;
        let page =
            list::parse_list_page(&xml).map_err(|e| Error::InvalidListing(bucket.to_owned(), e))?;
        tracing::debug!(
            "fetched {} objects from bucket '{}'",
            page.objects.len(),
            bucket
        );
        objects.extend(page.objects);
        match page.next_continuation_token {
            Some(token) => continuation_token = Some(token),
            None => break,
        }
    }
    Ok(objects)
}

impl ObjectStore for Bucket {
    fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, Error> {
        let path = format!("/{}", uri_encode(&self.name, true));
        collect_pages(&self.name, |continuation_token| {
            let mut params = vec![("list-type", "2"), ("prefix", prefix)];
            if let Some(token) = continuation_token {
                params.push(("continuation-token", token));
            }
            self.send("GET", &path, &canonical_query(&params), b"", None)
        })
    }

    fn put_object(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), Error> {
        let path = self.object_path(key);
        self.send("PUT", &path, "", body, Some(content_type))?;
        Ok(())
    }
}
