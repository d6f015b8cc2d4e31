//! Origin Fetch Boundary
//!
//! Before synthesizing anything the gateway asks the origin web server for
//! the same request. This module defines the request/response shapes that
//! cross that boundary and the `Origin` trait implementations plug into.

pub mod http_origin;
pub mod mock_origin;

use actix_web::http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH};
use actix_web::http::{Method, StatusCode};
use actix_web::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use std::fmt;
use thiserror::Error;

/// Origin fetch errors
#[derive(Debug, Error)]
pub enum OriginError {
    #[error("Invalid origin request: {0}")]
    InvalidRequest(String),

    #[error("Origin request failed: {0}")]
    Transport(String),
}

/// Headers that describe a single connection rather than the message and
/// must not be forwarded in either direction
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// The inbound request, re-targeted at the origin
#[derive(Debug, Clone)]
pub struct OriginRequest {
    pub method: Method,
    pub path_and_query: String,
    pub headers: Vec<(String, String)>,
}

impl OriginRequest {
    /// Build an origin request from the inbound one, dropping `Host` and
    /// hop-by-hop headers
    pub fn from_http_request(req: &HttpRequest) -> Self {
        let path_and_query = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.path().to_string());

        let headers = req
            .headers()
            .iter()
            .filter(|(name, _)| *name != "host" && !is_hop_by_hop(name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Self {
            method: req.method().clone(),
            path_and_query,
            headers,
        }
    }
}

/// The narrow view of an origin response the fallback decision consumes
pub trait ResponseMeta {
    fn status(&self) -> StatusCode;
    fn header(&self, name: &str) -> Option<&str>;
    fn url(&self) -> &str;
}

/// Origin response body: already in memory, or still arriving from the origin
pub enum OriginBody {
    Buffered(Bytes),
    Streaming(BoxStream<'static, Result<Bytes, OriginError>>),
}

impl OriginBody {
    fn into_stream(self) -> BoxStream<'static, Result<Bytes, OriginError>> {
        match self {
            OriginBody::Buffered(bytes) => stream::once(async move { Ok(bytes) }).boxed(),
            OriginBody::Streaming(body) => body,
        }
    }
}

impl fmt::Debug for OriginBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginBody::Buffered(bytes) => write!(f, "Buffered({} bytes)", bytes.len()),
            OriginBody::Streaming(_) => f.write_str("Streaming"),
        }
    }
}

/// Status, headers and final URL of an origin response. The body is only
/// read if the response is passed through.
#[derive(Debug)]
pub struct OriginResponse {
    pub status: StatusCode,
    pub url: String,
    pub headers: HeaderMap,
    pub body: OriginBody,
}

impl OriginResponse {
    pub fn new(status: StatusCode, url: impl Into<String>) -> Self {
        Self {
            status,
            url: url.into(),
            headers: HeaderMap::new(),
            body: OriginBody::Buffered(Bytes::new()),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = OriginBody::Buffered(body.into());
        self
    }

    /// Return the origin response to the client unmodified.
    ///
    /// A declared `Content-Length` is kept as is and the body streams
    /// through without chunking, so a HEAD answer still reports the length
    /// of the resource rather than of its empty body.
    pub fn into_http_response(self) -> HttpResponse {
        let declared_length = self.header("content-length").and_then(|v| v.trim().parse::<u64>().ok());
        let OriginResponse { status, headers, body, .. } = self;

        let mut builder = HttpResponse::build(status);
        for (name, value) in headers.iter() {
            if is_hop_by_hop(name.as_str()) || *name == CONTENT_LENGTH {
                continue;
            }
            builder.append_header((name.clone(), value.clone()));
        }

        match (body, declared_length) {
            (body, Some(len)) => builder.no_chunking(len).streaming(body.into_stream()),
            (OriginBody::Buffered(bytes), None) => builder.body(bytes),
            (body, None) => builder.streaming(body.into_stream()),
        }
    }
}

impl ResponseMeta for OriginResponse {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Trait defining how the gateway reaches the origin server
#[async_trait]
pub trait Origin: Send + Sync {
    async fn fetch(&self, request: &OriginRequest) -> Result<OriginResponse, OriginError>;
}
