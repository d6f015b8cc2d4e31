//! Per-request path information derived from the inbound URL

use actix_web::HttpRequest;
use thiserror::Error;

/// The request path could not be decoded into an object key
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Path is not valid percent-encoded UTF-8: {0}")]
pub struct PathDecodeError(pub String);

/// Path context for one request
#[derive(Debug, Clone, PartialEq)]
pub struct PathContext {
    /// Path exactly as it appeared in the request URL
    pub raw_path: String,
    /// Object key: path without the leading separator, optionally decoded
    pub object_key: String,
    /// Host name without port
    pub hostname: String,
}

impl PathContext {
    /// Context for the read path
    pub fn for_read(req: &HttpRequest, decode: bool) -> Result<Self, PathDecodeError> {
        let raw_path = req.uri().path().to_string();
        let decoded = if decode {
            percent_decode(&raw_path)?
        } else {
            raw_path.clone()
        };
        let object_key = strip_leading_separators(&decoded);

        Ok(Self {
            object_key,
            hostname: hostname(req),
            raw_path,
        })
    }

    /// Context for PUT and DELETE: `+` stands for a space, then the path is
    /// percent-decoded so an encoded `%2B` still yields a literal plus
    pub fn for_write(req: &HttpRequest) -> Result<Self, PathDecodeError> {
        let raw_path = req.uri().path().to_string();
        let decoded = percent_decode(&raw_path.replace('+', " "))?;
        let object_key = strip_leading_separators(&decoded);

        Ok(Self {
            object_key,
            hostname: hostname(req),
            raw_path,
        })
    }

    /// The normalized request path handed to the renderer
    pub fn display_path(&self) -> String {
        format!("/{}", self.object_key)
    }
}

/// Separators are stripped after decoding so an encoded `%2F` cannot
/// reintroduce a leading one
fn strip_leading_separators(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}

fn percent_decode(path: &str) -> Result<String, PathDecodeError> {
    urlencoding::decode(path)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| PathDecodeError(path.to_string()))
}

fn hostname(req: &HttpRequest) -> String {
    let info = req.connection_info();
    let host = info.host();
    // Bracketed IPv6 literals keep their colons
    let name = match host.rfind(':') {
        Some(idx) if !host[idx..].contains(']') => &host[..idx],
        _ => host,
    };
    name.to_string()
}
