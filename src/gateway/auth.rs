// HTTP Basic authentication for mutating requests
use actix_web::{web, HttpRequest};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, warn};
use thiserror::Error;

use crate::gateway::credentials::{CredentialError, CredentialStore};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error("Password verification did not complete: {0}")]
    Verification(String),
}

/// Username and password pulled from a Basic `Authorization` header
#[derive(Debug, Clone, PartialEq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// Parse `Basic <base64(user:pass)>`.
///
/// Only the first colon separates the two parts, so passwords may contain
/// colons. Both parts are trimmed. A payload without any colon is a username
/// with an empty password.
pub fn parse_basic_authorization(header: &str) -> Option<BasicCredentials> {
    let encoded = header.strip_prefix("Basic")?.trim();
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    let (username, password) = decoded.split_once(':').unwrap_or((decoded.as_str(), ""));
    Some(BasicCredentials {
        username: username.trim().to_string(),
        password: password.trim().to_string(),
    })
}

/// Check the request's Basic credentials against the configured table.
///
/// Every rejection (missing header, other scheme, unknown user, wrong
/// password, unusable stored hash) yields `Ok(false)`. Only an undecodable
/// credential table or a lost verification task is an error.
///
/// The bcrypt comparison is CPU-bound and runs on the blocking pool.
pub async fn authorize(req: &HttpRequest, store: &CredentialStore) -> Result<bool, AuthError> {
    let header = match req.headers().get("Authorization").and_then(|h| h.to_str().ok()) {
        Some(h) => h,
        None => {
            debug!("Authorization header missing or not readable");
            return Ok(false);
        }
    };

    let credentials = match parse_basic_authorization(header) {
        Some(c) => c,
        None => {
            debug!("Authorization header is not valid Basic credentials");
            return Ok(false);
        }
    };

    let user = match store.find(&credentials.username)? {
        Some(u) => u,
        None => {
            debug!("Unknown user: {}", credentials.username);
            return Ok(false);
        }
    };

    let password = credentials.password;
    let salted_hash = user.salted_hash;
    let verified = web::block(move || bcrypt::verify(password, &salted_hash))
        .await
        .map_err(|e| AuthError::Verification(e.to_string()))?;

    match verified {
        Ok(valid) => {
            if !valid {
                debug!("Password mismatch for user: {}", user.username);
            }
            Ok(valid)
        }
        Err(e) => {
            warn!("Stored hash for user {} could not be verified: {}", user.username, e);
            Ok(false)
        }
    }
}
