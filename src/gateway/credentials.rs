// Credential table for authenticated writes
use serde::Deserialize;
use thiserror::Error;

/// One configured user
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Credential {
    pub username: String,
    /// Opaque bcrypt verifier string
    #[serde(alias = "saltedHash")]
    pub salted_hash: String,
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Authorized users table is not a valid JSON array of credentials: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Holds the raw JSON credential table as configured.
///
/// The table is decoded on every lookup so a malformed table fails the
/// request that needed it rather than process start-up.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    raw: String,
}

impl CredentialStore {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Decode the whole table. An unset or blank table has no users.
    pub fn load(&self) -> Result<Vec<Credential>, CredentialError> {
        if self.raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&self.raw)?)
    }

    /// First credential whose username matches exactly
    pub fn find(&self, username: &str) -> Result<Option<Credential>, CredentialError> {
        Ok(self.load()?.into_iter().find(|c| c.username == username))
    }
}
