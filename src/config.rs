//! Application Configuration
//!
//! YAML configuration with defaults for every field. The file path comes
//! from `GATEWAY_CONFIG` (default `config.yaml`); a missing file means all
//! defaults. A few values can be overridden from the environment.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::render::descriptions::default_descriptions;
use crate::storage::config::{BucketBackend, BucketConfig};

pub const CONFIG_PATH_ENV: &str = "GATEWAY_CONFIG";
pub const AUTHORIZED_USERS_ENV: &str = "AUTHORIZED_USERS";
pub const BUCKET_BACKEND_ENV: &str = "BUCKET_BACKEND";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub bucket: BucketConfig,
    pub origin: OriginConfig,
    pub listing: ListingConfig,
    pub auth: AuthConfig,
    /// Exact path → description shown next to listing rows
    pub descriptions: HashMap<String, String>,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Number of worker threads
    pub workers: usize,
    /// Maximum upload size in bytes
    pub max_payload_size: u64,
}

/// Where origin requests are sent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    pub base_url: String,
}

/// Synthesized listing behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub delimiter: String,
    /// Upper bound on pages drained for one listing
    pub max_pages: usize,
    /// Percent-decode the request path before using it as a prefix
    pub decode_path: bool,
    /// Let a zero-length origin 404 on a folder path win over the listing
    pub overwrite_zero_byte_object: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// JSON array of `{username, salted_hash}` records
    pub authorized_users: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Path to log configuration file
    pub config_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9710,
            workers: 4,
            max_payload_size: 1073741824, // 1GB
        }
    }
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            delimiter: "/".to_string(),
            max_pages: 10_000,
            decode_path: true,
            overwrite_zero_byte_object: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            config_file: "server_log.yaml".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            bucket: BucketConfig::default(),
            origin: OriginConfig::default(),
            listing: ListingConfig::default(),
            auth: AuthConfig::default(),
            descriptions: default_descriptions(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file, use defaults if not found, then apply
    /// environment overrides
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(&config_path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn from_file(config_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        if Path::new(config_path).exists() {
            let content = fs::read_to_string(config_path)?;
            let config: AppConfig = serde_yaml::from_str(&content)?;
            info!("Loaded configuration from {}", config_path);
            Ok(config)
        } else {
            warn!("Config file {} not found, using defaults", config_path);
            Ok(Self::default())
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Ok(users) = env::var(AUTHORIZED_USERS_ENV) {
            info!("Authorized users taken from {}", AUTHORIZED_USERS_ENV);
            self.auth.authorized_users = users;
        }
        if let Ok(backend) = env::var(BUCKET_BACKEND_ENV) {
            self.bucket.backend = backend.parse::<BucketBackend>()?;
            info!("Bucket backend overridden to {:?}", self.bucket.backend);
        }
        Ok(())
    }
}
