//! Application State Management
//!
//! Holds every collaborator the request handlers need. Everything here is
//! built once at start-up and only read afterwards.

use log::info;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::gateway::credentials::CredentialStore;
use crate::origin::{http_origin::HttpOrigin, Origin};
use crate::render::descriptions::DescriptionIndex;
use crate::service::fallback::FallbackPolicy;
use crate::service::listing_service::ListingService;
use crate::storage::Bucket;

/// Application state containing all services and their dependencies
#[derive(Clone)]
pub struct AppState {
    pub bucket: Arc<dyn Bucket>,
    pub origin: Arc<dyn Origin>,
    pub listing_service: Arc<ListingService>,
    pub credentials: CredentialStore,
    pub descriptions: Arc<DescriptionIndex>,
    pub fallback: FallbackPolicy,
    pub config: AppConfig,
}

impl AppState {
    /// Create application state from configuration
    pub fn from_config(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing application state with configuration");

        let bucket = config.bucket.create_bucket()?;
        info!("Using origin at {}", config.origin.base_url);
        let origin: Arc<dyn Origin> = Arc::new(HttpOrigin::new(&config.origin.base_url)?);
        let users = config.auth.authorized_users.clone();

        let state = Self::with_components(config, bucket, origin, users);
        info!("Application state initialized successfully");
        Ok(state)
    }

    /// Assemble state around explicitly provided bucket and origin
    pub fn with_components(
        config: AppConfig,
        bucket: Arc<dyn Bucket>,
        origin: Arc<dyn Origin>,
        authorized_users: impl Into<String>,
    ) -> Self {
        let listing_service = Arc::new(ListingService::new(bucket.clone(), config.listing.max_pages));
        let descriptions = Arc::new(DescriptionIndex::new(config.descriptions.clone()));
        let fallback = FallbackPolicy::new(config.listing.overwrite_zero_byte_object);

        Self {
            bucket,
            origin,
            listing_service,
            credentials: CredentialStore::new(authorized_users),
            descriptions,
            fallback,
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::config::BucketBackend;

    #[test]
    fn test_from_config_with_memory_backend() {
        let mut config = AppConfig::default();
        config.bucket.backend = BucketBackend::Memory;
        config.listing.overwrite_zero_byte_object = true;
        config.auth.authorized_users = "[]".to_string();

        let state = AppState::from_config(config).unwrap();
        assert!(state.fallback.overwrite_zero_byte_object);
        assert_eq!(state.descriptions.describe("/"), Some("Root"));
        assert!(state.credentials.load().unwrap().is_empty());
    }

    #[test]
    fn test_from_config_rejects_bad_origin_url() {
        let mut config = AppConfig::default();
        config.bucket.backend = BucketBackend::Memory;
        config.origin.base_url = "not a url".to_string();
        assert!(AppState::from_config(config).is_err());
    }
}
