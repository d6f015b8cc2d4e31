//! Configuration for bucket backends

use crate::storage::{local_store::LocalBucket, mock_store::MemoryBucket, Bucket, BucketResult};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Available bucket backends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum BucketBackend {
    #[default]
    Local,
    Memory,
}

impl std::str::FromStr for BucketBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "fs" | "filesystem" => Ok(BucketBackend::Local),
            "memory" | "mock" => Ok(BucketBackend::Memory),
            _ => Err(format!("Unknown bucket backend: {}", s)),
        }
    }
}

/// Bucket backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketConfig {
    /// Bucket backend type
    pub backend: BucketBackend,
    /// Root directory of the local backend
    pub root: String,
    /// Entries returned per listing page
    pub page_size: usize,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            backend: BucketBackend::Local,
            root: "./data/bucket".to_string(),
            page_size: 1000,
        }
    }
}

impl BucketConfig {
    /// Create a bucket instance based on the configuration
    pub fn create_bucket(&self) -> BucketResult<Arc<dyn Bucket>> {
        match self.backend {
            BucketBackend::Local => {
                info!("Using local bucket backend with root: {}, page_size: {}", self.root, self.page_size);
                Ok(Arc::new(LocalBucket::new(&self.root, self.page_size)?))
            }
            BucketBackend::Memory => {
                info!("Using in-memory bucket backend with page_size: {}", self.page_size);
                Ok(Arc::new(MemoryBucket::with_page_size(self.page_size)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_backend_from_str() {
        assert_eq!("local".parse::<BucketBackend>().unwrap(), BucketBackend::Local);
        assert_eq!("FS".parse::<BucketBackend>().unwrap(), BucketBackend::Local);
        assert_eq!("memory".parse::<BucketBackend>().unwrap(), BucketBackend::Memory);
        assert_eq!("MOCK".parse::<BucketBackend>().unwrap(), BucketBackend::Memory);

        assert!("r2".parse::<BucketBackend>().is_err());
    }

    #[test]
    fn test_bucket_config_default() {
        let config = BucketConfig::default();
        assert_eq!(config.backend, BucketBackend::Local);
        assert_eq!(config.page_size, 1000);
    }

    #[test]
    fn test_create_bucket() {
        let dir = tempfile::TempDir::new().unwrap();
        let local_config = BucketConfig {
            backend: BucketBackend::Local,
            root: dir.path().join("bucket").display().to_string(),
            page_size: 10,
        };
        let memory_config = BucketConfig {
            backend: BucketBackend::Memory,
            ..BucketConfig::default()
        };

        assert!(local_config.create_bucket().is_ok());
        assert!(dir.path().join("bucket").is_dir());
        assert!(memory_config.create_bucket().is_ok());
    }
}
