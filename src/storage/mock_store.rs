//! In-memory implementation of the Bucket trait, used by tests and the
//! `Memory` backend

use crate::storage::{paginate, Bucket, BucketError, BucketResult, ListOptions, ListingPage, ObjectRecord};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use log::info;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Default number of entries per listing page
pub const DEFAULT_PAGE_SIZE: usize = 1000;

struct StoredObject {
    data: Bytes,
    uploaded_at: DateTime<Utc>,
    content_type: Option<String>,
}

/// In-memory bucket keyed by object key
pub struct MemoryBucket {
    objects: Arc<Mutex<BTreeMap<String, StoredObject>>>,
    list_calls: Arc<Mutex<Vec<ListOptions>>>,
    page_size: usize,
}

impl MemoryBucket {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            objects: Arc::new(Mutex::new(BTreeMap::new())),
            list_calls: Arc::new(Mutex::new(Vec::new())),
            page_size: page_size.max(1),
        }
    }

    fn lock_objects(&self) -> BucketResult<MutexGuard<'_, BTreeMap<String, StoredObject>>> {
        self.objects
            .lock()
            .map_err(|_| BucketError::Backend("memory bucket lock poisoned".to_string()))
    }

    /// Insert an object with an explicit upload time
    pub fn insert(&self, key: &str, data: impl Into<Bytes>, uploaded_at: DateTime<Utc>) -> BucketResult<()> {
        let data = data.into();
        let content_type = mime_guess::from_path(key).first().map(|m| m.to_string());
        self.lock_objects()?.insert(
            key.to_string(),
            StoredObject {
                data,
                uploaded_at,
                content_type,
            },
        );
        Ok(())
    }

    /// Get the stored bytes of an object
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.lock_objects().ok()?.get(key).map(|o| o.data.clone())
    }

    /// Check if an object exists
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Get the number of objects in the bucket
    pub fn object_count(&self) -> usize {
        self.lock_objects().map(|o| o.len()).unwrap_or(0)
    }

    /// Every set of options `list` has been called with, in call order
    pub fn list_calls(&self) -> Vec<ListOptions> {
        self.list_calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Default for MemoryBucket {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bucket for MemoryBucket {
    async fn put(&self, key: &str, body: Bytes) -> BucketResult<()> {
        if key.is_empty() {
            return Err(BucketError::InvalidKey("empty key".to_string()));
        }
        info!("Memory: stored {} bytes at key {}", body.len(), key);
        self.insert(key, body, Utc::now())
    }

    async fn delete(&self, key: &str) -> BucketResult<()> {
        let removed = self.lock_objects()?.remove(key).is_some();
        info!("Memory: delete key {} (existed: {})", key, removed);
        Ok(())
    }

    async fn list(&self, options: &ListOptions) -> BucketResult<ListingPage> {
        if let Ok(mut calls) = self.list_calls.lock() {
            calls.push(options.clone());
        }

        let objects = self.lock_objects()?;
        let records = objects
            .range(options.prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(options.prefix.as_str()))
            .map(|(key, object)| ObjectRecord {
                key: key.clone(),
                size: object.data.len() as u64,
                uploaded_at: object.uploaded_at,
                content_type: object.content_type.clone(),
            });

        Ok(paginate(records, options, self.page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn test_memory_bucket_basic_operations() {
        let bucket = MemoryBucket::new();
        assert_eq!(bucket.object_count(), 0);

        bucket.put("docs/readme.txt", Bytes::from_static(b"hello")).await.unwrap();
        assert!(bucket.contains("docs/readme.txt"));
        assert_eq!(bucket.get("docs/readme.txt").unwrap(), Bytes::from_static(b"hello"));

        // Overwrite replaces the content
        bucket.put("docs/readme.txt", Bytes::from_static(b"bye")).await.unwrap();
        assert_eq!(bucket.object_count(), 1);
        assert_eq!(bucket.get("docs/readme.txt").unwrap(), Bytes::from_static(b"bye"));

        bucket.delete("docs/readme.txt").await.unwrap();
        assert!(!bucket.contains("docs/readme.txt"));

        // Deleting a missing key is not an error
        bucket.delete("docs/readme.txt").await.unwrap();
    }

    #[actix_web::test]
    async fn test_memory_bucket_rejects_empty_key() {
        let bucket = MemoryBucket::new();
        let err = bucket.put("", Bytes::from_static(b"x")).await.unwrap_err();
        assert!(matches!(err, BucketError::InvalidKey(_)));
    }

    #[actix_web::test]
    async fn test_memory_bucket_paginates_and_records_calls() {
        let bucket = MemoryBucket::with_page_size(2);
        for key in ["p/a", "p/b", "p/c", "q/d"] {
            bucket.put(key, Bytes::from_static(b"1")).await.unwrap();
        }

        let first = bucket.list(&ListOptions::new("p/")).await.unwrap();
        assert_eq!(first.objects.len(), 2);
        assert!(first.truncated);

        let mut next = ListOptions::new("p/");
        next.cursor = first.cursor.clone();
        let second = bucket.list(&next).await.unwrap();
        assert_eq!(second.objects.len(), 1);
        assert_eq!(second.objects[0].key, "p/c");
        assert!(!second.truncated);

        let calls = bucket.list_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].cursor, None);
        assert_eq!(calls[1].cursor, first.cursor);
    }
}
