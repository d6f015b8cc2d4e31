//! Object Storage Layer Abstraction
//!
//! This module provides an abstraction over the bucket the gateway fronts.
//! The storage engine itself is external; implementations here are adapters
//! that expose `put`, `delete` and a paginated, delimiter-aware `list`.

pub mod config;
pub mod local_store;
pub mod mock_store;


use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bucket operation errors
#[derive(Debug, Error)]
pub enum BucketError {
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Invalid listing cursor: {0}")]
    InvalidCursor(String),

    #[error("Bucket backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bucket operations
pub type BucketResult<T> = Result<T, BucketError>;

/// A single object as reported by the bucket listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Full hierarchical key, unique within the bucket
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Upload (last modification) time
    pub uploaded_at: DateTime<Utc>,
    /// Optional content type metadata
    pub content_type: Option<String>,
}

/// Options accepted by [`Bucket::list`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    pub prefix: String,
    pub delimiter: Option<String>,
    pub cursor: Option<String>,
    pub limit: Option<usize>,
    /// Ask the backend to populate optional metadata such as content type
    pub include_metadata: bool,
}

impl ListOptions {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }
}

/// One page returned by the backend's list primitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPage {
    pub objects: Vec<ObjectRecord>,
    pub common_prefixes: Vec<String>,
    pub truncated: bool,
    pub cursor: Option<String>,
}

/// Trait defining the bucket interface the gateway needs
#[async_trait]
pub trait Bucket: Send + Sync {
    /// Store `body` under `key`, replacing any existing object
    async fn put(&self, key: &str, body: Bytes) -> BucketResult<()>;

    /// Remove the object stored under `key`; removing a missing key succeeds
    async fn delete(&self, key: &str) -> BucketResult<()>;

    /// Return one page of objects and common prefixes matching `options`
    async fn list(&self, options: &ListOptions) -> BucketResult<ListingPage>;
}

/// An entry of a delimited listing before it is split into a page.
#[derive(Debug, Clone)]
enum Entry {
    Object(ObjectRecord),
    Prefix(String),
}

impl Entry {
    fn name(&self) -> &str {
        match self {
            Entry::Object(record) => &record.key,
            Entry::Prefix(prefix) => prefix,
        }
    }
}

/// Cut one page out of `records` according to `options`.
///
/// `records` must be sorted by key. Keys under `options.prefix` that contain
/// the delimiter after the prefix collapse into a single common prefix. The
/// cursor is the name of the last entry on the page; the next page starts at
/// the first entry sorting after it.
pub(crate) fn paginate<I>(records: I, options: &ListOptions, default_page_size: usize) -> ListingPage
where
    I: IntoIterator<Item = ObjectRecord>,
{
    let mut entries: Vec<Entry> = Vec::new();

    for record in records {
        let Some(rest) = record.key.strip_prefix(options.prefix.as_str()) else {
            continue;
        };

        let grouped = options
            .delimiter
            .as_deref()
            .filter(|d| !d.is_empty())
            .and_then(|d| rest.find(d).map(|idx| idx + d.len()));

        match grouped {
            Some(end) => {
                let prefix = format!("{}{}", options.prefix, &rest[..end]);
                let seen = matches!(entries.last(), Some(Entry::Prefix(last)) if *last == prefix);
                if !seen {
                    entries.push(Entry::Prefix(prefix));
                }
            }
            None => entries.push(Entry::Object(record)),
        }
    }

    let start = match options.cursor.as_deref() {
        Some(cursor) => entries.partition_point(|e| e.name() <= cursor),
        None => 0,
    };
    let limit = options.limit.unwrap_or(default_page_size).max(1);
    let end = (start + limit).min(entries.len());
    let truncated = end < entries.len();

    let mut page = ListingPage {
        truncated,
        cursor: None,
        ..ListingPage::default()
    };
    if truncated {
        page.cursor = entries.get(end - 1).map(|e| e.name().to_string());
    }

    for entry in entries.drain(start..end) {
        match entry {
            Entry::Object(mut record) => {
                if !options.include_metadata {
                    record.content_type = None;
                }
                page.objects.push(record);
            }
            Entry::Prefix(prefix) => page.common_prefixes.push(prefix),
        }
    }

    page
}
