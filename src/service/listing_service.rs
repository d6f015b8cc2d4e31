//! Listing service: drains the bucket's paginated list primitive into one
//! complete snapshot

use crate::storage::{Bucket, BucketError, ListOptions, ObjectRecord};
use log::{debug, error};
use std::sync::Arc;
use thiserror::Error;

/// Listing aggregation errors
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("Bucket listing failed: {0}")]
    Bucket(#[from] BucketError),

    #[error("Listing of prefix '{prefix}' exceeded {max_pages} pages")]
    TooManyPages { prefix: String, max_pages: usize },

    #[error("Listing page for prefix '{0}' is truncated but carries no cursor")]
    MissingCursor(String),
}

/// Every object and common prefix matching one query, gathered from all pages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedListing {
    pub objects: Vec<ObjectRecord>,
    pub common_prefixes: Vec<String>,
    /// Always false once aggregation succeeds
    pub truncated: bool,
}

impl AggregatedListing {
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.common_prefixes.is_empty()
    }
}

/// Listing service wrapping the injected bucket
pub struct ListingService {
    bucket: Arc<dyn Bucket>,
    max_pages: usize,
}

impl ListingService {
    pub fn new(bucket: Arc<dyn Bucket>, max_pages: usize) -> Self {
        Self {
            bucket,
            max_pages: max_pages.max(1),
        }
    }

    /// Request pages until one reports `truncated = false`, concatenating
    /// objects and common prefixes in arrival order.
    ///
    /// The caller's `cursor` and `limit` are ignored; pagination state is
    /// owned here. Any page failure aborts the whole listing.
    pub async fn list_all(&self, options: &ListOptions) -> Result<AggregatedListing, ListingError> {
        let mut request = ListOptions {
            cursor: None,
            limit: None,
            ..options.clone()
        };
        let mut listing = AggregatedListing::default();

        for page_number in 1..=self.max_pages {
            let page = self.bucket.list(&request).await.map_err(|e| {
                error!("Listing page {} for prefix '{}' failed: {}", page_number, request.prefix, e);
                e
            })?;
            debug!(
                "Listing page {} for prefix '{}': {} objects, {} prefixes, truncated={}",
                page_number,
                request.prefix,
                page.objects.len(),
                page.common_prefixes.len(),
                page.truncated
            );

            listing.objects.extend(page.objects);
            listing.common_prefixes.extend(page.common_prefixes);

            if !page.truncated {
                return Ok(listing);
            }
            match page.cursor {
                Some(cursor) => request.cursor = Some(cursor),
                None => return Err(ListingError::MissingCursor(request.prefix)),
            }
        }

        Err(ListingError::TooManyPages {
            prefix: request.prefix,
            max_pages: self.max_pages,
        })
    }

    /// List the immediate children of `prefix`, grouped by `delimiter`
    pub async fn list_directory(&self, prefix: &str, delimiter: &str) -> Result<AggregatedListing, ListingError> {
        let mut options = ListOptions::new(prefix).with_delimiter(delimiter);
        options.include_metadata = true;
        self.list_all(&options).await
    }
}
