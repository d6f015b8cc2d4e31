//! Local filesystem bucket implementation
//!
//! Object keys map onto paths under a root directory, with the key separator
//! `/` becoming a directory boundary. Directories only exist to hold objects:
//! empty ones are not listed and are pruned when their last object is deleted.

use crate::storage::{paginate, Bucket, BucketError, BucketResult, ListOptions, ListingPage, ObjectRecord};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Bucket stored as a directory tree on the local filesystem
pub struct LocalBucket {
    root: PathBuf,
    page_size: usize,
}

impl LocalBucket {
    /// Create a bucket rooted at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>, page_size: usize) -> BucketResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        info!("Using local bucket directory: {}", root.display());
        Ok(Self {
            root,
            page_size: page_size.max(1),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to a path under the root, refusing anything that would
    /// escape it or that cannot be represented as a file
    fn object_path(&self, key: &str) -> BucketResult<PathBuf> {
        if key.is_empty() || key.ends_with('/') {
            return Err(BucketError::InvalidKey(key.to_string()));
        }
        let relative = Path::new(key);
        for component in relative.components() {
            if !matches!(component, Component::Normal(_)) {
                return Err(BucketError::InvalidKey(key.to_string()));
            }
        }
        Ok(self.root.join(relative))
    }
}

fn key_for(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}

/// Deepest directory that can hold keys starting with `prefix`.
///
/// `None` when the prefix could never match a stored key, e.g. it names a
/// parent directory.
fn walk_start(root: &Path, prefix: &str) -> Option<PathBuf> {
    let dir = match prefix.rfind('/') {
        Some(idx) => &prefix[..idx],
        None => return Some(root.to_path_buf()),
    };
    let relative = Path::new(dir);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }
    Some(root.join(relative))
}

/// Collect every file whose key starts with `prefix`, sorted by key. Only
/// the directory the prefix points into is walked.
fn scan(root: &Path, prefix: &str) -> io::Result<Vec<ObjectRecord>> {
    let mut records = Vec::new();

    let start = match walk_start(root, prefix) {
        Some(dir) if dir.is_dir() => dir,
        _ => return Ok(records),
    };

    for entry in WalkDir::new(&start).min_depth(1).follow_links(false) {
        let entry = entry.map_err(io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(key) = key_for(root, entry.path()) else {
            warn!("Skipping non UTF-8 path {}", entry.path().display());
            continue;
        };
        if !key.starts_with(prefix) {
            continue;
        }

        let metadata = entry.metadata().map_err(io::Error::other)?;
        let uploaded_at: DateTime<Utc> = metadata.modified()?.into();
        let content_type = mime_guess::from_path(&key).first().map(|m| m.to_string());
        records.push(ObjectRecord {
            key,
            size: metadata.len(),
            uploaded_at,
            content_type,
        });
    }

    records.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(records)
}

/// Remove now-empty directories between `path` and `root`
fn prune_empty_parents(root: &Path, path: &Path) {
    let mut current = path.parent();
    while let Some(dir) = current {
        if dir == root || !dir.starts_with(root) {
            break;
        }
        if std::fs::remove_dir(dir).is_err() {
            break;
        }
        debug!("Pruned empty directory {}", dir.display());
        current = dir.parent();
    }
}

fn join_error(e: tokio::task::JoinError) -> BucketError {
    BucketError::Backend(format!("blocking task failed: {}", e))
}

#[async_trait]
impl Bucket for LocalBucket {
    async fn put(&self, key: &str, body: Bytes) -> BucketResult<()> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &body).await?;
        info!("Local: wrote {} bytes to {}", body.len(), path.display());
        Ok(())
    }

    async fn delete(&self, key: &str) -> BucketResult<()> {
        let path = self.object_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Local: deleted {}", path.display());
                let root = self.root.clone();
                tokio::task::spawn_blocking(move || prune_empty_parents(&root, &path))
                    .await
                    .map_err(join_error)?;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Local: delete of missing key {}", key);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, options: &ListOptions) -> BucketResult<ListingPage> {
        let root = self.root.clone();
        let prefix = options.prefix.clone();
        let records = tokio::task::spawn_blocking(move || scan(&root, &prefix))
            .await
            .map_err(join_error)??;

        Ok(paginate(records, options, self.page_size))
    }
}
