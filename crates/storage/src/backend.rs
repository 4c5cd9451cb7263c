use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::ObjectStore;
use tracing::{debug, info, warn};

use sparkify_core::config::AwsConfig;
use sparkify_core::RootLocation;

use crate::error::StorageError;
use crate::table::partition::unescape_path_name;

/// Parallel uploads per table write on S3.
const UPLOAD_CONCURRENCY: usize = 8;

/// Unified storage backend for one root (input or output).
///
/// Keys are always `/`-separated and relative to the root.
pub enum StorageBackend {
    Local(LocalBackend),
    S3(S3Backend),
}

impl StorageBackend {
    /// Resolve a configured root string to a backend.
    pub fn for_root(root: &str, aws: &AwsConfig) -> Result<Self, StorageError> {
        let location = RootLocation::parse(root)?;
        debug!(root = %location, "resolved storage root");
        match location {
            RootLocation::Local(path) => Ok(StorageBackend::Local(LocalBackend::new(&path))),
            RootLocation::S3 { bucket, prefix } => {
                Ok(StorageBackend::S3(S3Backend::new(aws, &bucket, &prefix)?))
            }
        }
    }

    /// Human-readable location of a key, for logs and errors.
    pub fn describe(&self, key: &str) -> String {
        match self {
            StorageBackend::Local(b) => b.resolve(key).display().to_string(),
            StorageBackend::S3(b) => format!("s3://{}/{}", b.bucket, b.full_key(key)),
        }
    }

    /// All object keys under `prefix`, sorted.
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        match self {
            StorageBackend::Local(b) => b.list(prefix),
            StorageBackend::S3(b) => b.list(prefix).await,
        }
    }

    pub async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        match self {
            StorageBackend::Local(b) => {
                let data = tokio::fs::read(b.resolve(key)).await?;
                Ok(Bytes::from(data))
            }
            StorageBackend::S3(b) => {
                let result = b.store.get(&b.object_path(key)).await?;
                Ok(result.bytes().await?)
            }
        }
    }

    /// Whether anything exists at `key` (a file, a directory or a prefix).
    pub async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self {
            StorageBackend::Local(b) => Ok(tokio::fs::try_exists(b.resolve(key)).await?),
            StorageBackend::S3(b) => Ok(!b.list(key).await?.is_empty()),
        }
    }

    /// Replace everything under `dest` with `files` (paths relative to `dest`).
    pub async fn replace_prefix(
        &self,
        dest: &str,
        files: Vec<(String, Bytes)>,
        run_id: &str,
    ) -> Result<(), StorageError> {
        match self {
            StorageBackend::Local(b) => b.replace_dir(dest, files, run_id).await,
            StorageBackend::S3(b) => b.replace_prefix(dest, files).await,
        }
    }
}

fn join_key(base: &str, key: &str) -> String {
    match (base.is_empty(), key.is_empty()) {
        (true, _) => key.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{}/{}", base.trim_end_matches('/'), key),
    }
}

// ── Local ─────────────────────────────────────────────────────

/// Local filesystem backend.
pub struct LocalBackend {
    pub root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: &Path) -> Self {
        let canonical = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        info!("Storage: local backend at {}", canonical.display());
        Self { root: canonical }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        if key.is_empty() {
            self.root.clone()
        } else {
            self.root.join(key)
        }
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let dir = self.resolve(prefix);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in walkdir::WalkDir::new(&dir).follow_links(true) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(&self.root) {
                let key = rel.to_str().ok_or_else(|| {
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("non UTF-8 file name: {}", entry.path().display()),
                    )
                })?;
                keys.push(key.replace('\\', "/"));
            }
        }

        keys.sort();
        Ok(keys)
    }

    /// Stage the new tree next to the destination, then swap it in with two
    /// renames. Until the first rename succeeds the old contents are intact.
    async fn replace_dir(
        &self,
        dest: &str,
        files: Vec<(String, Bytes)>,
        run_id: &str,
    ) -> Result<(), StorageError> {
        let dest_dir = self.resolve(dest);
        let parent = dest_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        let name = dest_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("table")
            .to_string();
        tokio::fs::create_dir_all(&parent).await?;

        let staging = parent.join(format!(".{name}.staging-{run_id}"));
        if let Err(e) = write_tree(&staging, &files).await {
            remove_path(&staging).await.ok();
            return Err(e);
        }

        let trash = parent.join(format!(".{name}.trash-{run_id}"));
        let had_previous = match tokio::fs::try_exists(&dest_dir).await {
            Ok(exists) => exists,
            Err(e) => {
                remove_path(&staging).await.ok();
                return Err(e.into());
            }
        };
        if had_previous {
            if let Err(e) = tokio::fs::rename(&dest_dir, &trash).await {
                remove_path(&staging).await.ok();
                return Err(e.into());
            }
        }

        if let Err(e) = tokio::fs::rename(&staging, &dest_dir).await {
            if had_previous {
                restore_previous(&trash, &dest_dir).await;
            }
            remove_path(&staging).await.ok();
            return Err(e.into());
        }

        if had_previous {
            if let Err(e) = remove_path(&trash).await {
                warn!(path = %trash.display(), error = %e, "failed to remove replaced table");
            }
        }

        debug!(dest = %dest_dir.display(), files = files.len(), "swapped in new table");
        Ok(())
    }
}

/// Move the previous table back after a failed swap. Returns false, with a
/// warning naming the trash path, when the old contents stay stranded.
async fn restore_previous(trash: &Path, dest: &Path) -> bool {
    match tokio::fs::rename(trash, dest).await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                path = %trash.display(),
                dest = %dest.display(),
                error = %e,
                "failed to restore previous table; old contents left in trash"
            );
            false
        }
    }
}

async fn write_tree(dir: &Path, files: &[(String, Bytes)]) -> Result<(), StorageError> {
    tokio::fs::create_dir_all(dir).await?;
    for (rel, data) in files {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
    }
    Ok(())
}

async fn remove_path(path: &Path) -> std::io::Result<()> {
    if tokio::fs::metadata(path).await?.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    }
}

// ── S3 ────────────────────────────────────────────────────────

/// S3 backend.
pub struct S3Backend {
    pub store: Arc<dyn ObjectStore>,
    pub bucket: String,
    pub prefix: String,
}

impl S3Backend {
    pub fn new(aws: &AwsConfig, bucket: &str, prefix: &str) -> Result<Self, StorageError> {
        let mut builder = AmazonS3Builder::new()
            .with_region(&aws.region)
            .with_bucket_name(bucket);

        if let Some(ref key) = aws.access_key_id {
            builder = builder.with_access_key_id(key);
        }
        if let Some(ref secret) = aws.secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }
        if let Some(ref token) = aws.session_token {
            builder = builder.with_token(token);
        }

        if let Some(ref endpoint) = aws.endpoint_url {
            // object_store requires absolute endpoint URLs
            let endpoint_url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                endpoint.clone()
            } else {
                format!("https://{}", endpoint)
            };
            builder = builder
                .with_endpoint(&endpoint_url)
                .with_allow_http(endpoint_url.starts_with("http://"));
        }

        let store = builder.build()?;
        let prefix = prefix.trim_matches('/').to_string();

        info!(
            "Storage: S3 backend s3://{}/{} (region: {})",
            bucket, prefix, aws.region
        );

        Ok(Self {
            store: Arc::new(store),
            bucket: bucket.to_string(),
            prefix,
        })
    }

    fn full_key(&self, key: &str) -> String {
        join_key(&self.prefix, key)
    }

    fn object_path(&self, key: &str) -> object_store::path::Path {
        object_store::path::Path::from(self.full_key(key).as_str())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let path = self.object_path(prefix);
        let mut stream = self.store.list(Some(&path));
        let root = if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", self.prefix)
        };

        let mut keys = Vec::new();
        while let Some(meta) = stream.try_next().await? {
            // object_store percent-encodes reserved characters per segment;
            // undo that so keys round-trip with what callers put.
            let key = unescape_path_name(meta.location.as_ref());
            let rel = key.strip_prefix(&root).unwrap_or(&key);
            keys.push(rel.to_string());
        }

        keys.sort();
        Ok(keys)
    }

    /// Put every new object (names carry the run id), then delete whatever
    /// else lives under the prefix. S3 has no prefix rename, so readers may
    /// briefly see both generations.
    async fn replace_prefix(&self, dest: &str, files: Vec<(String, Bytes)>) -> Result<(), StorageError> {
        let new_keys: HashSet<String> = files.iter().map(|(rel, _)| join_key(dest, rel)).collect();

        stream::iter(files)
            .map(|(rel, data)| {
                let store = self.store.clone();
                let path = self.object_path(&join_key(dest, &rel));
                async move { store.put(&path, data.into()).await.map(|_| ()) }
            })
            .buffer_unordered(UPLOAD_CONCURRENCY)
            .try_collect::<Vec<_>>()
            .await?;

        let mut deleted = 0usize;
        for key in self.list(dest).await? {
            if new_keys.contains(&key) {
                continue;
            }
            self.store.delete(&self.object_path(&key)).await?;
            deleted += 1;
        }

        debug!(
            dest = %dest,
            uploaded = new_keys.len(),
            deleted,
            "replaced S3 prefix"
        );
        Ok(())
    }
}
