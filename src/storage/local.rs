//! Filesystem blob store.
//!
//! Objects live directly under the root directory, one file per key. Writes go
//! through a temp file and a rename so readers never observe a partial image.

use super::{content_type_for, Blob, BlobStore};
use anyhow::{bail, Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory if needed.
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create upload dir {:?}", self.root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Keys must be a single plain path component.
    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || key.starts_with('.')
            || key.contains(|c: char| c == '/' || c == '\\')
            || key.contains("..")
        {
            bail!("Invalid object key: {:?}", key);
        }
        Ok(self.root.join(key))
    }
}

#[async_trait::async_trait]
impl BlobStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn put(&self, key: &str, data: &[u8], _content_type: &str) -> Result<String> {
        let full_path = self.path_for(key)?;
        debug!(key = %key, path = %full_path.display(), size = data.len(), "local store: write");

        fs::create_dir_all(&self.root).await?;

        let temp_path = self.root.join(format!(".{}.tmp", key));
        let mut file = fs::File::create(&temp_path)
            .await
            .with_context(|| format!("Failed to create {:?}", temp_path))?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &full_path).await {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "local store: rename failed");
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(full_path.display().to_string())
    }

    async fn get(&self, key: &str) -> Result<Option<Blob>> {
        let full_path = match self.path_for(key) {
            Ok(path) => path,
            Err(_) => return Ok(None),
        };

        match fs::read(&full_path).await {
            Ok(data) => Ok(Some(Blob {
                data,
                content_type: content_type_for(key).to_string(),
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {:?}", full_path)),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let full_path = self.path_for(key)?;
        fs::remove_file(&full_path)
            .await
            .with_context(|| format!("Failed to delete {:?}", full_path))
    }

    async fn signed_url(&self, _key: &str, _ttl: Duration) -> Result<Option<String>> {
        Ok(None)
    }
}
