//! Filesystem blob store for file-message attachments.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

use super::traits::BlobStore;

/// Stores attachments under a local directory and serves them as
/// `/uploads/<name>` paths. Filenames are prefixed with a random UUID so
/// concurrent uploads of the same name never collide.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Strip path components from a client-supplied filename.
    fn sanitize(filename: &str) -> Result<&str> {
        let name = filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(filename)
            .trim();
        if name.is_empty() || name == "." || name == ".." {
            return Err(anyhow!("Invalid filename: {:?}", filename));
        }
        Ok(name)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn store(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        let name = Self::sanitize(filename)?;
        let stored_name = format!("{}-{}", Uuid::new_v4(), name);

        tokio::fs::create_dir_all(&self.root)
            .await
            .context("Failed to create upload directory")?;

        let path = self.root.join(&stored_name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write attachment {:?}", path))?;

        debug!(path = %path.display(), size = bytes.len(), "Stored attachment");
        Ok(format!("/uploads/{}", stored_name))
    }
}
