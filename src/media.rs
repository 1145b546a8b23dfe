//! Blob storage for uploaded images

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Image must be a base64 data URL")]
    NotDataUrl,
    #[error("Image payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("Failed to store image: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not a stored upload: {0}")]
    Foreign(String),
}

impl MediaError {
    /// True when the client sent a bad payload rather than storage failing.
    pub fn is_client_error(&self) -> bool { !matches!(self, Self::Io(_) | Self::Foreign(_)) }
}

/// A decoded `data:<mime>;base64,<payload>` upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub extension: String,
    pub bytes: Vec<u8>,
}

pub fn decode_data_url(data_url: &str) -> Result<Upload, MediaError> {
    let (format, payload) = data_url.split_once(";base64,").ok_or(MediaError::NotDataUrl)?;
    let extension = format.rsplit('/').next().filter(|e| !e.is_empty() && !e.contains(':')).ok_or(MediaError::NotDataUrl)?;
    let bytes = general_purpose::STANDARD.decode(payload.trim())?;
    Ok(Upload { extension: extension.to_ascii_lowercase(), bytes })
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores a base64 data URL and returns the URL it can be fetched from.
    async fn put_data_url(&self, data_url: &str) -> Result<String, MediaError>;

    /// Removes a blob previously returned by `put_data_url`. Missing blobs are not an error.
    async fn remove(&self, url: &str) -> Result<(), MediaError>;
}

/// Stores every data URL in order. When one fails, those already stored are removed.
pub async fn put_all(store: &dyn BlobStore, data_urls: &[String]) -> Result<Vec<String>, MediaError> {
    let mut urls = Vec::with_capacity(data_urls.len());
    for data_url in data_urls {
        match store.put_data_url(data_url).await {
            Ok(url) => urls.push(url),
            Err(e) => {
                discard(store, &urls).await;
                return Err(e);
            }
        }
    }
    Ok(urls)
}

/// Removes uploads whose database write did not happen.
pub async fn discard(store: &dyn BlobStore, urls: &[String]) {
    for url in urls {
        match store.remove(url).await {
            Ok(()) => tracing::debug!(%url, "discarded upload"),
            Err(e) => tracing::warn!(%url, error = %e, "upload left orphaned"),
        }
    }
}

/// Writes uploads under a directory served at `base_url`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self { root: root.into(), base_url: base_url.into() }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put_data_url(&self, data_url: &str) -> Result<String, MediaError> {
        let upload = decode_data_url(data_url)?;
        let file_name = format!("{}.{}", Uuid::new_v4(), upload.extension);
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&file_name), &upload.bytes).await?;
        tracing::debug!(file = %file_name, bytes = upload.bytes.len(), "stored upload");
        Ok(format!("{}/{}", self.base_url, file_name))
    }

    async fn remove(&self, url: &str) -> Result<(), MediaError> {
        let file_name = url
            .strip_prefix(self.base_url.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && !name.contains('/') && !name.contains(".."))
            .ok_or_else(|| MediaError::Foreign(url.to_string()))?;
        match tokio::fs::remove_file(self.root.join(file_name)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
