//! Cache document service.
//!
//! Downloads remote images into the hierarchical store and reads them back.
//!
//! Saving runs fetch → sniff → allow-list → write. The file is written only
//! after the content has been fully downloaded and its type accepted, so a
//! failed save never leaves a file behind. The shard folder may already have
//! been created by then; that is harmless because folder creation is
//! idempotent.
//!
//! Errors are returned to the caller as-is. Nothing here logs failures or
//! retries.

use bytes::Bytes;
use std::sync::Arc;

use doccache_core::{AppConfig, DocumentId, Error, HierarchicalStore, mime};

use crate::fetch::{FetchConfig, Fetcher, HttpFetcher};

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDocument {
    /// Opaque retrieval path: shard path followed by the identifier.
    pub path: String,
    /// Media type sniffed from the content.
    pub mime: String,
    /// Size of the stored content in bytes.
    pub size: usize,
}

/// Saves remote documents into the store and serves them back.
pub struct CacheDocumentService {
    store: Arc<dyn HierarchicalStore>,
    fetcher: Arc<dyn Fetcher>,
    max_bytes: usize,
}

impl CacheDocumentService {
    pub fn new(store: Arc<dyn HierarchicalStore>, fetcher: Arc<dyn Fetcher>, max_bytes: usize) -> Self {
        Self { store, fetcher, max_bytes }
    }

    /// Build a service over `store` with an HTTP fetcher configured from `config`.
    pub fn from_config(config: &AppConfig, store: Arc<dyn HierarchicalStore>) -> Result<Self, Error> {
        let fetcher = HttpFetcher::new(FetchConfig::from(config))?;
        Ok(Self::new(store, Arc::new(fetcher), config.max_size_bytes()))
    }

    /// Byte ceiling applied to each download.
    pub fn max_size_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Download `url` and store it under a fresh identifier.
    ///
    /// # Errors
    ///
    /// - `UnreachableSource` / `ContentTooLarge` from the fetch
    /// - `MimeRejected` when the sniffed type is not an allowed image type
    /// - `StoreWriteError` when the folder or file cannot be written
    pub async fn save_remote_file_to_cache(&self, url: &str) -> Result<SavedDocument, Error> {
        let id = DocumentId::generate();
        let shard = id.shard_path();

        let folder = self
            .store
            .ensure_folder(&shard)
            .await
            .map_err(|e| Error::StoreWriteError(e.to_string()))?;

        let content = self.fetcher.fetch(url, self.max_size_bytes()).await?;

        let sniffed = mime::sniff(&content);
        mime::filter_mime_types(sniffed)?;

        self.store
            .write_file(&folder, id.as_str(), &content)
            .await
            .map_err(|e| Error::StoreWriteError(e.to_string()))?;

        let path = id.cache_path();
        tracing::debug!(path = %path, mime = sniffed, size = content.len(), "cached remote document");

        Ok(SavedDocument { path, mime: sniffed.to_string(), size: content.len() })
    }

    /// Read back a document previously saved under `path`.
    ///
    /// # Errors
    ///
    /// - `DocumentDoesNotExist` when `path` is empty
    /// - `CacheContentUnavailable` for any store failure
    pub async fn get_content_from_cache(&self, path: &str) -> Result<Bytes, Error> {
        if path.is_empty() {
            return Err(Error::DocumentDoesNotExist);
        }

        self.store
            .read_file(path)
            .await
            .map_err(|e| Error::CacheContentUnavailable(e.to_string()))
    }

    /// Check a media type against the cache allow-list before fetching.
    pub fn filter_mime_types(&self, mime: &str) -> Result<(), Error> {
        mime::filter_mime_types(mime)
    }
}
