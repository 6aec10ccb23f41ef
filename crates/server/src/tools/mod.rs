//! MCP tool implementations.
//!
//! This module contains all tools exposed by the doccache server.
#![allow(unused_imports)]

pub mod cache_get;
pub mod cache_save;
pub mod mime_check;

pub use cache_get::{CacheGetOutput, CacheGetParams};
pub use cache_save::{CacheSaveOutput, CacheSaveParams};
pub use mime_check::{MimeCheckOutput, MimeCheckParams};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use doccache_client::CacheDocumentService;
    use doccache_core::{AppConfig, FsStore};

    pub fn png(size: usize) -> Vec<u8> {
        let mut body = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        body.resize(size, 0);
        body
    }

    /// Service over a temporary filesystem store that accepts `file://` URLs.
    pub async fn service() -> (tempfile::TempDir, CacheDocumentService) {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig { allow_file_urls: true, cache_dir: dir.path().join("cache"), ..Default::default() };
        let store = FsStore::open(&config.cache_dir).await.unwrap();
        let service = CacheDocumentService::from_config(&config, Arc::new(store)).unwrap();
        (dir, service)
    }
}
