//! cache_save tool implementation.
//!
//! Downloads an image by URL and stores it in the document cache.

use doccache_client::CacheDocumentService;
use doccache_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the cache_save tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheSaveParams {
    /// The URL of the image to cache.
    pub url: String,
}

/// Output from the cache_save tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheSaveOutput {
    /// Opaque path for later retrieval with cache_get.
    pub path: String,
    /// Media type detected from the content.
    pub mime: String,
    /// Stored size in bytes.
    pub size: usize,
}

pub async fn save(service: &CacheDocumentService, params: CacheSaveParams) -> Result<CacheSaveOutput, Error> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()));
    }

    let saved = service.save_remote_file_to_cache(&params.url).await?;
    Ok(CacheSaveOutput { path: saved.path, mime: saved.mime, size: saved.size })
}

/// Implementation of the cache_save tool.
pub async fn save_impl(service: &CacheDocumentService, params: CacheSaveParams) -> Result<CallToolResult, McpError> {
    let url = params.url.clone();
    let output = save(service, params).await.inspect_err(|e| {
        tracing::warn!(url = %url, error = %e, "cache_save failed");
    })?;

    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{png, service};

    #[tokio::test]
    async fn test_save_empty_url() {
        let (_dir, service) = service().await;
        let result = save(&service, CacheSaveParams { url: "  ".into() }).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_save_local_png() {
        let (dir, service) = service().await;
        let source = dir.path().join("logo.png");
        std::fs::write(&source, png(512)).unwrap();

        let params = CacheSaveParams { url: format!("file://{}", source.display()) };
        let output = save(&service, params).await.unwrap();
        assert_eq!(output.mime, "image/png");
        assert_eq!(output.size, 512);
        assert_eq!(output.path.len(), 12 + 36);
    }

    #[tokio::test]
    async fn test_save_impl_rejected() {
        let (dir, service) = service().await;
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, "just text").unwrap();

        let params = CacheSaveParams { url: format!("file://{}", source.display()) };
        let err = save_impl(&service, params).await.unwrap_err();
        assert_eq!(err.code.0, -32004);
    }
}
