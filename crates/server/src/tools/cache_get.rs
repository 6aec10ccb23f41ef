//! cache_get tool implementation.
//!
//! Returns a cached image by the path cache_save handed out.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use doccache_client::CacheDocumentService;
use doccache_core::{Error, mime};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// The path returned by cache_save.
    pub path: String,
}

/// Metadata returned alongside the image content.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub path: String,
    /// Media type detected from the stored content.
    pub mime: String,
    pub size: usize,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(service: &CacheDocumentService, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let content = service.get_content_from_cache(&params.path).await.inspect_err(|e| {
        tracing::warn!(path = %params.path, error = %e, "cache_get failed");
    })?;

    let output = CacheGetOutput { path: params.path, mime: mime::sniff(&content).to_string(), size: content.len() };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![
        Content::image(STANDARD.encode(&content), output.mime.clone()),
        Content::text(json),
    ]))
}
