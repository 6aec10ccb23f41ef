//! mime_check tool implementation.
//!
//! Lets callers check a media type against the cache allow-list before
//! committing to a download.

use doccache_client::CacheDocumentService;
use doccache_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the mime_check tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MimeCheckParams {
    /// Media type to check, e.g. `image/png`.
    pub mime: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MimeCheckOutput {
    pub mime: String,
    pub allowed: bool,
}

/// Implementation of the mime_check tool.
pub fn check_impl(service: &CacheDocumentService, params: MimeCheckParams) -> Result<CallToolResult, McpError> {
    service.filter_mime_types(&params.mime)?;

    let output = MimeCheckOutput { mime: params.mime, allowed: true };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
