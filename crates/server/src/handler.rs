//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::cache_get::{CacheGetParams, get_impl};
use crate::tools::cache_save::{CacheSaveParams, save_impl};
use crate::tools::mime_check::{MimeCheckParams, check_impl};
use doccache_client::CacheDocumentService;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for doccache.
#[derive(Clone)]
pub struct DocCacheServer {
    service: Arc<CacheDocumentService>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl DocCacheServer {
    /// Create a new server handler over a cache service.
    pub fn new(service: Arc<CacheDocumentService>) -> Self {
        Self { service, tool_router: Self::tool_router() }
    }

    /// Download an image into the cache.
    #[tool(
        description = "Download an image (JPEG, GIF or PNG) by URL into the document cache. Returns the opaque cache path and detected mime type."
    )]
    async fn cache_save(&self, params: Parameters<CacheSaveParams>) -> Result<CallToolResult, McpError> {
        save_impl(&self.service, params.0).await
    }

    /// Retrieve a cached image by path.
    #[tool(description = "Retrieve a cached image by the path returned from cache_save.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.service, params.0).await
    }

    /// Check a mime type against the cache allow-list.
    #[tool(description = "Check whether a mime type is accepted by the cache (image/jpeg, image/gif, image/png).")]
    async fn mime_check(&self, params: Parameters<MimeCheckParams>) -> Result<CallToolResult, McpError> {
        check_impl(&self.service, params.0)
    }
}

impl ServerHandler for DocCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "doccache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
