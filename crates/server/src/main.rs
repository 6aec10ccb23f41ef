//! doccache MCP server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use doccache_client::CacheDocumentService;
use doccache_core::{AppConfig, open_store};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let store = open_store(&config).await?;
    let service = CacheDocumentService::from_config(&config, store)?;

    tracing::info!(
        backend = ?config.backend,
        max_size_mb = config.max_size_mb,
        "Starting doccache server on stdio transport"
    );

    let handler = handler::DocCacheServer::new(Arc::new(service));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
