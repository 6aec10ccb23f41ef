//! Core types and shared functionality for doccache.
//!
//! This crate provides:
//! - Hierarchical document store with filesystem and SQLite backends
//! - Document identifiers and shard path derivation
//! - Media type sniffing and the cache allow-list
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod identifier;
pub mod mime;
pub mod store;

pub use config::{AppConfig, ConfigError, StoreBackend};
pub use error::Error;
pub use identifier::DocumentId;
pub use mime::{ALLOWED_MIME_TYPES, filter_mime_types, sniff};
pub use store::{Folder, FsStore, HierarchicalStore, SqliteStore, StoreError, open_store};
