//! Client code for doccache.
//!
//! This crate provides the bounded streaming fetcher and the cache document
//! service shared by the server and CLI.

pub mod fetch;
pub mod service;

pub use fetch::{Fetcher, FetchConfig, HttpFetcher, read_bounded};
pub use service::{CacheDocumentService, SavedDocument};
