//! Hierarchical document store.
//!
//! A folder/file tree addressed by `/`-separated paths. Backends only
//! implement the four primitives; lookup-or-create and full-path reads are
//! provided on top of them so every backend shares the same semantics:
//!
//! - `ensure_folder` looks up before creating and treats a lost creation race
//!   as success
//! - `read_file` splits at the last separator into folder and file name

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};
use crate::identifier::PATH_SEPARATOR;

pub mod fs;
pub mod sqlite;

pub use fs::FsStore;
pub use sqlite::SqliteStore;

/// Store-level failures. These never cross the cache service boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("empty path")]
    EmptyPath,

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(String),

    #[error("migration failed: {0}")]
    MigrationFailed(String),
}

/// Handle to an existing folder in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Folder {
    segments: Vec<String>,
}

impl Folder {
    /// The root folder, which always exists.
    pub fn root() -> Self {
        Self::default()
    }

    /// Normalize a folder path. Empty segments are dropped, so `aa/bb/` and
    /// `/aa//bb` name the same folder.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidPath` for `.`/`..` segments or backslashes.
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let mut segments = Vec::new();
        for segment in path.split(PATH_SEPARATOR).filter(|s| !s.is_empty()) {
            validate_segment(segment).map_err(|_| StoreError::InvalidPath(path.to_string()))?;
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Canonical path without leading or trailing separators.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    /// Paths of this folder and all its ancestors, outermost first, root excluded.
    pub fn lineage(&self) -> Vec<String> {
        (1..=self.segments.len()).map(|n| self.segments[..n].join("/")).collect()
    }
}

fn validate_segment(segment: &str) -> Result<(), StoreError> {
    if segment.is_empty() || segment == "." || segment == ".." || segment.contains(['\\', '\0', PATH_SEPARATOR]) {
        return Err(StoreError::InvalidPath(segment.to_string()));
    }
    Ok(())
}

/// Check a file name before it reaches a backend.
pub fn validate_file_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() {
        return Err(StoreError::NotFound("empty file name".into()));
    }
    validate_segment(name)
}

/// Split a full path at its last separator into `(folder, file name)`.
///
/// A path without a separator names a file in the root folder.
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rfind(PATH_SEPARATOR) {
        Some(pos) => (&path[..pos], &path[pos + 1..]),
        None => ("", path),
    }
}

/// A folder/file tree holding cached documents.
#[async_trait]
pub trait HierarchicalStore: Send + Sync {
    /// Look up an existing folder. Fails with `NotFound` when absent.
    async fn get_folder(&self, path: &str) -> Result<Folder, StoreError>;

    /// Create a folder and any missing ancestors.
    ///
    /// May fail with `AlreadyExists` when another caller created it first.
    async fn create_folder(&self, path: &str) -> Result<Folder, StoreError>;

    /// Create a new file holding exactly `content`. No partial file is left
    /// behind on failure.
    async fn write_file(&self, folder: &Folder, name: &str, content: &[u8]) -> Result<(), StoreError>;

    /// Read a file from a folder. Fails with `NotFound` when absent.
    async fn get_file(&self, folder: &Folder, name: &str) -> Result<Bytes, StoreError>;

    /// Look up a folder, creating it on a miss.
    ///
    /// Repeated or concurrent calls for the same path all succeed and return
    /// the same folder.
    async fn ensure_folder(&self, path: &str) -> Result<Folder, StoreError> {
        match self.get_folder(path).await {
            Ok(folder) => Ok(folder),
            Err(StoreError::NotFound(_)) => match self.create_folder(path).await {
                Err(StoreError::AlreadyExists(_)) => self.get_folder(path).await,
                other => other,
            },
            Err(e) => Err(e),
        }
    }

    /// Read a file by its full path.
    async fn read_file(&self, path: &str) -> Result<Bytes, StoreError> {
        if path.is_empty() {
            return Err(StoreError::EmptyPath);
        }

        let (dir, name) = split_path(path);
        let folder = self.get_folder(dir).await?;
        self.get_file(&folder, name).await
    }
}

/// Open the backend selected by the configuration.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn HierarchicalStore>, StoreError> {
    let store: Arc<dyn HierarchicalStore> = match config.backend {
        StoreBackend::Fs => Arc::new(FsStore::open(&config.cache_dir).await?),
        StoreBackend::Sqlite => Arc::new(SqliteStore::open(&config.db_path).await?),
    };

    tracing::debug!(backend = ?config.backend, "opened document store");

    Ok(store)
}
