//! SQLite-backed store.
//!
//! Folders and files live in two tables; file content is a BLOB. The
//! connection runs on a background thread via tokio-rusqlite, with WAL mode
//! so concurrent readers do not block the writer.

pub mod migrations;

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use tokio_rusqlite::rusqlite::{self, ErrorCode};
use tokio_rusqlite::{Connection, params};

use super::{Folder, HierarchicalStore, StoreError, validate_file_name};

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
                       PRAGMA synchronous=NORMAL;
                       PRAGMA temp_store=MEMORY;
                       PRAGMA foreign_keys=ON;";

/// Store database handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<tokio_rusqlite::Error<StoreError>> for StoreError {
    fn from(err: tokio_rusqlite::Error<StoreError>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => StoreError::Database("connection closed".into()),
            tokio_rusqlite::Error::Close(_) => StoreError::Database("failed to close connection".into()),
            _ => StoreError::Database("connection closed".into()),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for StoreError {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e.into(),
            tokio_rusqlite::Error::ConnectionClosed => StoreError::Database("connection closed".into()),
            tokio_rusqlite::Error::Close(_) => StoreError::Database("failed to close connection".into()),
            _ => StoreError::Database("connection closed".into()),
        }
    }
}

impl SqliteStore {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies performance pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Self::init(conn).await
    }

    /// Open an in-memory database for testing.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.call(|conn| conn.execute_batch(PRAGMAS)).await?;

        migrations::run(&conn).await?;

        Ok(Self { conn })
    }

    /// Number of files held in the store.
    pub async fn file_count(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0)))
            .await?;
        Ok(count as u64)
    }
}

fn folder_exists(conn: &rusqlite::Connection, path: &str) -> Result<bool, StoreError> {
    let exists = conn.query_row("SELECT EXISTS(SELECT 1 FROM folders WHERE path = ?1)", params![path], |row| {
        row.get(0)
    })?;
    Ok(exists)
}

#[async_trait]
impl HierarchicalStore for SqliteStore {
    async fn get_folder(&self, path: &str) -> Result<Folder, StoreError> {
        let folder = Folder::parse(path)?;
        let key = folder.path();
        let exists = self
            .conn
            .call(move |conn| -> Result<bool, StoreError> { folder_exists(conn, &key) })
            .await?;

        if exists { Ok(folder) } else { Err(StoreError::NotFound(folder.path())) }
    }

    async fn create_folder(&self, path: &str) -> Result<Folder, StoreError> {
        let folder = Folder::parse(path)?;
        let lineage = folder.lineage();
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), StoreError> {
                let tx = conn.unchecked_transaction()?;
                for path in &lineage {
                    tx.execute(
                        "INSERT OR IGNORE INTO folders (path, created_at) VALUES (?1, ?2)",
                        params![path, now],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await?;

        Ok(folder)
    }

    async fn write_file(&self, folder: &Folder, name: &str, content: &[u8]) -> Result<(), StoreError> {
        validate_file_name(name)?;
        let key = folder.path();
        let name = name.to_string();
        let content = content.to_vec();
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), StoreError> {
                if !folder_exists(conn, &key)? {
                    return Err(StoreError::NotFound(key));
                }

                let inserted = conn.execute(
                    "INSERT INTO files (folder, name, content, size, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![key, name, content, content.len() as i64, now],
                );

                match inserted {
                    Ok(_) => Ok(()),
                    Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                        Err(StoreError::AlreadyExists(format!("{key}/{name}")))
                    }
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(StoreError::from)
    }

    async fn get_file(&self, folder: &Folder, name: &str) -> Result<Bytes, StoreError> {
        validate_file_name(name)?;
        let key = folder.path();
        let name = name.to_string();

        self.conn
            .call(move |conn| -> Result<Bytes, StoreError> {
                let result = conn.query_row(
                    "SELECT content FROM files WHERE folder = ?1 AND name = ?2",
                    params![key, name],
                    |row| row.get::<_, Vec<u8>>(0),
                );

                match result {
                    Ok(content) => Ok(Bytes::from(content)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::NotFound(format!("{key}/{name}"))),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(StoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let version = store
            .conn
            .call(|conn| conn.query_row("SELECT sqlite_version()", [], |row| row.get::<_, String>(0)))
            .await
            .unwrap();
        assert!(!version.is_empty());
        assert_eq!(store.file_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_root_folder_exists() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        assert!(store.get_folder("").await.unwrap().is_root());
    }

    #[tokio::test]
    async fn test_create_folder_creates_ancestors() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        assert!(matches!(store.get_folder("aa/bb/").await, Err(StoreError::NotFound(_))));

        store.create_folder("aa/bb/cc/dd/").await.unwrap();
        assert!(store.get_folder("aa").await.is_ok());
        assert!(store.get_folder("aa/bb").await.is_ok());
        assert!(store.get_folder("aa/bb/cc/dd").await.is_ok());
    }

    #[tokio::test]
    async fn test_ensure_folder_idempotent() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let first = store.ensure_folder("aa/bb/cc/dd/").await.unwrap();
        let second = store.ensure_folder("aa/bb/cc/dd/").await.unwrap();
        assert_eq!(first, second);

        let (a, b) = tokio::join!(store.ensure_folder("ee/ff/"), store.ensure_folder("ee/ff/"));
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[tokio::test]
    async fn test_write_and_read_file() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let folder = store.ensure_folder("aa/bb/cc/dd/").await.unwrap();
        let content: Vec<u8> = (0..=255u8).collect();
        store.write_file(&folder, "doc", &content).await.unwrap();

        let read = store.read_file("aa/bb/cc/dd/doc").await.unwrap();
        assert_eq!(&read[..], &content[..]);
        assert_eq!(store.file_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_write_file_twice() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let folder = store.ensure_folder("aa/").await.unwrap();
        store.write_file(&folder, "doc", b"first").await.unwrap();

        let result = store.write_file(&folder, "doc", b"second").await;
        assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
        assert_eq!(&store.read_file("aa/doc").await.unwrap()[..], b"first");
    }

    #[tokio::test]
    async fn test_write_file_into_missing_folder() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let folder = Folder::parse("missing").unwrap();
        let result = store.write_file(&folder, "doc", b"x").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert_eq!(store.file_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_read_file_errors() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        store.ensure_folder("aa/").await.unwrap();

        assert!(matches!(store.read_file("").await, Err(StoreError::EmptyPath)));
        assert!(matches!(store.read_file("zz/doc").await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.read_file("aa/doc").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reopen_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.sqlite");

        {
            let store = SqliteStore::open(&path).await.unwrap();
            let folder = store.ensure_folder("aa/").await.unwrap();
            store.write_file(&folder, "doc", b"persisted").await.unwrap();
        }

        let store = SqliteStore::open(&path).await.unwrap();
        assert_eq!(&store.read_file("aa/doc").await.unwrap()[..], b"persisted");
    }
}
