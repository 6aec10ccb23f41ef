//! Filesystem-backed store.
//!
//! Folders map to directories under a root, files to regular files.

use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{Folder, HierarchicalStore, StoreError, validate_file_name};

/// Store rooted in a local directory.
#[derive(Clone, Debug)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn dir_of(&self, folder: &Folder) -> PathBuf {
        folder.segments().iter().fold(self.root.clone(), |dir, s| dir.join(s))
    }
}

fn not_found_or_io(err: std::io::Error, what: String) -> StoreError {
    if err.kind() == ErrorKind::NotFound { StoreError::NotFound(what) } else { StoreError::Io(err) }
}

#[async_trait]
impl HierarchicalStore for FsStore {
    async fn get_folder(&self, path: &str) -> Result<Folder, StoreError> {
        let folder = Folder::parse(path)?;
        match fs::metadata(self.dir_of(&folder)).await {
            Ok(meta) if meta.is_dir() => Ok(folder),
            Ok(_) => Err(StoreError::NotFound(folder.path())),
            Err(e) => Err(not_found_or_io(e, folder.path())),
        }
    }

    async fn create_folder(&self, path: &str) -> Result<Folder, StoreError> {
        let folder = Folder::parse(path)?;
        fs::create_dir_all(self.dir_of(&folder)).await?;
        Ok(folder)
    }

    async fn write_file(&self, folder: &Folder, name: &str, content: &[u8]) -> Result<(), StoreError> {
        validate_file_name(name)?;
        let path = self.dir_of(folder).join(name);

        let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists(format!("{}/{name}", folder.path())));
            }
            Err(e) => return Err(not_found_or_io(e, folder.path())),
        };

        let written = async {
            file.write_all(content).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            drop(file);
            let _ = fs::remove_file(&path).await;
            return Err(StoreError::Io(e));
        }

        Ok(())
    }

    async fn get_file(&self, folder: &Folder, name: &str) -> Result<Bytes, StoreError> {
        validate_file_name(name)?;
        let path = self.dir_of(folder).join(name);
        match fs::read(&path).await {
            Ok(content) => Ok(Bytes::from(content)),
            Err(e) => Err(not_found_or_io(e, format!("{}/{name}", folder.path()))),
        }
    }
}
