//! Flat, directory-backed file store for uploaded PDFs
//!
//! Files are addressed by their bare name. Writes never overwrite: the file is
//! created with `create_new`, so of two concurrent uploads with the same name
//! exactly one succeeds.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::{fs, io::AsyncWriteExt};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open the store, creating its directory if missing
    pub async fn open(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a client-supplied name to a path directly under the root
    fn resolve(&self, filename: &str) -> AppResult<PathBuf> {
        let is_plain_name = !filename.is_empty()
            && filename != "."
            && filename != ".."
            && !filename.contains(['/', '\\', '"'])
            && !filename.chars().any(char::is_control);
        if !is_plain_name {
            return Err(AppError::BadRequest(format!("Invalid file name '{}'", filename)));
        }
        Ok(self.root.join(filename))
    }

    /// Write `bytes` under `filename`, failing with `UploadConflict` if the
    /// name is taken. Returns the stored path.
    pub async fn store_new(&self, filename: &str, bytes: &[u8]) -> AppResult<String> {
        let path = self.resolve(filename)?;

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(AppError::UploadConflict(format!(
                    "A file named '{}' already exists",
                    filename
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let written = async {
            file.write_all(bytes).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            // Do not leave a truncated file holding the name
            if let Err(cleanup) = fs::remove_file(&path).await {
                tracing::warn!("Could not remove partial upload {}: {}", path.display(), cleanup);
            }
            return Err(e.into());
        }

        Ok(path.to_string_lossy().into_owned())
    }

    /// Read a stored file. A missing file is `NotFound`.
    pub async fn read(&self, filename: &str) -> AppResult<Vec<u8>> {
        let path = self.resolve(filename)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("File '{}' not found", filename)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a stored file; absent files are ignored
    pub async fn remove(&self, filename: &str) -> AppResult<()> {
        let path = self.resolve(filename)?;
        match fs::remove_file(&path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// Whether the root directory is present
    pub async fn is_ready(&self) -> bool {
        fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}
