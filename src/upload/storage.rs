//! On-disk storage for uploaded images.
//!
//! Files live flat in one directory as `{uuid}_{sanitized client name}`.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use super::validation::{truncate_filename, ImageUpload, UploadError};
use crate::Result;

/// Upload directory.
#[derive(Debug, Clone)]
pub struct UploadStorage {
    base_path: PathBuf,
}

impl UploadStorage {
    /// Open the upload directory, creating it if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Write an already validated upload. Returns the stored name.
    pub async fn save(&self, upload: &ImageUpload) -> Result<String> {
        let stored_name = format!("{}_{}", Uuid::new_v4(), truncate_filename(&upload.file_name));
        let path = self.path_of(&stored_name)?;
        fs::write(&path, &upload.bytes).await?;
        Ok(stored_name)
    }

    /// Delete a stored file. Returns `false` if it was already gone.
    pub async fn remove(&self, stored_name: &str) -> Result<bool> {
        let path = self.path_of(stored_name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, stored_name: &str) -> bool {
        match self.path_of(stored_name) {
            Ok(path) => fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Full path of a stored name.
    ///
    /// Rejects names that could escape the upload directory.
    pub fn path_of(&self, stored_name: &str) -> Result<PathBuf> {
        if !is_plain_name(stored_name) {
            return Err(UploadError::InvalidStoredName.into());
        }
        Ok(self.base_path.join(stored_name))
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
}
