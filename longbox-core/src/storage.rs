//! Filesystem layout under the storage root (§6): `database/`, `cache/`,
//! `cover/`, `avatars/`, `backup/`, `logs/`. Every other component that
//! touches disk goes through this instead of hand-rolling paths.

use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn database_dir(&self) -> PathBuf {
        self.root.join("database")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    pub fn cover_dir(&self) -> PathBuf {
        self.root.join("cover")
    }

    pub fn avatars_dir(&self) -> PathBuf {
        self.root.join("avatars")
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join("backup")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// `cover/comic_{id}.webp` (§6).
    pub fn thumbnail_path(&self, comic_id: longbox_model::ids::IssueId) -> PathBuf {
        self.cover_dir().join(format!("comic_{comic_id}.webp"))
    }

    pub async fn ensure_directories(&self) -> Result<()> {
        for dir in [
            self.database_dir(),
            self.cache_dir(),
            self.cover_dir(),
            self.avatars_dir(),
            self.backup_dir(),
            self.logs_dir(),
        ] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| CoreError::Internal(format!("failed to create {}: {e}", dir.display())))?;
        }
        Ok(())
    }
}
