//! Maintenance (C13): orphan garbage collection and database backup.

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;

use crate::db::{containers, people, series_volumes};
use crate::error::{CoreError, Result};
use crate::storage::StorageLayout;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub volumes_removed: u64,
    pub series_removed: u64,
    pub tags_removed: u64,
    pub people_removed: u64,
    pub containers_removed: u64,
}

pub struct Maintenance {
    pool: PgPool,
}

impl Maintenance {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Deletes, in order, with a commit between each step to yield the
    /// write lock (§4.13): empty Volumes, empty Series, then — only for a
    /// global run (`library_id = None`) — Tags/Persons without references
    /// and empty auto-Containers. A library-scoped run stops after Series,
    /// since tag/person/container entities are cross-library.
    pub async fn run_orphan_cleanup(&self, library_id: Option<longbox_model::ids::LibraryId>) -> Result<CleanupReport> {
        let mut report = CleanupReport::default();

        let empty_volumes = series_volumes::volumes_without_issues(&self.pool).await?;
        for id in &empty_volumes {
            series_volumes::delete_volume(&self.pool, *id).await?;
        }
        report.volumes_removed = empty_volumes.len() as u64;

        let empty_series = series_volumes::series_without_volumes(&self.pool, library_id).await?;
        for id in &empty_series {
            series_volumes::delete_series(&self.pool, *id).await?;
        }
        report.series_removed = empty_series.len() as u64;

        if library_id.is_none() {
            report.tags_removed += self.sweep_tags().await?;
            report.people_removed = self.sweep_people().await?;
            report.containers_removed = self.sweep_containers().await?;
        }

        tracing::info!(?report, ?library_id, "orphan cleanup complete");
        Ok(report)
    }

    async fn sweep_tags(&self) -> Result<u64> {
        let mut removed = 0u64;

        let characters = people::orphaned_characters(&self.pool).await?;
        for id in &characters {
            people::delete_character(&self.pool, *id).await?;
        }
        removed += characters.len() as u64;

        let teams = people::orphaned_teams(&self.pool).await?;
        for id in &teams {
            people::delete_team(&self.pool, *id).await?;
        }
        removed += teams.len() as u64;

        let locations = people::orphaned_locations(&self.pool).await?;
        for id in &locations {
            people::delete_location(&self.pool, *id).await?;
        }
        removed += locations.len() as u64;

        let genres = people::orphaned_genres(&self.pool).await?;
        for id in &genres {
            people::delete_genre(&self.pool, *id).await?;
        }
        removed += genres.len() as u64;

        Ok(removed)
    }

    async fn sweep_people(&self) -> Result<u64> {
        let orphans = people::orphaned_people(&self.pool).await?;
        for id in &orphans {
            people::delete_person(&self.pool, *id).await?;
        }
        Ok(orphans.len() as u64)
    }

    async fn sweep_containers(&self) -> Result<u64> {
        let empty = containers::empty_auto_containers(&self.pool).await?;
        for id in &empty {
            containers::delete_container(&self.pool, *id).await?;
        }
        Ok(empty.len() as u64)
    }

    /// Hot snapshot via `pg_dump` (a page-safe copy that works against a
    /// live writer), then gzip-tar the snapshot into a dated archive and
    /// drop the raw dump on success (§4.13).
    pub async fn run_backup(&self, database_url: &str, storage: &StorageLayout) -> Result<std::path::PathBuf> {
        storage.ensure_directories().await?;
        let stamp = Utc::now().format("%Y%m%dT%H%M%SZ");
        let dump_path = storage.backup_dir().join(format!("longbox-{stamp}.dump"));
        let archive_path = storage.backup_dir().join(format!("longbox-{stamp}.tar.gz"));

        let status = tokio::process::Command::new("pg_dump")
            .arg("--format=custom")
            .arg("--file")
            .arg(&dump_path)
            .arg(database_url)
            .status()
            .await
            .map_err(|e| CoreError::Internal(format!("failed to launch pg_dump: {e}")))?;

        if !status.success() {
            return Err(CoreError::Internal(format!("pg_dump exited with {status}")));
        }

        let dump_path_for_blocking = dump_path.clone();
        let archive_path_for_blocking = archive_path.clone();
        tokio::task::spawn_blocking(move || compress_snapshot(&dump_path_for_blocking, &archive_path_for_blocking))
            .await
            .map_err(|e| CoreError::Internal(format!("backup compression task panicked: {e}")))??;

        tokio::fs::remove_file(&dump_path).await?;
        tracing::info!(path = %archive_path.display(), "backup complete");
        Ok(archive_path)
    }
}

fn compress_snapshot(dump_path: &std::path::Path, archive_path: &std::path::Path) -> Result<()> {
    let archive_file = std::fs::File::create(archive_path)?;
    let encoder = flate2::write::GzEncoder::new(archive_file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let file_name = dump_path
        .file_name()
        .ok_or_else(|| CoreError::Internal("snapshot path has no file name".into()))?;
    builder.append_path_with_name(dump_path, file_name)?;
    builder.into_inner()?.finish()?;
    Ok(())
}
