use longbox_model::ids::LibraryId;
use longbox_model::library::Library;
use sqlx::PgPool;

use crate::error::Result;

pub async fn list(pool: &PgPool) -> Result<Vec<Library>> {
    let rows = sqlx::query_as::<_, Library>(
        "SELECT id, name, root_path, watch_enabled, scan_on_startup, is_scanning, \
         created_at, updated_at FROM libraries ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, id: LibraryId) -> Result<Option<Library>> {
    let row = sqlx::query_as::<_, Library>(
        "SELECT id, name, root_path, watch_enabled, scan_on_startup, is_scanning, \
         created_at, updated_at FROM libraries WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn create(pool: &PgPool, name: &str, root_path: &str, watch_enabled: bool) -> Result<Library> {
    let row = sqlx::query_as::<_, Library>(
        "INSERT INTO libraries (id, name, root_path, watch_enabled, scan_on_startup, is_scanning, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, true, false, now(), now()) \
         RETURNING id, name, root_path, watch_enabled, scan_on_startup, is_scanning, created_at, updated_at",
    )
    .bind(LibraryId::new())
    .bind(name)
    .bind(root_path)
    .bind(watch_enabled)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Invariant 3: cascades to Series/Volumes/Issues and everything hanging off
/// them via `ON DELETE CASCADE` foreign keys declared in the migrations.
pub async fn delete(pool: &PgPool, id: LibraryId) -> Result<()> {
    sqlx::query("DELETE FROM libraries WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_scanning(pool: &PgPool, id: LibraryId, is_scanning: bool) -> Result<()> {
    sqlx::query("UPDATE libraries SET is_scanning = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(is_scanning)
        .execute(pool)
        .await?;
    Ok(())
}

/// Part of the Job Manager's integrity sweep (§4.5): libraries flagged as
/// scanning with no backing running job.
pub async fn ids_scanning_without_running_job(pool: &PgPool) -> Result<Vec<LibraryId>> {
    let rows: Vec<(LibraryId,)> = sqlx::query_as(
        "SELECT l.id FROM libraries l \
         WHERE l.is_scanning = true \
         AND NOT EXISTS ( \
             SELECT 1 FROM jobs j \
             WHERE j.library_id = l.id AND j.kind = 'scan' AND j.status = 'running' \
         )",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}
