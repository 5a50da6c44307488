use longbox_model::ids::{LibraryId, SeriesId, VolumeId};
use longbox_model::library::{Series, Volume};
use sqlx::PgPool;

use crate::error::Result;

pub async fn find_series(pool: &PgPool, library_id: LibraryId, name: &str) -> Result<Option<Series>> {
    let row = sqlx::query_as::<_, Series>(
        "SELECT id, library_id, name, summary_override, created_at, updated_at \
         FROM series WHERE library_id = $1 AND name = $2",
    )
    .bind(library_id)
    .bind(name)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Insert-without-commit-equivalent for the Entity Resolver's get-or-create
/// (§4.3): `ON CONFLICT DO NOTHING RETURNING` executed inside the same
/// connection/transaction the caller is already holding, falling back to a
/// lookup when the row already exists so a racing insert never errors out.
pub async fn get_or_create_series(
    executor: impl sqlx::PgExecutor<'_> + Copy,
    library_id: LibraryId,
    name: &str,
) -> Result<Series> {
    let inserted = sqlx::query_as::<_, Series>(
        "INSERT INTO series (id, library_id, name, summary_override, created_at, updated_at) \
         VALUES ($1, $2, $3, NULL, now(), now()) \
         ON CONFLICT (library_id, name) DO NOTHING \
         RETURNING id, library_id, name, summary_override, created_at, updated_at",
    )
    .bind(SeriesId::new())
    .bind(library_id)
    .bind(name)
    .fetch_optional(executor)
    .await?;

    if let Some(series) = inserted {
        return Ok(series);
    }

    sqlx::query_as::<_, Series>(
        "SELECT id, library_id, name, summary_override, created_at, updated_at \
         FROM series WHERE library_id = $1 AND name = $2",
    )
    .bind(library_id)
    .bind(name)
    .fetch_one(executor)
    .await
    .map_err(Into::into)
}

pub async fn touch_series(executor: impl sqlx::PgExecutor<'_>, id: SeriesId) -> Result<()> {
    sqlx::query("UPDATE series SET updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn get_or_create_volume(
    executor: impl sqlx::PgExecutor<'_> + Copy,
    series_id: SeriesId,
    volume_number: i32,
) -> Result<Volume> {
    let inserted = sqlx::query_as::<_, Volume>(
        "INSERT INTO volumes (id, series_id, volume_number, created_at, updated_at) \
         VALUES ($1, $2, $3, now(), now()) \
         ON CONFLICT (series_id, volume_number) DO NOTHING \
         RETURNING id, series_id, volume_number, created_at, updated_at",
    )
    .bind(VolumeId::new())
    .bind(series_id)
    .bind(volume_number)
    .fetch_optional(executor)
    .await?;

    if let Some(volume) = inserted {
        return Ok(volume);
    }

    sqlx::query_as::<_, Volume>(
        "SELECT id, series_id, volume_number, created_at, updated_at \
         FROM volumes WHERE series_id = $1 AND volume_number = $2",
    )
    .bind(series_id)
    .bind(volume_number)
    .fetch_one(executor)
    .await
    .map_err(Into::into)
}

/// Every Series in one Library, unfiltered — callers apply the Access
/// Policy's poison-pill visibility check themselves (§4.8).
pub async fn list_series_for_library(pool: &PgPool, library_id: LibraryId) -> Result<Vec<Series>> {
    let rows = sqlx::query_as::<_, Series>(
        "SELECT id, library_id, name, summary_override, created_at, updated_at \
         FROM series WHERE library_id = $1 ORDER BY name",
    )
    .bind(library_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_series(pool: &PgPool, id: SeriesId) -> Result<Option<Series>> {
    let row = sqlx::query_as::<_, Series>(
        "SELECT id, library_id, name, summary_override, created_at, updated_at FROM series WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_volume(pool: &PgPool, id: VolumeId) -> Result<Option<Volume>> {
    let row = sqlx::query_as::<_, Volume>(
        "SELECT id, series_id, volume_number, created_at, updated_at FROM volumes WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn list_volumes_for_series(pool: &PgPool, series_id: SeriesId) -> Result<Vec<Volume>> {
    let rows = sqlx::query_as::<_, Volume>(
        "SELECT id, series_id, volume_number, created_at, updated_at \
         FROM volumes WHERE series_id = $1 ORDER BY volume_number",
    )
    .bind(series_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn series_without_volumes(pool: &PgPool, library_id: Option<LibraryId>) -> Result<Vec<SeriesId>> {
    let rows: Vec<(SeriesId,)> = match library_id {
        Some(lib) => {
            sqlx::query_as(
                "SELECT s.id FROM series s \
                 WHERE s.library_id = $1 \
                 AND NOT EXISTS (SELECT 1 FROM volumes v WHERE v.series_id = s.id)",
            )
            .bind(lib)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as(
                "SELECT s.id FROM series s \
                 WHERE NOT EXISTS (SELECT 1 FROM volumes v WHERE v.series_id = s.id)",
            )
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn volumes_without_issues(pool: &PgPool) -> Result<Vec<VolumeId>> {
    let rows: Vec<(VolumeId,)> = sqlx::query_as(
        "SELECT v.id FROM volumes v \
         WHERE NOT EXISTS (SELECT 1 FROM issues i WHERE i.volume_id = v.id)",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn delete_volume(executor: impl sqlx::PgExecutor<'_>, id: VolumeId) -> Result<()> {
    sqlx::query("DELETE FROM volumes WHERE id = $1").bind(id).execute(executor).await?;
    Ok(())
}

pub async fn delete_series(executor: impl sqlx::PgExecutor<'_>, id: SeriesId) -> Result<()> {
    sqlx::query("DELETE FROM series WHERE id = $1").bind(id).execute(executor).await?;
    Ok(())
}
