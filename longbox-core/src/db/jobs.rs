use longbox_model::ids::{JobId, LibraryId};
use longbox_model::job::{Job, JobKind};
use sqlx::PgPool;

use crate::error::Result;

/// `None` if an equivalent job is already pending-or-running (§4.5
/// de-duplication on enqueue).
pub async fn enqueue(
    pool: &PgPool,
    kind: JobKind,
    library_id: Option<LibraryId>,
    force: bool,
) -> Result<Option<Job>> {
    let existing: Option<(JobId,)> = sqlx::query_as(
        "SELECT id FROM jobs WHERE kind = $1 \
         AND library_id IS NOT DISTINCT FROM $2 \
         AND status IN ('pending', 'running')",
    )
    .bind(kind)
    .bind(library_id)
    .fetch_optional(pool)
    .await?;

    if existing.is_some() {
        return Ok(None);
    }

    let row = sqlx::query_as::<_, Job>(
        "INSERT INTO jobs (id, kind, library_id, status, force, queued_at) \
         VALUES ($1, $2, $3, 'pending', $4, now()) \
         RETURNING id, kind, library_id, status, force, queued_at, started_at, finished_at, result, error",
    )
    .bind(JobId::new())
    .bind(kind)
    .bind(library_id)
    .bind(force)
    .fetch_one(pool)
    .await?;
    Ok(Some(row))
}

/// Strict priority `scan > thumbnail > cleanup`, FIFO within a kind, and the
/// atomic conditional-update claim from §4.5: zero rows affected means the
/// race was lost and the caller should try the next candidate.
pub async fn claim_next(pool: &PgPool) -> Result<Option<Job>> {
    let candidate: Option<(JobId,)> = sqlx::query_as(
        "SELECT id FROM jobs WHERE status = 'pending' \
         ORDER BY CASE kind WHEN 'scan' THEN 0 WHEN 'thumbnail' THEN 1 ELSE 2 END, queued_at \
         LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    let Some((id,)) = candidate else {
        return Ok(None);
    };

    let claimed = sqlx::query_as::<_, Job>(
        "UPDATE jobs SET status = 'running', started_at = now() \
         WHERE id = $1 AND status = 'pending' \
         RETURNING id, kind, library_id, status, force, queued_at, started_at, finished_at, result, error",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(claimed)
}

pub async fn complete(pool: &PgPool, id: JobId, result: serde_json::Value) -> Result<()> {
    sqlx::query("UPDATE jobs SET status = 'completed', finished_at = now(), result = $2 WHERE id = $1")
        .bind(id)
        .bind(result)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn fail(pool: &PgPool, id: JobId, error: &str) -> Result<()> {
    sqlx::query("UPDATE jobs SET status = 'failed', finished_at = now(), error = $2 WHERE id = $1")
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;
    Ok(())
}

/// Crash recovery (§4.5, invariant 7, end-to-end scenario 4): every row
/// still `running` at process start is invalid.
pub async fn fail_all_running_as_interrupted(pool: &PgPool) -> Result<Vec<Job>> {
    let rows = sqlx::query_as::<_, Job>(
        "UPDATE jobs SET status = 'failed', finished_at = now(), \
         error = 'interrupted by server restart' \
         WHERE status = 'running' \
         RETURNING id, kind, library_id, status, force, queued_at, started_at, finished_at, result, error",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, id: JobId) -> Result<Option<Job>> {
    let row = sqlx::query_as::<_, Job>(
        "SELECT id, kind, library_id, status, force, queued_at, started_at, finished_at, result, error \
         FROM jobs WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn list(pool: &PgPool) -> Result<Vec<Job>> {
    let rows = sqlx::query_as::<_, Job>(
        "SELECT id, kind, library_id, status, force, queued_at, started_at, finished_at, result, error \
         FROM jobs ORDER BY queued_at DESC LIMIT 200",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_active(pool: &PgPool) -> Result<Vec<Job>> {
    let rows = sqlx::query_as::<_, Job>(
        "SELECT id, kind, library_id, status, force, queued_at, started_at, finished_at, result, error \
         FROM jobs WHERE status IN ('pending', 'running') ORDER BY queued_at",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

