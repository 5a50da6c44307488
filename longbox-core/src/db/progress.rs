use chrono::{DateTime, Utc};
use longbox_model::ids::{IssueId, UserId};
use longbox_model::progress::{ActivityLog, ReadingProgress};
use sqlx::PgPool;

use crate::error::Result;

pub async fn get(pool: &PgPool, user_id: UserId, issue_id: IssueId) -> Result<Option<ReadingProgress>> {
    let row = sqlx::query_as::<_, ReadingProgress>(
        "SELECT user_id, issue_id, current_page, total_pages, completed, last_read_at, created_at \
         FROM reading_progress WHERE user_id = $1 AND issue_id = $2",
    )
    .bind(user_id)
    .bind(issue_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// §4.10: upsert, recompute `completed`, touch `last_read_at`, append an
/// ActivityLog row with the delta since the previous `current_page`.
pub async fn save(
    pool: &PgPool,
    user_id: UserId,
    issue_id: IssueId,
    current_page: i32,
    total_pages: i32,
    context_type: Option<&str>,
    context_id: Option<&str>,
) -> Result<ReadingProgress> {
    let mut tx = pool.begin().await?;

    let previous: Option<(i32,)> =
        sqlx::query_as("SELECT current_page FROM reading_progress WHERE user_id = $1 AND issue_id = $2")
            .bind(user_id)
            .bind(issue_id)
            .fetch_optional(&mut *tx)
            .await?;
    let previous_page = previous.map(|(p,)| p).unwrap_or(0);

    let completed = total_pages > 0 && current_page >= total_pages - 1;

    let progress = sqlx::query_as::<_, ReadingProgress>(
        "INSERT INTO reading_progress (user_id, issue_id, current_page, total_pages, completed, last_read_at, created_at) \
         VALUES ($1, $2, $3, $4, $5, now(), now()) \
         ON CONFLICT (user_id, issue_id) DO UPDATE SET \
            current_page = EXCLUDED.current_page, total_pages = EXCLUDED.total_pages, \
            completed = EXCLUDED.completed, last_read_at = now() \
         RETURNING user_id, issue_id, current_page, total_pages, completed, last_read_at, created_at",
    )
    .bind(user_id)
    .bind(issue_id)
    .bind(current_page)
    .bind(total_pages)
    .bind(completed)
    .fetch_one(&mut *tx)
    .await?;

    let delta = (current_page - previous_page).max(0);
    sqlx::query(
        "INSERT INTO activity_log (user_id, issue_id, pages_read, start_page, end_page, context_type, context_id, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, now())",
    )
    .bind(user_id)
    .bind(issue_id)
    .bind(delta)
    .bind(previous_page)
    .bind(current_page)
    .bind(context_type)
    .bind(context_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(progress)
}

pub async fn delete(pool: &PgPool, user_id: UserId, issue_id: IssueId) -> Result<()> {
    sqlx::query("DELETE FROM reading_progress WHERE user_id = $1 AND issue_id = $2")
        .bind(user_id)
        .bind(issue_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Every UTC calendar date with at least one ActivityLog row, most recent
/// first; used to derive the reading streak (§4.10).
pub async fn distinct_activity_dates(pool: &PgPool, user_id: UserId) -> Result<Vec<chrono::NaiveDate>> {
    let rows: Vec<(chrono::NaiveDate,)> = sqlx::query_as(
        "SELECT DISTINCT (created_at AT TIME ZONE 'UTC')::date AS d FROM activity_log \
         WHERE user_id = $1 ORDER BY d DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(d,)| d).collect())
}

/// For the batch read-status endpoint and the `read_filter` query param on
/// issue listings: which of `issue_ids` this user has marked completed.
pub async fn completed_issue_ids(pool: &PgPool, user_id: UserId, issue_ids: &[IssueId]) -> Result<std::collections::HashSet<IssueId>> {
    if issue_ids.is_empty() {
        return Ok(std::collections::HashSet::new());
    }
    let uuids: Vec<uuid::Uuid> = issue_ids.iter().map(|i| i.as_uuid()).collect();
    let rows: Vec<(IssueId,)> = sqlx::query_as(
        "SELECT issue_id FROM reading_progress WHERE user_id = $1 AND issue_id = ANY($2) AND completed = true",
    )
    .bind(user_id)
    .bind(&uuids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn recent_activity(pool: &PgPool, user_id: UserId, since: DateTime<Utc>) -> Result<Vec<ActivityLog>> {
    let rows = sqlx::query_as::<_, ActivityLog>(
        "SELECT user_id, issue_id, pages_read, start_page, end_page, context_type, context_id, created_at \
         FROM activity_log WHERE user_id = $1 AND created_at >= $2 ORDER BY created_at",
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
