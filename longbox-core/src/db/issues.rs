use chrono::{DateTime, Utc};
use longbox_model::ids::{IssueId, LibraryId, VolumeId};
use longbox_model::issue::{Credit, CreditRole, Issue};
use sqlx::PgPool;

use crate::error::Result;
use crate::ingest::pipeline::NormalizedIssue;

/// Path -> issue baseline for one library's reap/update decision (§4.4
/// stage 2). Callers compare `(mtime, size)` before deciding to touch a row.
pub async fn baseline_for_library(pool: &PgPool, library_id: LibraryId) -> Result<Vec<(String, IssueId, DateTime<Utc>, i64)>> {
    let rows: Vec<(String, IssueId, DateTime<Utc>, i64)> = sqlx::query_as(
        "SELECT i.file_path, i.id, i.file_mtime, i.file_size \
         FROM issues i JOIN volumes v ON v.id = i.volume_id \
         JOIN series s ON s.id = v.series_id \
         WHERE s.library_id = $1",
    )
    .bind(library_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Insert or update one issue row by its canonical identity (file path,
/// invariant 1). Returns the row id and whether it was a fresh insert.
pub async fn upsert(
    executor: impl sqlx::PgExecutor<'_> + Copy,
    file_path: &str,
    volume_id: VolumeId,
    n: &NormalizedIssue,
) -> Result<(IssueId, bool)> {
    let existing: Option<(IssueId,)> = sqlx::query_as("SELECT id FROM issues WHERE file_path = $1")
        .bind(file_path)
        .fetch_optional(executor)
        .await?;

    if let Some((id,)) = existing {
        sqlx::query(
            "UPDATE issues SET volume_id = $2, filename = $3, file_size = $4, file_mtime = $5, \
             page_count = $6, number = $7, title = $8, summary = $9, \
             cover_year = $10, cover_month = $11, cover_day = $12, web_url = $13, notes = $14, \
             age_rating = $15, language_iso = $16, community_rating = $17, count = $18, \
             publisher = $19, imprint = $20, format = $21, series_group = $22, scan_info = $23, \
             alternate_series = $24, alternate_number = $25, story_arc = $26, raw_metadata = $27, \
             is_dirty = true, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(volume_id)
        .bind(&n.filename)
        .bind(n.file_size)
        .bind(n.file_mtime)
        .bind(n.page_count)
        .bind(&n.number)
        .bind(&n.title)
        .bind(&n.summary)
        .bind(n.cover_year)
        .bind(n.cover_month)
        .bind(n.cover_day)
        .bind(&n.web_url)
        .bind(&n.notes)
        .bind(n.age_rating)
        .bind(&n.language_iso)
        .bind(n.community_rating)
        .bind(n.count)
        .bind(&n.publisher)
        .bind(&n.imprint)
        .bind(&n.format)
        .bind(&n.series_group)
        .bind(&n.scan_info)
        .bind(&n.alternate_series)
        .bind(&n.alternate_number)
        .bind(&n.story_arc)
        .bind(&n.raw_metadata)
        .execute(executor)
        .await?;
        return Ok((id, false));
    }

    let id = IssueId::new();
    sqlx::query(
        "INSERT INTO issues ( \
            id, volume_id, file_path, filename, file_size, file_mtime, page_count, number, title, \
            summary, cover_year, cover_month, cover_day, web_url, notes, age_rating, language_iso, \
            community_rating, count, publisher, imprint, format, series_group, scan_info, \
            alternate_series, alternate_number, story_arc, raw_metadata, is_dirty, created_at, updated_at \
         ) VALUES ( \
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, \
            $21, $22, $23, $24, $25, $26, $27, $28, true, now(), now() \
         )",
    )
    .bind(id)
    .bind(volume_id)
    .bind(file_path)
    .bind(&n.filename)
    .bind(n.file_size)
    .bind(n.file_mtime)
    .bind(n.page_count)
    .bind(&n.number)
    .bind(&n.title)
    .bind(&n.summary)
    .bind(n.cover_year)
    .bind(n.cover_month)
    .bind(n.cover_day)
    .bind(&n.web_url)
    .bind(&n.notes)
    .bind(n.age_rating)
    .bind(&n.language_iso)
    .bind(n.community_rating)
    .bind(n.count)
    .bind(&n.publisher)
    .bind(&n.imprint)
    .bind(&n.format)
    .bind(&n.series_group)
    .bind(&n.scan_info)
    .bind(&n.alternate_series)
    .bind(&n.alternate_number)
    .bind(&n.story_arc)
    .bind(&n.raw_metadata)
    .execute(executor)
    .await?;
    Ok((id, true))
}

pub async fn replace_credits(
    executor: impl sqlx::PgExecutor<'_> + Copy,
    issue_id: IssueId,
    credits: &[(longbox_model::ids::PersonId, CreditRole)],
) -> Result<()> {
    sqlx::query("DELETE FROM credits WHERE issue_id = $1")
        .bind(issue_id)
        .execute(executor)
        .await?;
    for (person_id, role) in credits {
        sqlx::query("INSERT INTO credits (issue_id, person_id, role) VALUES ($1, $2, $3)")
            .bind(issue_id)
            .bind(person_id)
            .bind(role)
            .execute(executor)
            .await?;
    }
    Ok(())
}

macro_rules! replace_tag_join {
    ($fn_name:ident, $table:literal, $fk:literal) => {
        pub async fn $fn_name(
            executor: impl sqlx::PgExecutor<'_> + Copy,
            issue_id: IssueId,
            tag_ids: &[uuid::Uuid],
        ) -> Result<()> {
            let delete_sql = format!("DELETE FROM {} WHERE issue_id = $1", $table);
            sqlx::query(&delete_sql).bind(issue_id).execute(executor).await?;
            let insert_sql = format!("INSERT INTO {} (issue_id, {}) VALUES ($1, $2)", $table, $fk);
            for tag_id in tag_ids {
                sqlx::query(&insert_sql).bind(issue_id).bind(tag_id).execute(executor).await?;
            }
            Ok(())
        }
    };
}

replace_tag_join!(replace_characters, "issue_characters", "character_id");
replace_tag_join!(replace_teams, "issue_teams", "team_id");
replace_tag_join!(replace_locations, "issue_locations", "location_id");
replace_tag_join!(replace_genres, "issue_genres", "genre_id");

pub async fn reap(executor: impl sqlx::PgExecutor<'_>, ids: &[IssueId]) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let uuids: Vec<uuid::Uuid> = ids.iter().map(|i| i.as_uuid()).collect();
    sqlx::query("DELETE FROM issues WHERE id = ANY($1)")
        .bind(&uuids)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn get(pool: &PgPool, id: IssueId) -> Result<Option<Issue>> {
    let row = sqlx::query_as::<_, Issue>(
        "SELECT id, volume_id, file_path, filename, file_size, file_mtime, page_count, number, \
         title, summary, cover_year, cover_month, cover_day, web_url, notes, age_rating, language_iso, \
         community_rating, count, publisher, imprint, format, series_group, scan_info, alternate_series, \
         alternate_number, story_arc, raw_metadata, thumbnail_path, cover_color, is_dirty, created_at, updated_at \
         FROM issues WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn credits_for_issue(pool: &PgPool, issue_id: IssueId) -> Result<Vec<Credit>> {
    let rows = sqlx::query_as::<_, Credit>("SELECT issue_id, person_id, role FROM credits WHERE issue_id = $1")
        .bind(issue_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn mark_clean(executor: impl sqlx::PgExecutor<'_>, id: IssueId, thumbnail_path: &str, cover_color: Option<&str>) -> Result<()> {
    sqlx::query("UPDATE issues SET is_dirty = false, thumbnail_path = $2, cover_color = $3 WHERE id = $1")
        .bind(id)
        .bind(thumbnail_path)
        .bind(cover_color)
        .execute(executor)
        .await?;
    Ok(())
}

const ISSUE_COLUMNS: &str = "id, volume_id, file_path, filename, file_size, file_mtime, page_count, number, \
     title, summary, cover_year, cover_month, cover_day, web_url, notes, age_rating, language_iso, \
     community_rating, count, publisher, imprint, format, series_group, scan_info, alternate_series, \
     alternate_number, story_arc, raw_metadata, thumbnail_path, cover_color, is_dirty, created_at, updated_at";

/// Every Issue in one Volume, unordered — callers apply the canonical
/// issue-number sort themselves (`query::sort`).
pub async fn list_by_volume(pool: &PgPool, volume_id: VolumeId) -> Result<Vec<Issue>> {
    let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE volume_id = $1");
    let rows = sqlx::query_as::<_, Issue>(&sql).bind(volume_id).fetch_all(pool).await?;
    Ok(rows)
}

/// Every Issue across every Volume of one Series, unordered.
pub async fn list_by_series(pool: &PgPool, series_id: longbox_model::ids::SeriesId) -> Result<Vec<Issue>> {
    let sql = format!(
        "SELECT {ISSUE_COLUMNS} FROM issues i JOIN volumes v ON v.id = i.volume_id WHERE v.series_id = $1"
    );
    let rows = sqlx::query_as::<_, Issue>(&sql).bind(series_id).fetch_all(pool).await?;
    Ok(rows)
}

/// Fetches a set of issues by id, in no particular order — callers that
/// need container order re-sort by the ids they passed in.
pub async fn list_by_ids(pool: &PgPool, ids: &[IssueId]) -> Result<Vec<Issue>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let uuids: Vec<uuid::Uuid> = ids.iter().map(|i| i.as_uuid()).collect();
    let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ANY($1)");
    let rows = sqlx::query_as::<_, Issue>(&sql).bind(&uuids).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn dirty_issue_ids(pool: &PgPool, library_id: Option<LibraryId>) -> Result<Vec<IssueId>> {
    let rows: Vec<(IssueId,)> = match library_id {
        Some(lib) => {
            sqlx::query_as(
                "SELECT i.id FROM issues i JOIN volumes v ON v.id = i.volume_id \
                 JOIN series s ON s.id = v.series_id WHERE s.library_id = $1 AND i.is_dirty = true",
            )
            .bind(lib)
            .fetch_all(pool)
            .await?
        }
        None => sqlx::query_as("SELECT id FROM issues WHERE is_dirty = true").fetch_all(pool).await?,
    };
    Ok(rows.into_iter().map(|(id,)| id).collect())
}
