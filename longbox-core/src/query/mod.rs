//! Query Layer (C9, §4.9): issue ordering, cover selection, missing-issue
//! detection, the search DSL and reader navigation, plus the detail
//! aggregations the library UI builds a Series/Volume page from.

pub mod cover;
pub mod missing;
pub mod reader;
pub mod search;
pub mod sort;

use longbox_model::ids::{PersonId, SeriesId, VolumeId};
use longbox_model::issue::{CreditRole, Issue};
use longbox_model::library::{Series, Volume};
use sqlx::PgPool;

use crate::access::AccessPolicy;
use crate::db::{issues, series_volumes};
use crate::error::{CoreError, Result};

pub use reader::{read_init, ReaderContext, ReaderPosition};
pub use search::{search, SearchRequest};

/// A Volume's issues in canonical order, its cover pick and its missing-issue
/// report, with the Access Policy already applied to the issue list.
#[derive(Debug, Clone)]
pub struct VolumeDetail {
    pub volume: Volume,
    pub issues: Vec<Issue>,
    pub cover: Option<Issue>,
    pub missing: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct SeriesDetail {
    pub series: Series,
    pub volumes: Vec<Volume>,
    pub issue_count: usize,
    pub cover: Option<Issue>,
}

#[derive(Debug, Clone)]
pub struct CreatorCount {
    pub person_id: PersonId,
    pub name: String,
    pub issue_count: i64,
}

pub struct QueryService {
    pool: PgPool,
}

impl QueryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn search(&self, request: &SearchRequest, access: &AccessPolicy) -> Result<Vec<Issue>> {
        search::search(&self.pool, request, access).await
    }

    pub async fn read_init(&self, access: &AccessPolicy, context: ReaderContext, issue_id: longbox_model::ids::IssueId) -> Result<ReaderPosition> {
        reader::read_init(&self.pool, access, context, issue_id).await
    }

    /// Volume page aggregation: visible issues in canonical order, the cover
    /// pick from that same visible set, and the missing-issue report.
    pub async fn volume_detail(&self, volume_id: VolumeId, access: &AccessPolicy) -> Result<VolumeDetail> {
        let volume = series_volumes::get_volume(&self.pool, volume_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("volume not found".into()))?;
        let series = series_volumes::get_series(&self.pool, volume.series_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("series not found".into()))?;

        let mut visible: Vec<Issue> =
            issues::list_by_volume(&self.pool, volume_id).await?.into_iter().filter(|i| access.comic_allowed(i.age_rating)).collect();
        sort::sort_issues(&mut visible, sort::is_reverse_numbered(&series.name));

        let missing = missing::missing_issues(&visible).unwrap_or_default();
        let cover = cover::select_cover(&visible, &series.name).cloned();

        Ok(VolumeDetail { volume, issues: visible, cover, missing })
    }

    /// Series page aggregation: its volumes, a total visible issue count and
    /// a single cover pulled from across the whole series (not just volume 1).
    pub async fn series_detail(&self, series_id: SeriesId, access: &AccessPolicy) -> Result<SeriesDetail> {
        let series = series_volumes::get_series(&self.pool, series_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("series not found".into()))?;
        let volumes = series_volumes::list_volumes_for_series(&self.pool, series_id).await?;

        let visible: Vec<Issue> =
            issues::list_by_series(&self.pool, series_id).await?.into_iter().filter(|i| access.comic_allowed(i.age_rating)).collect();
        let cover = cover::select_cover(&visible, &series.name).cloned();

        Ok(SeriesDetail { series, volumes, issue_count: visible.len(), cover })
    }

    /// Top-N contributors by role across a Series' visible issues, used for
    /// a Series page's "Top Writer" / "Top Penciller" lanes.
    pub async fn top_creators(&self, series_id: SeriesId, role: CreditRole, limit: i64, access: &AccessPolicy) -> Result<Vec<CreatorCount>> {
        let visible_ids: Vec<_> = issues::list_by_series(&self.pool, series_id)
            .await?
            .into_iter()
            .filter(|i| access.comic_allowed(i.age_rating))
            .map(|i| i.id.as_uuid())
            .collect();
        if visible_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<(uuid::Uuid, String, i64)> = sqlx::query_as(
            "SELECT p.id, p.name, COUNT(*) as issue_count \
             FROM credits c JOIN people p ON p.id = c.person_id \
             WHERE c.role = $1 AND c.issue_id = ANY($2) \
             GROUP BY p.id, p.name ORDER BY issue_count DESC, p.name ASC LIMIT $3",
        )
        .bind(role)
        .bind(&visible_ids)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id, name, issue_count)| CreatorCount { person_id: id.into(), name, issue_count }).collect())
    }

    /// Recommendation lane: other Series sharing a `series_group` value with
    /// `series_id`'s issues, excluding the series itself (§4.9 detail
    /// aggregations).
    pub async fn related_by_series_group(&self, series_id: SeriesId, access: &AccessPolicy, limit: i64) -> Result<Vec<Series>> {
        let library_filter = access.accessible_libraries().map(|set| set.iter().copied().collect::<Vec<_>>());
        let rows = sqlx::query_as::<_, Series>(
            "SELECT DISTINCT s2.id, s2.library_id, s2.name, s2.summary_override, s2.created_at, s2.updated_at \
             FROM series s2 \
             JOIN volumes v2 ON v2.series_id = s2.id \
             JOIN issues i2 ON i2.volume_id = v2.id \
             WHERE s2.id != $1 \
             AND i2.series_group IN ( \
                 SELECT DISTINCT i.series_group FROM issues i \
                 JOIN volumes v ON v.id = i.volume_id \
                 WHERE v.series_id = $1 AND i.series_group IS NOT NULL \
             ) \
             AND ($3::uuid[] IS NULL OR s2.library_id = ANY($3)) \
             LIMIT $2",
        )
        .bind(series_id)
        .bind(limit)
        .bind(library_filter)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
