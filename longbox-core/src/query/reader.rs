//! Reader navigation (§4.9 read-init): given one Issue and a browsing
//! context, resolve its neighbours after the Access Policy's navigation
//! filter has removed anything the requesting user shouldn't see.

use longbox_model::container::ContainerKind;
use longbox_model::ids::{ContainerId, IssueId, SeriesId, VolumeId};
use longbox_model::issue::Issue;
use sqlx::PgPool;

use crate::access::AccessPolicy;
use crate::db::{containers, issues, series_volumes};
use crate::error::{CoreError, Result};

use super::sort::{is_reverse_numbered, sort_issues};

#[derive(Debug, Clone, Copy)]
pub enum ReaderContext {
    Volume(VolumeId),
    Series(SeriesId),
    ReadingList(ContainerId),
    PullList(ContainerId),
    Collection(ContainerId),
}

#[derive(Debug, Clone)]
pub struct ReaderPosition {
    pub issue: Issue,
    pub prev: Option<IssueId>,
    pub next: Option<IssueId>,
    /// 1-based index of `issue` within the navigable set.
    pub position: usize,
    pub total: usize,
}

/// Resolves `issue_id`'s neighbours within `context`. The issue itself still
/// passes through the Comic predicate (the guard rail in §4.8 that a direct
/// link to a permitted issue always works); the surrounding list is filtered
/// by the same predicate before prev/next are computed, so navigation can
/// never step onto a banned page even if the issue itself is reachable.
pub async fn read_init(pool: &PgPool, access: &AccessPolicy, context: ReaderContext, issue_id: IssueId) -> Result<ReaderPosition> {
    let current = issues::get(pool, issue_id).await?.ok_or_else(|| CoreError::NotFound("issue not found".into()))?;
    if !access.issue_direct_access_allowed(current.age_rating) {
        return Err(CoreError::Forbidden("issue not permitted for this user".into()));
    }

    let ordered = ordered_context(pool, context).await?;
    let navigable: Vec<Issue> = ordered.into_iter().filter(|i| access.comic_allowed(i.age_rating)).collect();

    // The requested issue can fall outside the navigable set (e.g. it was
    // reached via a direct link into a context it doesn't belong to). The
    // call still succeeds in that case, just with no neighbours.
    let index = navigable.iter().position(|i| i.id == issue_id);

    Ok(match index {
        Some(index) => ReaderPosition {
            prev: index.checked_sub(1).map(|i| navigable[i].id),
            next: navigable.get(index + 1).map(|i| i.id),
            position: index + 1,
            total: navigable.len(),
            issue: navigable[index].clone(),
        },
        None => ReaderPosition { prev: None, next: None, position: 0, total: navigable.len(), issue: current },
    })
}

async fn ordered_context(pool: &PgPool, context: ReaderContext) -> Result<Vec<Issue>> {
    match context {
        ReaderContext::Volume(volume_id) => {
            let volume = series_volumes::get_volume(pool, volume_id)
                .await?
                .ok_or_else(|| CoreError::NotFound("volume not found".into()))?;
            let series = series_volumes::get_series(pool, volume.series_id)
                .await?
                .ok_or_else(|| CoreError::NotFound("series not found".into()))?;
            let mut list = issues::list_by_volume(pool, volume_id).await?;
            sort_issues(&mut list, is_reverse_numbered(&series.name));
            Ok(list)
        }
        ReaderContext::Series(series_id) => {
            let series = series_volumes::get_series(pool, series_id)
                .await?
                .ok_or_else(|| CoreError::NotFound("series not found".into()))?;
            let mut list = issues::list_by_series(pool, series_id).await?;
            sort_issues(&mut list, is_reverse_numbered(&series.name));
            Ok(list)
        }
        ReaderContext::ReadingList(container_id) => ordered_container(pool, container_id, ContainerKind::ReadingList).await,
        ReaderContext::PullList(container_id) => ordered_container(pool, container_id, ContainerKind::PullList).await,
        ReaderContext::Collection(container_id) => ordered_container(pool, container_id, ContainerKind::Collection).await,
    }
}

/// ReadingList orders by `position` ascending, PullList by `sort_order`
/// ascending; Collections don't carry an order of their own, so they fall
/// back to the Volume-style sort with no reverse-numbered flip, since a
/// Collection can span issues from unrelated series.
async fn ordered_container(pool: &PgPool, container_id: ContainerId, expected_kind: ContainerKind) -> Result<Vec<Issue>> {
    let container = containers::get(pool, container_id).await?.ok_or_else(|| CoreError::NotFound("container not found".into()))?;
    if container.kind != expected_kind {
        return Err(CoreError::BadRequest("container kind mismatch for this context".into()));
    }

    let mut items = containers::items(pool, container_id).await?;
    match expected_kind {
        ContainerKind::ReadingList => {
            items.sort_by(|a, b| a.position.partial_cmp(&b.position).unwrap_or(std::cmp::Ordering::Equal));
            let ids: Vec<IssueId> = items.iter().map(|i| i.issue_id).collect();
            let fetched = issues::list_by_ids(pool, &ids).await?;
            Ok(reorder_by(ids, fetched))
        }
        ContainerKind::PullList => {
            items.sort_by_key(|i| i.sort_order);
            let ids: Vec<IssueId> = items.iter().map(|i| i.issue_id).collect();
            let fetched = issues::list_by_ids(pool, &ids).await?;
            Ok(reorder_by(ids, fetched))
        }
        ContainerKind::Collection => {
            let ids: Vec<IssueId> = items.iter().map(|i| i.issue_id).collect();
            let mut fetched = issues::list_by_ids(pool, &ids).await?;
            sort_issues(&mut fetched, false);
            Ok(fetched)
        }
    }
}

fn reorder_by(ids: Vec<IssueId>, fetched: Vec<Issue>) -> Vec<Issue> {
    ids.into_iter().filter_map(|id| fetched.iter().find(|i| i.id == id).cloned()).collect()
}
