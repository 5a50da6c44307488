//! `GET /series/{id}`, `GET /series/{id}/issues` (§6, §4.9). The issues
//! listing layers three independent filters over the canonical sort order:
//! format (`type`), per-user completion (`read_filter`), and direction
//! (`sort_order`).

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Extension, Json, Router};
use longbox_core::access::AccessPolicy;
use longbox_core::db::{issues, series_volumes};
use longbox_core::query::{sort, QueryService, SeriesDetail};
use longbox_model::ids::SeriesId;
use longbox_model::issue::Issue;
use longbox_model::user::User;
use serde::Deserialize;

use crate::errors::{AppError, AppResult};
use crate::pagination::{Page, PageParams};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/series/{id}", get(get_series))
        .route("/series/{id}/issues", get(list_issues))
}

async fn get_series(
    State(state): State<AppState>,
    Extension(access): Extension<AccessPolicy>,
    Path(id): Path<SeriesId>,
) -> AppResult<Json<SeriesDetail>> {
    let series = series_volumes::get_series(state.pool(), id).await?.ok_or_else(|| AppError::not_found("series not found"))?;
    if !access.library_allowed(series.library_id) {
        return Err(AppError::forbidden("series not accessible"));
    }
    Ok(Json(state.query.series_detail(id, &access).await?))
}

#[derive(Debug, Deserialize)]
struct IssuesQuery {
    #[serde(rename = "type")]
    format: Option<String>,
    read_filter: Option<String>,
    sort_order: Option<String>,
    #[serde(flatten)]
    page: PageParams,
}

async fn list_issues(
    State(state): State<AppState>,
    Extension(access): Extension<AccessPolicy>,
    Extension(user): Extension<User>,
    Path(id): Path<SeriesId>,
    Query(query): Query<IssuesQuery>,
) -> AppResult<Json<Page<Issue>>> {
    let series = series_volumes::get_series(state.pool(), id).await?.ok_or_else(|| AppError::not_found("series not found"))?;
    if !access.library_allowed(series.library_id) {
        return Err(AppError::forbidden("series not accessible"));
    }

    let mut list: Vec<Issue> =
        issues::list_by_series(state.pool(), id).await?.into_iter().filter(|i| access.comic_allowed(i.age_rating)).collect();
    sort::sort_issues(&mut list, sort::is_reverse_numbered(&series.name));

    if let Some(format) = query.format.as_deref() {
        if format != "all" {
            let weight = format_weight_for(format).ok_or_else(|| AppError::bad_request(format!("unknown type {format:?}")))?;
            list.retain(|i| sort::format_weight(i) == weight);
        }
    }

    if let Some(read_filter) = query.read_filter.as_deref() {
        if read_filter != "all" {
            let ids: Vec<_> = list.iter().map(|i| i.id).collect();
            let completed = state.progress.completed_issue_ids(user.id, &ids).await?;
            let want_completed = read_filter == "read";
            list.retain(|i| completed.contains(&i.id) == want_completed);
        }
    }

    if query.sort_order.as_deref() == Some("desc") {
        list.reverse();
    }

    Ok(Json(query.page.paginate(list)))
}

fn format_weight_for(format: &str) -> Option<u8> {
    match format {
        "plain" => Some(1),
        "annual" => Some(2),
        "special" => Some(3),
        _ => None,
    }
}
