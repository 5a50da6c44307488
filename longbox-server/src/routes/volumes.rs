//! `GET /volumes/{id}`, `GET /volumes/{id}/issues` (§6, §4.9).

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Extension, Json, Router};
use longbox_core::access::AccessPolicy;
use longbox_core::db::{issues, series_volumes};
use longbox_core::query::{sort, VolumeDetail};
use longbox_model::ids::VolumeId;
use longbox_model::issue::Issue;

use crate::errors::{AppError, AppResult};
use crate::pagination::{Page, PageParams};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/volumes/{id}", get(get_volume))
        .route("/volumes/{id}/issues", get(list_issues))
}

async fn library_allowed_for_volume(state: &AppState, access: &AccessPolicy, volume_id: VolumeId) -> AppResult<longbox_model::library::Series> {
    let volume = series_volumes::get_volume(state.pool(), volume_id).await?.ok_or_else(|| AppError::not_found("volume not found"))?;
    let series = series_volumes::get_series(state.pool(), volume.series_id).await?.ok_or_else(|| AppError::not_found("series not found"))?;
    if !access.library_allowed(series.library_id) {
        return Err(AppError::forbidden("volume not accessible"));
    }
    Ok(series)
}

async fn get_volume(
    State(state): State<AppState>,
    Extension(access): Extension<AccessPolicy>,
    Path(id): Path<VolumeId>,
) -> AppResult<Json<VolumeDetail>> {
    library_allowed_for_volume(&state, &access, id).await?;
    Ok(Json(state.query.volume_detail(id, &access).await?))
}

async fn list_issues(
    State(state): State<AppState>,
    Extension(access): Extension<AccessPolicy>,
    Path(id): Path<VolumeId>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<Issue>>> {
    let series = library_allowed_for_volume(&state, &access, id).await?;

    let mut list: Vec<Issue> =
        issues::list_by_volume(state.pool(), id).await?.into_iter().filter(|i| access.comic_allowed(i.age_rating)).collect();
    sort::sort_issues(&mut list, sort::is_reverse_numbered(&series.name));

    Ok(Json(params.paginate(list)))
}
