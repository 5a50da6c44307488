//! `GET /libraries`, `GET /libraries/{id}/series` (§6). Library membership
//! is a plain filter; series listing also applies the poison-pill
//! visibility check from §4.8, since a series contaminated by a banned
//! rating must never appear in a library's series list.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Extension, Json, Router};
use longbox_core::access::AccessPolicy;
use longbox_core::db::{libraries, series_volumes};
use longbox_model::ids::LibraryId;
use longbox_model::library::{Library, Series};

use crate::errors::{AppError, AppResult};
use crate::pagination::{Page, PageParams};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/libraries", get(list_libraries))
        .route("/libraries/{id}/series", get(list_series))
}

async fn list_libraries(
    State(state): State<AppState>,
    Extension(access): Extension<AccessPolicy>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<Library>>> {
    let visible: Vec<Library> =
        libraries::list(state.pool()).await?.into_iter().filter(|l| access.library_allowed(l.id)).collect();
    Ok(Json(params.paginate(visible)))
}

async fn list_series(
    State(state): State<AppState>,
    Extension(access): Extension<AccessPolicy>,
    Path(id): Path<LibraryId>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<Series>>> {
    let library = libraries::get(state.pool(), id).await?.ok_or_else(|| AppError::not_found("library not found"))?;
    if !access.library_allowed(library.id) {
        return Err(AppError::forbidden("library not accessible"));
    }

    let all = series_volumes::list_series_for_library(state.pool(), id).await?;
    let mut visible = Vec::with_capacity(all.len());
    for series in all {
        if access.series_visible(state.pool(), series.id).await? {
            visible.push(series);
        }
    }
    Ok(Json(params.paginate(visible)))
}
