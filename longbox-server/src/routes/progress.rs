//! `POST /progress/{id}`, `POST /progress/{id}/mark-read`, `DELETE
//! /progress/{id}` (§6, §4.10).

use axum::extract::{Path, State};
use axum::routing::{delete, post};
use axum::{Extension, Json, Router};
use longbox_core::access::AccessPolicy;
use longbox_core::db::issues;
use longbox_model::ids::IssueId;
use longbox_model::progress::ReadingProgress;
use longbox_model::user::User;
use serde::Deserialize;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/progress/{id}", post(save_progress))
        .route("/progress/{id}", delete(delete_progress))
        .route("/progress/{id}/mark-read", post(mark_read))
}

#[derive(Debug, Deserialize)]
struct SaveProgressRequest {
    current_page: i32,
    total_pages: i32,
    context_type: Option<String>,
    context_id: Option<String>,
}

async fn comic_allowed(state: &AppState, access: &AccessPolicy, id: IssueId) -> AppResult<i32> {
    let issue = issues::get(state.pool(), id).await?.ok_or_else(|| AppError::not_found("comic not found"))?;
    if !access.issue_direct_access_allowed(issue.age_rating) {
        return Err(AppError::forbidden("comic not permitted for this user"));
    }
    Ok(issue.page_count)
}

async fn save_progress(
    State(state): State<AppState>,
    Extension(access): Extension<AccessPolicy>,
    Extension(user): Extension<User>,
    Path(id): Path<IssueId>,
    Json(request): Json<SaveProgressRequest>,
) -> AppResult<Json<ReadingProgress>> {
    comic_allowed(&state, &access, id).await?;
    let progress = state
        .progress
        .save(user.id, id, request.current_page, request.total_pages, request.context_type.as_deref(), request.context_id.as_deref())
        .await?;
    Ok(Json(progress))
}

async fn mark_read(
    State(state): State<AppState>,
    Extension(access): Extension<AccessPolicy>,
    Extension(user): Extension<User>,
    Path(id): Path<IssueId>,
) -> AppResult<Json<ReadingProgress>> {
    let page_count = comic_allowed(&state, &access, id).await?;
    let progress = state.progress.mark_read(user.id, id, page_count).await?;
    Ok(Json(progress))
}

async fn delete_progress(
    State(state): State<AppState>,
    Extension(access): Extension<AccessPolicy>,
    Extension(user): Extension<User>,
    Path(id): Path<IssueId>,
) -> AppResult<axum::http::StatusCode> {
    comic_allowed(&state, &access, id).await?;
    state.progress.delete(user.id, id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
