//! `GET /comics/{id}`, `/pages`, `/cover`, `/thumbnail` (§6). Direct-URL
//! access to one Issue bypasses the poison pill but still enforces the
//! Comic predicate (§4.8's guard rail) — a 403 here means the rating
//! itself is banned, not that the issue lives in a contaminated series.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use longbox_core::access::AccessPolicy;
use longbox_core::db::issues;
use longbox_model::ids::IssueId;
use longbox_model::issue::{Credit, Issue};
use serde::Serialize;

use super::archive_io;
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

const THUMBNAIL_WIDTH: u32 = 400;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/comics/{id}", get(get_comic))
        .route("/comics/{id}/pages", get(list_pages))
        .route("/comics/{id}/cover", get(get_cover))
        .route("/comics/{id}/thumbnail", get(get_thumbnail))
}

async fn load_allowed(state: &AppState, access: &AccessPolicy, id: IssueId) -> AppResult<Issue> {
    let issue = issues::get(state.pool(), id).await?.ok_or_else(|| AppError::not_found("comic not found"))?;
    if !access.issue_direct_access_allowed(issue.age_rating) {
        return Err(AppError::forbidden("comic not permitted for this user"));
    }
    Ok(issue)
}

#[derive(Debug, Serialize)]
struct ComicDetail {
    #[serde(flatten)]
    issue: Issue,
    credits: Vec<Credit>,
}

async fn get_comic(
    State(state): State<AppState>,
    Extension(access): Extension<AccessPolicy>,
    Path(id): Path<IssueId>,
) -> AppResult<Json<ComicDetail>> {
    let issue = load_allowed(&state, &access, id).await?;
    let credits = issues::credits_for_issue(state.pool(), id).await?;
    Ok(Json(ComicDetail { issue, credits }))
}

#[derive(Debug, Serialize)]
struct PageSummary {
    index: usize,
    content_type: &'static str,
}

async fn list_pages(
    State(state): State<AppState>,
    Extension(access): Extension<AccessPolicy>,
    Path(id): Path<IssueId>,
) -> AppResult<Json<Vec<PageSummary>>> {
    let issue = load_allowed(&state, &access, id).await?;
    let pages = archive_io::ordered_pages(issue.file_path).await?;
    Ok(Json(
        pages
            .into_iter()
            .enumerate()
            .map(|(index, page)| PageSummary { index, content_type: archive_io::guess_content_type(&page.entry_name) })
            .collect(),
    ))
}

async fn get_cover(
    State(state): State<AppState>,
    Extension(access): Extension<AccessPolicy>,
    Path(id): Path<IssueId>,
) -> AppResult<Response> {
    let issue = load_allowed(&state, &access, id).await?;
    let entry_name = archive_io::nth_page_entry(issue.file_path.clone(), 0).await?;
    let bytes = archive_io::read_page(issue.file_path, entry_name.clone()).await?;
    let content_type = archive_io::guess_content_type(&entry_name);
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

/// Serves the persisted thumbnail if the job runner has already generated
/// one; otherwise decodes the cover page and resizes it inline, without
/// writing the result back to the database — that write-back only happens
/// through the job runner's `mark_clean` call.
async fn get_thumbnail(
    State(state): State<AppState>,
    Extension(access): Extension<AccessPolicy>,
    Path(id): Path<IssueId>,
) -> AppResult<Response> {
    let issue = load_allowed(&state, &access, id).await?;

    let dest = state.storage.thumbnail_path(id);
    if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
        let bytes = tokio::fs::read(&dest).await.map_err(|e| AppError::internal(format!("failed to read thumbnail: {e}")))?;
        return Ok(([(header::CONTENT_TYPE, "image/webp")], bytes).into_response());
    }

    let entry_name = archive_io::nth_page_entry(issue.file_path.clone(), 0).await?;
    let bytes = archive_io::read_page(issue.file_path, entry_name).await?;
    let thumbnail = tokio::task::spawn_blocking(move || {
        let img = image::load_from_memory(&bytes)
            .map_err(|e| longbox_core::error::CoreError::BadArchive(format!("cover page is not a decodable image: {e}")))?;
        let thumb = img.thumbnail(THUMBNAIL_WIDTH, THUMBNAIL_WIDTH * 2);
        let mut out = Vec::new();
        thumb
            .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::WebP)
            .map_err(|e| longbox_core::error::CoreError::Internal(format!("failed to encode webp: {e}")))?;
        Ok::<_, longbox_core::error::CoreError>(out)
    })
    .await
    .map_err(|e| AppError::internal(format!("thumbnail worker panicked: {e}")))??;

    Ok(([(header::CONTENT_TYPE, "image/webp")], thumbnail).into_response())
}
