//! `GET /reader/{id}/read-init`, `GET /reader/{id}/page/{index}` (§6, §4.9).

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use longbox_core::access::AccessPolicy;
use longbox_core::db::issues;
use longbox_core::query::ReaderContext;
use longbox_model::ids::IssueId;
use serde::Deserialize;

use super::archive_io;
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reader/{id}/read-init", get(read_init))
        .route("/reader/{id}/page/{index}", get(get_page))
}

#[derive(Debug, Deserialize)]
struct ReadInitQuery {
    context_type: String,
    context_id: uuid::Uuid,
}

fn parse_context(query: &ReadInitQuery) -> AppResult<ReaderContext> {
    Ok(match query.context_type.as_str() {
        "volume" => ReaderContext::Volume(query.context_id.into()),
        "series" => ReaderContext::Series(query.context_id.into()),
        "reading_list" => ReaderContext::ReadingList(query.context_id.into()),
        "pull_list" => ReaderContext::PullList(query.context_id.into()),
        "collection" => ReaderContext::Collection(query.context_id.into()),
        other => return Err(AppError::bad_request(format!("unknown context_type {other:?}"))),
    })
}

async fn read_init(
    State(state): State<AppState>,
    Extension(access): Extension<AccessPolicy>,
    Path(id): Path<IssueId>,
    Query(query): Query<ReadInitQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let context = parse_context(&query)?;
    let position = state.query.read_init(&access, context, id).await?;
    Ok(Json(serde_json::json!({
        "issue": position.issue,
        "prev": position.prev,
        "next": position.next,
        "position": position.position,
        "total": position.total,
    })))
}

#[derive(Debug, Deserialize, Default)]
struct PageQuery {
    #[serde(default)]
    sharpen: bool,
    #[serde(default)]
    grayscale: bool,
    #[serde(default)]
    webp: bool,
}

async fn get_page(
    State(state): State<AppState>,
    Extension(access): Extension<AccessPolicy>,
    Path((id, index)): Path<(IssueId, usize)>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let issue = issues::get(state.pool(), id).await?.ok_or_else(|| AppError::not_found("comic not found"))?;
    if !access.issue_direct_access_allowed(issue.age_rating) {
        return Err(AppError::forbidden("comic not permitted for this user"));
    }

    let entry_name = archive_io::nth_page_entry(issue.file_path.clone(), index).await?;
    let bytes = archive_io::read_page(issue.file_path, entry_name.clone()).await?;

    if !query.sharpen && !query.grayscale && !query.webp {
        let content_type = archive_io::guess_content_type(&entry_name);
        return Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response());
    }

    let (transformed, content_type) = archive_io::transform_page(bytes, query.sharpen, query.grayscale, query.webp).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], transformed).into_response())
}
