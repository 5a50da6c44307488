//! `POST /batch/read-status` (§6): marks every Issue reachable from a mix
//! of comic/volume/series ids read or unread in one call, expanding
//! volume/series ids through the same Access Policy filter as their
//! single-resource listing endpoints.

use std::collections::HashSet;

use axum::extract::State;
use axum::routing::post;
use axum::{Extension, Json, Router};
use longbox_core::access::AccessPolicy;
use longbox_core::db::issues;
use longbox_model::ids::{IssueId, SeriesId, VolumeId};
use serde::{Deserialize, Serialize};

use crate::errors::AppResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/batch/read-status", post(set_read_status))
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    #[serde(default)]
    comic_ids: Vec<IssueId>,
    #[serde(default)]
    volume_ids: Vec<VolumeId>,
    #[serde(default)]
    series_ids: Vec<SeriesId>,
    read: bool,
}

#[derive(Debug, Serialize)]
struct BatchResponse {
    updated: usize,
}

async fn set_read_status(
    State(state): State<AppState>,
    Extension(access): Extension<AccessPolicy>,
    Extension(user): Extension<longbox_model::user::User>,
    Json(request): Json<BatchRequest>,
) -> AppResult<Json<BatchResponse>> {
    let mut targets = Vec::new();

    targets.extend(issues::list_by_ids(state.pool(), &request.comic_ids).await?);
    for volume_id in &request.volume_ids {
        targets.extend(issues::list_by_volume(state.pool(), *volume_id).await?);
    }
    for series_id in &request.series_ids {
        targets.extend(issues::list_by_series(state.pool(), *series_id).await?);
    }

    let mut seen = HashSet::new();
    targets.retain(|issue| access.comic_allowed(issue.age_rating) && seen.insert(issue.id));

    for issue in &targets {
        if request.read {
            state.progress.mark_read(user.id, issue.id, issue.page_count).await?;
        } else {
            state.progress.delete(user.id, issue.id).await?;
        }
    }

    Ok(Json(BatchResponse { updated: targets.len() }))
}
