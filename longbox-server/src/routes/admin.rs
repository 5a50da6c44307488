//! Admin-only routes (§6, §4.5, §4.13): library scan triggers, job
//! listings, and on-demand maintenance tasks. Every handler starts by
//! checking `require_superuser`, mirroring the teacher's
//! `auth::middleware::admin_middleware` gate.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use longbox_core::db::jobs as jobs_db;
use longbox_core::jobs::EnqueueOutcome;
use longbox_model::ids::LibraryId;
use longbox_model::job::Job;
use longbox_model::user::User;
use serde::{Deserialize, Serialize};

use crate::auth::middleware::require_superuser;
use crate::errors::AppResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/libraries/{id}/scan", post(scan_library))
        .route("/jobs", get(list_jobs))
        .route("/jobs/active", get(list_active_jobs))
        .route("/tasks/cleanup", post(run_cleanup))
        .route("/tasks/backup", post(run_backup))
}

#[derive(Debug, Deserialize)]
struct ScanQuery {
    #[serde(default)]
    force: bool,
}

#[derive(Debug, Serialize)]
struct ScanResponse {
    job_id: longbox_model::ids::JobId,
    deduplicated: bool,
}

async fn scan_library(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<LibraryId>,
    Query(query): Query<ScanQuery>,
) -> AppResult<Json<ScanResponse>> {
    require_superuser(&user)?;
    let outcome = state.jobs.enqueue_scan(id, query.force).await?;
    Ok(Json(match outcome {
        EnqueueOutcome::Queued(job) => ScanResponse { job_id: job.id, deduplicated: false },
        EnqueueOutcome::Ignored(job_id) => ScanResponse { job_id, deduplicated: true },
    }))
}

async fn list_jobs(State(state): State<AppState>, Extension(user): Extension<User>) -> AppResult<Json<Vec<Job>>> {
    require_superuser(&user)?;
    Ok(Json(jobs_db::list(state.pool()).await?))
}

async fn list_active_jobs(State(state): State<AppState>, Extension(user): Extension<User>) -> AppResult<Json<Vec<Job>>> {
    require_superuser(&user)?;
    Ok(Json(jobs_db::list_active(state.pool()).await?))
}

async fn run_cleanup(State(state): State<AppState>, Extension(user): Extension<User>) -> AppResult<Json<ScanResponse>> {
    require_superuser(&user)?;
    let outcome = state.jobs.enqueue_cleanup().await?;
    Ok(Json(match outcome {
        EnqueueOutcome::Queued(job) => ScanResponse { job_id: job.id, deduplicated: false },
        EnqueueOutcome::Ignored(job_id) => ScanResponse { job_id, deduplicated: true },
    }))
}

async fn run_backup(State(state): State<AppState>, Extension(user): Extension<User>) -> AppResult<Json<serde_json::Value>> {
    require_superuser(&user)?;
    let path = state.maintenance.run_backup(&state.config.database_url, &state.storage).await?;
    Ok(Json(serde_json::json!({ "path": path.display().to_string() })))
}
