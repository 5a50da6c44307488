//! `GET /healthz` (§10.3 ambient operational surface), grounded on the
//! teacher's `health_handler`: no auth required, surfaces pool occupancy so
//! an orchestrator's liveness probe can tell a starved pool from a dead one.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}

async fn healthz(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.db.pool_stats();
    Json(json!({
        "status": "ok",
        "database": {
            "size": stats.size,
            "idle": stats.idle,
            "max_size": stats.max_size,
            "min_size": stats.min_size,
        },
    }))
}
