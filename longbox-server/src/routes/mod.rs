//! Route composition, mirroring the teacher's `routes/v1.rs` shape:
//! one `Router<AppState>` per resource area, a `.route_layer` of
//! `auth_middleware` over everything but `/healthz` and `/auth/login`,
//! merged into a single router under `/api` (§6, §10.3).

mod admin;
mod archive_io;
mod auth;
mod batch;
mod comics;
mod health;
mod libraries;
mod progress;
mod reader;
mod search;
mod series;
mod volumes;

use axum::middleware;
use axum::Router;

use crate::state::AppState;

pub fn create_api_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(libraries::routes())
        .merge(series::routes())
        .merge(volumes::routes())
        .merge(comics::routes())
        .merge(reader::routes())
        .merge(progress::routes())
        .merge(search::routes())
        .merge(batch::routes())
        .merge(admin::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), crate::auth::auth_middleware));

    let public_api = Router::new().merge(auth::routes());

    Router::new()
        .merge(health::routes())
        .nest("/api", public_api.merge(protected))
}
