//! `POST /auth/login`: not one of §6's listed paths, but the only way a
//! client can obtain the bearer token every other route requires. Scoped
//! down from the teacher's `users::auth::handlers::login` — one access
//! token, no refresh token/session table, since this spec has neither.

use argon2::password_hash::PasswordHash;
use argon2::{Argon2, PasswordVerifier};
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use longbox_core::db::users;
use serde::{Deserialize, Serialize};

use crate::auth::jwt;
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    access_token: String,
    token_type: &'static str,
    expires_in: i64,
}

async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> AppResult<Json<LoginResponse>> {
    let user = users::get_by_username(state.pool(), &request.username)
        .await?
        .ok_or_else(|| AppError::unauthenticated("invalid username or password"))?;

    if !user.is_active {
        return Err(AppError::unauthenticated("account disabled"));
    }

    let parsed_hash =
        PasswordHash::new(&user.password_hash).map_err(|_| AppError::internal("stored password hash is malformed"))?;
    Argon2::default()
        .verify_password(request.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::unauthenticated("invalid username or password"))?;

    let access_token = jwt::generate_access_token(&state.config.jwt_secret, state.config.access_token_ttl_minutes, user.id)
        .map_err(|e| AppError::internal(format!("failed to sign access token: {e}")))?;

    users::touch_last_login(state.pool(), user.id).await?;

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer",
        expires_in: state.config.access_token_ttl_minutes * 60,
    }))
}
