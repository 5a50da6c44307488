//! Bearer-token auth middleware, grounded on the teacher's
//! `users::auth::middleware::auth_middleware`: extract the token, validate
//! it, load the user, insert it (and the Access Policy built from it) into
//! the request extensions for handlers to pull out.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use longbox_core::access::AccessPolicy;
use longbox_core::db::users;
use longbox_model::user::User;

use super::jwt;
use crate::errors::AppError;
use crate::state::AppState;

pub async fn auth_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, AppError> {
    let token = extract_bearer_token(&request)?;
    let claims = jwt::validate_token(&state.config.jwt_secret, &token)
        .map_err(|_| AppError::unauthenticated("invalid or expired token"))?;

    let user = users::get(state.pool(), claims.sub.into())
        .await?
        .ok_or_else(|| AppError::unauthenticated("unknown user"))?;
    if !user.is_active {
        return Err(AppError::unauthenticated("account disabled"));
    }

    let accessible = users::accessible_library_ids(state.pool(), user.id).await?;
    let access = AccessPolicy::for_user(&user, accessible);

    request.extensions_mut().insert(user);
    request.extensions_mut().insert(access);
    Ok(next.run(request).await)
}

fn extract_bearer_token(request: &Request) -> Result<String, AppError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthenticated("missing authorization header"))?;

    header_value
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or_else(|| AppError::unauthenticated("expected a bearer token"))
}

/// Convenience extractor for handlers: pull the `User` a previous
/// `auth_middleware` pass already inserted into the request extensions.
pub fn require_superuser(user: &User) -> Result<(), AppError> {
    if user.is_superuser {
        Ok(())
    } else {
        Err(AppError::forbidden("admin access required"))
    }
}
