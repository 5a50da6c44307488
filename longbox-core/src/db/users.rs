use longbox_model::ids::{LibraryId, UserId};
use longbox_model::user::User;
use sqlx::PgPool;

use crate::error::Result;

const COLUMNS: &str = "id, username, email, password_hash, is_active, is_superuser, avatar_path, \
    max_age_rating, allow_unknown_age_ratings, share_progress, last_login, created_at, updated_at";

pub async fn get(pool: &PgPool, id: UserId) -> Result<Option<User>> {
    let sql = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
    let row = sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(pool).await?;
    Ok(row)
}

pub async fn get_by_username(pool: &PgPool, username: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {COLUMNS} FROM users WHERE username = $1");
    let row = sqlx::query_as::<_, User>(&sql).bind(username).fetch_optional(pool).await?;
    Ok(row)
}

pub async fn accessible_library_ids(pool: &PgPool, user_id: UserId) -> Result<Vec<LibraryId>> {
    let rows: Vec<(LibraryId,)> =
        sqlx::query_as("SELECT library_id FROM user_library_access WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn touch_last_login(pool: &PgPool, id: UserId) -> Result<()> {
    sqlx::query("UPDATE users SET last_login = now() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
