use longbox_model::settings::Setting;
use sqlx::PgPool;

use crate::error::Result;

const COLUMNS: &str = "key, value, data_type, category, label, description, options, depends_on, hidden";

pub async fn all(pool: &PgPool) -> Result<Vec<Setting>> {
    let sql = format!("SELECT {COLUMNS} FROM settings ORDER BY category, key");
    let rows = sqlx::query_as::<_, Setting>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn get(pool: &PgPool, key: &str) -> Result<Option<Setting>> {
    let sql = format!("SELECT {COLUMNS} FROM settings WHERE key = $1");
    let row = sqlx::query_as::<_, Setting>(&sql).bind(key).fetch_optional(pool).await?;
    Ok(row)
}

/// Sync-on-start (§4.11): insert any default missing by key, and always
/// overwrite metadata columns to match code — but never touch `value` for
/// a key that already exists, so an operator's change survives an upgrade.
pub async fn sync_defaults(pool: &PgPool, defaults: &[Setting]) -> Result<()> {
    let mut tx = pool.begin().await?;
    for default in defaults {
        sqlx::query(
            "INSERT INTO settings (key, value, data_type, category, label, description, options, depends_on, hidden) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (key) DO UPDATE SET \
                data_type = EXCLUDED.data_type, category = EXCLUDED.category, label = EXCLUDED.label, \
                description = EXCLUDED.description, options = EXCLUDED.options, \
                depends_on = EXCLUDED.depends_on, hidden = EXCLUDED.hidden",
        )
        .bind(&default.key)
        .bind(&default.value)
        .bind(default.data_type)
        .bind(&default.category)
        .bind(&default.label)
        .bind(&default.description)
        .bind(&default.options)
        .bind(&default.depends_on)
        .bind(default.hidden)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn set_value(pool: &PgPool, key: &str, value: &str) -> Result<()> {
    sqlx::query("UPDATE settings SET value = $2 WHERE key = $1")
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;
    Ok(())
}
