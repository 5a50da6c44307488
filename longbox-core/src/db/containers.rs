use longbox_model::container::{Container, ContainerItem, ContainerKind};
use longbox_model::ids::{ContainerId, IssueId, UserId};
use sqlx::PgPool;

use crate::error::Result;

pub async fn get_or_create_auto_collection(
    executor: impl sqlx::PgExecutor<'_> + Copy,
    name: &str,
) -> Result<Container> {
    get_or_create_auto(executor, ContainerKind::Collection, name).await
}

pub async fn get_or_create_auto_reading_list(
    executor: impl sqlx::PgExecutor<'_> + Copy,
    name: &str,
) -> Result<Container> {
    get_or_create_auto(executor, ContainerKind::ReadingList, name).await
}

async fn get_or_create_auto(
    executor: impl sqlx::PgExecutor<'_> + Copy,
    kind: ContainerKind,
    name: &str,
) -> Result<Container> {
    let inserted = sqlx::query_as::<_, Container>(
        "INSERT INTO containers (id, kind, name, owner_id, auto_generated, created_at, updated_at) \
         VALUES ($1, $2, $3, NULL, true, now(), now()) \
         ON CONFLICT (kind, name) WHERE owner_id IS NULL DO NOTHING \
         RETURNING id, kind, name, owner_id, auto_generated, created_at, updated_at",
    )
    .bind(ContainerId::new())
    .bind(kind)
    .bind(name)
    .fetch_optional(executor)
    .await?;

    if let Some(c) = inserted {
        return Ok(c);
    }

    sqlx::query_as::<_, Container>(
        "SELECT id, kind, name, owner_id, auto_generated, created_at, updated_at \
         FROM containers WHERE kind = $1 AND name = $2 AND owner_id IS NULL",
    )
    .bind(kind)
    .bind(name)
    .fetch_one(executor)
    .await
    .map_err(Into::into)
}

/// Replaces a container's full membership in one pass, used when
/// recomputing an auto-Collection/auto-ReadingList's members during scan.
pub async fn set_membership(
    executor: impl sqlx::PgExecutor<'_> + Copy,
    container_id: ContainerId,
    issue_id: IssueId,
    position: Option<f64>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO container_items (container_id, issue_id, position, sort_order) \
         VALUES ($1, $2, $3, NULL) \
         ON CONFLICT (container_id, issue_id) DO UPDATE SET position = EXCLUDED.position",
    )
    .bind(container_id)
    .bind(issue_id)
    .bind(position)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn remove_membership(executor: impl sqlx::PgExecutor<'_>, container_id: ContainerId, issue_id: IssueId) -> Result<()> {
    sqlx::query("DELETE FROM container_items WHERE container_id = $1 AND issue_id = $2")
        .bind(container_id)
        .bind(issue_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn get(pool: &PgPool, id: ContainerId) -> Result<Option<Container>> {
    let row = sqlx::query_as::<_, Container>(
        "SELECT id, kind, name, owner_id, auto_generated, created_at, updated_at FROM containers WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn items(pool: &PgPool, container_id: ContainerId) -> Result<Vec<ContainerItem>> {
    let rows = sqlx::query_as::<_, ContainerItem>(
        "SELECT container_id, issue_id, position, sort_order FROM container_items \
         WHERE container_id = $1",
    )
    .bind(container_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_pull_list(pool: &PgPool, owner_id: UserId, name: &str) -> Result<Option<Container>> {
    let row = sqlx::query_as::<_, Container>(
        "SELECT id, kind, name, owner_id, auto_generated, created_at, updated_at \
         FROM containers WHERE kind = 'pull_list' AND owner_id = $1 AND name = $2",
    )
    .bind(owner_id)
    .bind(name)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn create_pull_list(pool: &PgPool, owner_id: UserId, name: &str) -> Result<Container> {
    let row = sqlx::query_as::<_, Container>(
        "INSERT INTO containers (id, kind, name, owner_id, auto_generated, created_at, updated_at) \
         VALUES ($1, 'pull_list', $2, $3, false, now(), now()) \
         RETURNING id, kind, name, owner_id, auto_generated, created_at, updated_at",
    )
    .bind(ContainerId::new())
    .bind(name)
    .bind(owner_id)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Auto-containers whose last member just left (invariant 10).
pub async fn empty_auto_containers(pool: &PgPool) -> Result<Vec<ContainerId>> {
    let rows: Vec<(ContainerId,)> = sqlx::query_as(
        "SELECT c.id FROM containers c \
         WHERE c.auto_generated = true \
         AND NOT EXISTS (SELECT 1 FROM container_items ci WHERE ci.container_id = c.id)",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn delete_container(executor: impl sqlx::PgExecutor<'_>, id: ContainerId) -> Result<()> {
    sqlx::query("DELETE FROM containers WHERE id = $1").bind(id).execute(executor).await?;
    Ok(())
}
