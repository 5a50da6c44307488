//! Get-or-create for the five unique-named tag entities (§4.3, §9's "small
//! set of concrete typed repositories with a shared interface" option,
//! chosen over a generic/dispatch-based resolver to keep the SQL typed).

use longbox_model::ids::{CharacterId, GenreId, LocationId, PersonId, TeamId};
use longbox_model::person_tag::{Character, Genre, Location, Person, Team};
use uuid::Uuid;

use crate::error::Result;

/// Every one of these tables has the identical `(id uuid, name text unique,
/// created_at)` shape, so the insert/select SQL only differs in the table
/// name, which is always one of the literals below — never user input.
async fn get_or_create_named(
    executor: impl sqlx::PgExecutor<'_> + Copy,
    table: &'static str,
    id: Uuid,
    name: &str,
) -> Result<(Uuid, String, chrono::DateTime<chrono::Utc>)> {
    let insert_sql = format!(
        "INSERT INTO {table} (id, name, created_at) VALUES ($1, $2, now()) \
         ON CONFLICT (name) DO NOTHING RETURNING id, name, created_at"
    );
    let inserted: Option<(Uuid, String, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(&insert_sql)
        .bind(id)
        .bind(name)
        .fetch_optional(executor)
        .await?;

    if let Some(row) = inserted {
        return Ok(row);
    }

    let select_sql = format!("SELECT id, name, created_at FROM {table} WHERE name = $1");
    let row = sqlx::query_as(&select_sql).bind(name).fetch_one(executor).await?;
    Ok(row)
}

pub async fn get_or_create_person(executor: impl sqlx::PgExecutor<'_> + Copy, name: &str) -> Result<Person> {
    let (id, name, created_at) = get_or_create_named(executor, "people", PersonId::new().as_uuid(), name).await?;
    Ok(Person { id: id.into(), name, created_at })
}

pub async fn get_or_create_character(executor: impl sqlx::PgExecutor<'_> + Copy, name: &str) -> Result<Character> {
    let (id, name, created_at) =
        get_or_create_named(executor, "characters", CharacterId::new().as_uuid(), name).await?;
    Ok(Character { id: id.into(), name, created_at })
}

pub async fn get_or_create_team(executor: impl sqlx::PgExecutor<'_> + Copy, name: &str) -> Result<Team> {
    let (id, name, created_at) = get_or_create_named(executor, "teams", TeamId::new().as_uuid(), name).await?;
    Ok(Team { id: id.into(), name, created_at })
}

pub async fn get_or_create_location(executor: impl sqlx::PgExecutor<'_> + Copy, name: &str) -> Result<Location> {
    let (id, name, created_at) =
        get_or_create_named(executor, "locations", LocationId::new().as_uuid(), name).await?;
    Ok(Location { id: id.into(), name, created_at })
}

pub async fn get_or_create_genre(executor: impl sqlx::PgExecutor<'_> + Copy, name: &str) -> Result<Genre> {
    let (id, name, created_at) = get_or_create_named(executor, "genres", GenreId::new().as_uuid(), name).await?;
    Ok(Genre { id: id.into(), name, created_at })
}

/// Global cleanup only (§4.13): tag/person entities are cross-library, so a
/// library-scoped cleanup run must not touch these.
pub async fn orphaned_people(pool: &sqlx::PgPool) -> Result<Vec<PersonId>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT p.id FROM people p WHERE NOT EXISTS (SELECT 1 FROM credits c WHERE c.person_id = p.id)",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id.into()).collect())
}

pub async fn delete_person(executor: impl sqlx::PgExecutor<'_>, id: PersonId) -> Result<()> {
    sqlx::query("DELETE FROM people WHERE id = $1").bind(id).execute(executor).await?;
    Ok(())
}

pub async fn orphaned_characters(pool: &sqlx::PgPool) -> Result<Vec<CharacterId>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT c.id FROM characters c WHERE NOT EXISTS (SELECT 1 FROM issue_characters ic WHERE ic.character_id = c.id)",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id.into()).collect())
}

pub async fn delete_character(executor: impl sqlx::PgExecutor<'_>, id: CharacterId) -> Result<()> {
    sqlx::query("DELETE FROM characters WHERE id = $1").bind(id).execute(executor).await?;
    Ok(())
}

pub async fn orphaned_teams(pool: &sqlx::PgPool) -> Result<Vec<TeamId>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT t.id FROM teams t WHERE NOT EXISTS (SELECT 1 FROM issue_teams it WHERE it.team_id = t.id)",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id.into()).collect())
}

pub async fn delete_team(executor: impl sqlx::PgExecutor<'_>, id: TeamId) -> Result<()> {
    sqlx::query("DELETE FROM teams WHERE id = $1").bind(id).execute(executor).await?;
    Ok(())
}

pub async fn orphaned_locations(pool: &sqlx::PgPool) -> Result<Vec<LocationId>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT l.id FROM locations l WHERE NOT EXISTS (SELECT 1 FROM issue_locations il WHERE il.location_id = l.id)",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id.into()).collect())
}

pub async fn delete_location(executor: impl sqlx::PgExecutor<'_>, id: LocationId) -> Result<()> {
    sqlx::query("DELETE FROM locations WHERE id = $1").bind(id).execute(executor).await?;
    Ok(())
}

pub async fn orphaned_genres(pool: &sqlx::PgPool) -> Result<Vec<GenreId>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT g.id FROM genres g WHERE NOT EXISTS (SELECT 1 FROM issue_genres ig WHERE ig.genre_id = g.id)",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id.into()).collect())
}

pub async fn delete_genre(executor: impl sqlx::PgExecutor<'_>, id: GenreId) -> Result<()> {
    sqlx::query("DELETE FROM genres WHERE id = $1").bind(id).execute(executor).await?;
    Ok(())
}
