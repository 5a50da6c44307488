//! Entity Resolver (C3): a single per-scan object with an in-memory cache
//! in front of get-or-create. Discarded at the end of the scan (§5's "Entity
//! Resolver caches per-scan and is discarded at end of scan").

use std::collections::HashMap;

use longbox_model::container::Container;
use longbox_model::ids::{LibraryId, SeriesId};
use longbox_model::library::{Series, Volume};
use longbox_model::person_tag::{Character, Genre, Location, Person, Team};
use sqlx::PgConnection;

use crate::db::{containers, people, series_volumes};
use crate::error::Result;

#[derive(Default)]
pub struct EntityResolver {
    series: HashMap<(LibraryId, String), Series>,
    volumes: HashMap<(SeriesId, i32), Volume>,
    people: HashMap<String, Person>,
    characters: HashMap<String, Character>,
    teams: HashMap<String, Team>,
    locations: HashMap<String, Location>,
    genres: HashMap<String, Genre>,
    collections: HashMap<String, Container>,
    reading_lists: HashMap<String, Container>,
}

impl EntityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn series(&mut self, conn: &mut PgConnection, library_id: LibraryId, name: &str) -> Result<Series> {
        let key = (library_id, name.to_string());
        if let Some(series) = self.series.get(&key) {
            return Ok(series.clone());
        }
        let series = series_volumes::get_or_create_series(&mut *conn, library_id, name).await?;
        self.series.insert(key, series.clone());
        Ok(series)
    }

    pub async fn volume(&mut self, conn: &mut PgConnection, series_id: SeriesId, volume_number: i32) -> Result<Volume> {
        let key = (series_id, volume_number);
        if let Some(volume) = self.volumes.get(&key) {
            return Ok(volume.clone());
        }
        let volume = series_volumes::get_or_create_volume(&mut *conn, series_id, volume_number).await?;
        self.volumes.insert(key, volume.clone());
        Ok(volume)
    }

    pub async fn person(&mut self, conn: &mut PgConnection, name: &str) -> Result<Person> {
        if let Some(p) = self.people.get(name) {
            return Ok(p.clone());
        }
        let person = people::get_or_create_person(&mut *conn, name).await?;
        self.people.insert(name.to_string(), person.clone());
        Ok(person)
    }

    pub async fn character(&mut self, conn: &mut PgConnection, name: &str) -> Result<Character> {
        if let Some(c) = self.characters.get(name) {
            return Ok(c.clone());
        }
        let character = people::get_or_create_character(&mut *conn, name).await?;
        self.characters.insert(name.to_string(), character.clone());
        Ok(character)
    }

    pub async fn team(&mut self, conn: &mut PgConnection, name: &str) -> Result<Team> {
        if let Some(t) = self.teams.get(name) {
            return Ok(t.clone());
        }
        let team = people::get_or_create_team(&mut *conn, name).await?;
        self.teams.insert(name.to_string(), team.clone());
        Ok(team)
    }

    pub async fn location(&mut self, conn: &mut PgConnection, name: &str) -> Result<Location> {
        if let Some(l) = self.locations.get(name) {
            return Ok(l.clone());
        }
        let location = people::get_or_create_location(&mut *conn, name).await?;
        self.locations.insert(name.to_string(), location.clone());
        Ok(location)
    }

    pub async fn genre(&mut self, conn: &mut PgConnection, name: &str) -> Result<Genre> {
        if let Some(g) = self.genres.get(name) {
            return Ok(g.clone());
        }
        let genre = people::get_or_create_genre(&mut *conn, name).await?;
        self.genres.insert(name.to_string(), genre.clone());
        Ok(genre)
    }

    pub async fn auto_collection(&mut self, conn: &mut PgConnection, name: &str) -> Result<Container> {
        if let Some(c) = self.collections.get(name) {
            return Ok(c.clone());
        }
        let container = containers::get_or_create_auto_collection(&mut *conn, name).await?;
        self.collections.insert(name.to_string(), container.clone());
        Ok(container)
    }

    pub async fn auto_reading_list(&mut self, conn: &mut PgConnection, name: &str) -> Result<Container> {
        if let Some(c) = self.reading_lists.get(name) {
            return Ok(c.clone());
        }
        let container = containers::get_or_create_auto_reading_list(&mut *conn, name).await?;
        self.reading_lists.insert(name.to_string(), container.clone());
        Ok(container)
    }
}

/// Trims and drops blank names before they ever reach the resolver — no
/// Person/Tag entity is created with a blank name (invariant 5).
pub fn clean_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
