//! Access Policy (C8): composable query predicates derived from a User,
//! not a post-filter bolted onto already-fetched rows (§4.8).

use std::collections::HashSet;

use longbox_model::ids::{ContainerId, LibraryId, SeriesId};
use longbox_model::rating::AgeRating;
use longbox_model::user::User;
use sqlx::PgPool;

use crate::error::Result;

/// Built once per request from the authenticated User and their accessible
/// library set; cheap to clone, holds no database handle.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    accessible_libraries: Option<HashSet<LibraryId>>,
    banned_ratings: Vec<AgeRating>,
    unknown_banned: bool,
}

impl AccessPolicy {
    /// `accessible_libraries` is ignored for a superuser — they bypass
    /// library scope but still respect their own age-rating field (§4.8).
    pub fn for_user(user: &User, accessible_libraries: Vec<LibraryId>) -> Self {
        let banned_ratings = match user.max_age_rating {
            Some(cap) => AgeRating::ALL.iter().copied().filter(|r| *r > cap).collect(),
            None => Vec::new(),
        };
        Self {
            accessible_libraries: (!user.is_superuser).then(|| accessible_libraries.into_iter().collect()),
            banned_ratings,
            unknown_banned: !user.allow_unknown_age_ratings,
        }
    }

    pub fn library_allowed(&self, library_id: LibraryId) -> bool {
        match &self.accessible_libraries {
            None => true,
            Some(set) => set.contains(&library_id),
        }
    }

    /// Comic predicate: `rating ∈ allowed_set ∨ (unknowns_allowed ∧ rating
    /// is unknown)` (§4.8). Used both standalone (direct Issue access) and
    /// as the base case the poison-pill predicates are built from.
    pub fn comic_allowed(&self, rating: Option<AgeRating>) -> bool {
        match rating {
            Some(r) => !self.banned_ratings.contains(&r),
            None => !self.unknown_banned,
        }
    }

    /// Direct-URL access to one Issue by id: bypasses the poison pill but
    /// still enforces the Comic predicate (§4.8 guard rail).
    pub fn issue_direct_access_allowed(&self, rating: Option<AgeRating>) -> bool {
        self.comic_allowed(rating)
    }

    fn unrestricted(&self) -> bool {
        self.banned_ratings.is_empty() && !self.unknown_banned
    }

    /// Navigation visibility for a Series: hidden if any of its issues is
    /// banned, even if the requested issue itself would pass (§4.8).
    pub async fn series_visible(&self, pool: &PgPool, series_id: SeriesId) -> Result<bool> {
        if self.unrestricted() {
            return Ok(true);
        }
        let contaminated = series_has_banned_issue(pool, series_id, &self.banned_ratings, self.unknown_banned).await?;
        Ok(!contaminated)
    }

    /// Same poison-pill logic for a Collection/ReadingList container (§4.8).
    pub async fn container_visible(&self, pool: &PgPool, container_id: ContainerId) -> Result<bool> {
        if self.unrestricted() {
            return Ok(true);
        }
        let contaminated = container_has_banned_issue(pool, container_id, &self.banned_ratings, self.unknown_banned).await?;
        Ok(!contaminated)
    }

    pub fn banned_ratings(&self) -> &[AgeRating] {
        &self.banned_ratings
    }

    pub fn unknown_banned(&self) -> bool {
        self.unknown_banned
    }

    /// `None` means unrestricted (superuser); `Some` is the exact library
    /// set a search/listing query should scope its `WHERE` clause to.
    pub fn accessible_libraries(&self) -> Option<&HashSet<LibraryId>> {
        self.accessible_libraries.as_ref()
    }
}

async fn series_has_banned_issue(
    pool: &PgPool,
    series_id: SeriesId,
    banned: &[AgeRating],
    unknown_banned: bool,
) -> Result<bool> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS ( \
            SELECT 1 FROM issues i JOIN volumes v ON v.id = i.volume_id \
            WHERE v.series_id = $1 \
            AND (i.age_rating = ANY($2) OR ($3 AND i.age_rating IS NULL)) \
         )",
    )
    .bind(series_id)
    .bind(banned)
    .bind(unknown_banned)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

async fn container_has_banned_issue(
    pool: &PgPool,
    container_id: ContainerId,
    banned: &[AgeRating],
    unknown_banned: bool,
) -> Result<bool> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS ( \
            SELECT 1 FROM container_items ci JOIN issues i ON i.id = ci.issue_id \
            WHERE ci.container_id = $1 \
            AND (i.age_rating = ANY($2) OR ($3 AND i.age_rating IS NULL)) \
         )",
    )
    .bind(container_id)
    .bind(banned)
    .bind(unknown_banned)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use longbox_model::ids::UserId;

    fn user(max_age_rating: Option<AgeRating>, allow_unknown: bool, superuser: bool) -> User {
        User {
            id: UserId::new(),
            username: "reader".into(),
            email: "reader@example.com".into(),
            password_hash: "x".into(),
            is_active: true,
            is_superuser: superuser,
            avatar_path: None,
            max_age_rating,
            allow_unknown_age_ratings: allow_unknown,
            share_progress: false,
            last_login: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn comic_predicate_matches_cap() {
        let u = user(Some(AgeRating::Teen), false, false);
        let policy = AccessPolicy::for_user(&u, vec![]);
        assert!(policy.comic_allowed(Some(AgeRating::G)));
        assert!(policy.comic_allowed(Some(AgeRating::Teen)));
        assert!(!policy.comic_allowed(Some(AgeRating::M)));
        assert!(!policy.comic_allowed(None));
    }

    #[test]
    fn superuser_bypasses_library_scope_not_rating() {
        let u = user(Some(AgeRating::Teen), false, true);
        let policy = AccessPolicy::for_user(&u, vec![]);
        assert!(policy.library_allowed(LibraryId::new()));
        assert!(!policy.comic_allowed(Some(AgeRating::M)));
    }

    #[test]
    fn no_cap_allows_everything_rated() {
        let u = user(None, false, false);
        let policy = AccessPolicy::for_user(&u, vec![]);
        assert!(policy.comic_allowed(Some(AgeRating::X18Plus)));
        assert!(!policy.comic_allowed(None));
    }
}
