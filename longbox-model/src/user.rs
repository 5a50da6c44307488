use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::UserId;
use crate::rating::AgeRating;

/// An authenticated account and its access policy configuration (§3, §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub avatar_path: Option<String>,
    /// The most restrictive rating this user may see. `None` means no cap.
    pub max_age_rating: Option<AgeRating>,
    /// Whether issues with no parseable age rating are visible to this user.
    pub allow_unknown_age_ratings: bool,
    pub share_progress: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A `User`'s membership in a `Library`'s readership (§3: "accessible libraries").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserLibraryAccess {
    pub user_id: UserId,
    pub library_id: crate::ids::LibraryId,
}

impl User {
    /// Whether `rating` clears this user's ceiling. `None` (unrated) is
    /// governed by `allow_unknown_age_ratings`, not by the ceiling itself.
    pub fn allows_rating(&self, rating: Option<AgeRating>) -> bool {
        match (rating, self.max_age_rating) {
            (None, _) => self.allow_unknown_age_ratings,
            (Some(_), None) => true,
            (Some(actual), Some(ceiling)) => actual <= ceiling,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(max: Option<AgeRating>, allow_unknown: bool) -> User {
        User {
            id: UserId::new(),
            username: "reader".into(),
            email: "reader@example.com".into(),
            password_hash: String::new(),
            is_active: true,
            is_superuser: false,
            avatar_path: None,
            max_age_rating: max,
            allow_unknown_age_ratings: allow_unknown,
            share_progress: false,
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn no_ceiling_allows_everything_rated() {
        let u = user(None, false);
        assert!(u.allows_rating(Some(AgeRating::X18Plus)));
    }

    #[test]
    fn ceiling_blocks_above_but_not_at_or_below() {
        let u = user(Some(AgeRating::Teen), false);
        assert!(u.allows_rating(Some(AgeRating::Everyone)));
        assert!(u.allows_rating(Some(AgeRating::Teen)));
        assert!(!u.allows_rating(Some(AgeRating::Mature17Plus)));
    }

    #[test]
    fn unknown_rating_follows_its_own_flag_regardless_of_ceiling() {
        let blocked = user(Some(AgeRating::Everyone), false);
        assert!(!blocked.allows_rating(None));

        let allowed = user(Some(AgeRating::Everyone), true);
        assert!(allowed.allows_rating(None));
    }
}
