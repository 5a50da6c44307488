//! Strongly typed identifiers for every entity in the data model.
//!
//! Each id wraps a [`Uuid`] so that a `SeriesId` can never be passed where a
//! `VolumeId` is expected, even though both are backed by the same wire type.

use std::fmt;
use uuid::Uuid;

macro_rules! typed_uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        #[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
        #[cfg_attr(feature = "sqlx", sqlx(transparent))]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

typed_uuid_id!(LibraryId);
typed_uuid_id!(SeriesId);
typed_uuid_id!(VolumeId);
typed_uuid_id!(IssueId);
typed_uuid_id!(PersonId);
typed_uuid_id!(CharacterId);
typed_uuid_id!(TeamId);
typed_uuid_id!(LocationId);
typed_uuid_id!(GenreId);
typed_uuid_id!(ContainerId);
typed_uuid_id!(UserId);
typed_uuid_id!(JobId);
