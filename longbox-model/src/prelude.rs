//! Curated re-exports for downstream crates that just want the types.

pub use crate::container::{Container, ContainerItem, ContainerKind};
pub use crate::error::{ModelError, Result as ModelResult};
pub use crate::ids::{
    CharacterId, ContainerId, GenreId, IssueId, JobId, LibraryId, LocationId, PersonId, SeriesId,
    TeamId, UserId, VolumeId,
};
pub use crate::issue::{Credit, CreditRole, Issue};
pub use crate::job::{Job, JobKind, JobStatus};
pub use crate::library::{Library, Series, Volume};
pub use crate::person_tag::{Character, Genre, IssueCharacter, IssueGenre, IssueLocation, IssueTeam, Location, Person, Team};
pub use crate::progress::{ActivityLog, ReadingProgress};
pub use crate::rating::AgeRating;
pub use crate::settings::{Setting, SettingType};
pub use crate::user::{User, UserLibraryAccess};
