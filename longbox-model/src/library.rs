use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{LibraryId, SeriesId, VolumeId};

/// A root directory and its logical ownership (§3 DATA MODEL: Library).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Library {
    pub id: LibraryId,
    pub name: String,
    pub root_path: String,
    pub watch_enabled: bool,
    pub scan_on_startup: bool,
    /// Transient flag, not round-tripped through every read; set by the
    /// Job Manager while a scan for this library is running.
    pub is_scanning: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A titled, ongoing or finite run (§3: Series). Name is not unique globally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Series {
    pub id: SeriesId,
    pub library_id: LibraryId,
    pub name: String,
    pub summary_override: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A numbered run within a Series (§3: Volume).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Volume {
    pub id: VolumeId,
    pub series_id: SeriesId,
    pub volume_number: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
