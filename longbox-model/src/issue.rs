use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{IssueId, PersonId, VolumeId};
use crate::rating::AgeRating;

/// A single archive file resolved to one logical comic (§3: Issue).
///
/// Its only owning parent is `volume_id`; Series and Library are reached by
/// joining through Volume (§3 invariant 2), never duplicated onto this row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Issue {
    pub id: IssueId,
    pub volume_id: VolumeId,

    /// Absolute path on disk; the canonical identity an ingest pass matches
    /// against (§3 invariant 1). Never shown to clients — `filename` is.
    pub file_path: String,
    pub filename: String,
    pub file_size: i64,
    pub file_mtime: DateTime<Utc>,

    pub page_count: i32,
    /// The issue's own number, kept as a string so values like "1", "0",
    /// "½" and "Annual 1" all round-trip without loss.
    pub number: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,

    pub cover_year: Option<i32>,
    pub cover_month: Option<i32>,
    pub cover_day: Option<i32>,

    pub web_url: Option<String>,
    pub notes: Option<String>,
    pub age_rating: Option<AgeRating>,
    pub language_iso: Option<String>,
    /// Clamped into `0.0..=5.0` on ingest (§4.2).
    pub community_rating: Option<f32>,
    pub count: Option<i32>,

    pub publisher: Option<String>,
    pub imprint: Option<String>,
    pub format: Option<String>,
    pub series_group: Option<String>,
    pub scan_info: Option<String>,
    pub alternate_series: Option<String>,
    pub alternate_number: Option<String>,
    pub story_arc: Option<String>,

    /// Verbatim embedded metadata document, kept for re-parsing and debugging.
    pub raw_metadata: Option<String>,
    pub thumbnail_path: Option<String>,
    /// Dominant colour swatch, derived from the cover page on first scan.
    pub cover_color: Option<String>,

    /// Set on the row when an ingest pass changed a field the reader cares
    /// about (cover, page count) so caches built on top of it can be told.
    pub is_dirty: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named contributor shared across issues (§3: Credit, referencing Person).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Credit {
    pub issue_id: IssueId,
    pub person_id: PersonId,
    pub role: CreditRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
pub enum CreditRole {
    Writer,
    Penciller,
    Inker,
    Colorist,
    Letterer,
    CoverArtist,
    Editor,
}

impl CreditRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditRole::Writer => "writer",
            CreditRole::Penciller => "penciller",
            CreditRole::Inker => "inker",
            CreditRole::Colorist => "colorist",
            CreditRole::Letterer => "letterer",
            CreditRole::CoverArtist => "cover_artist",
            CreditRole::Editor => "editor",
        }
    }
}
