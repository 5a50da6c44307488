use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ContainerId, IssueId, UserId};

/// A user-facing grouping of issues that isn't a Series (§3: Container).
///
/// `Collection` and `ReadingList` names are unique system-wide; `PullList`
/// names are scoped to their owner instead, hence `owner_id` being optional
/// on the other two variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Container {
    pub id: ContainerId,
    pub kind: ContainerKind,
    pub name: String,
    /// `None` for Collection/ReadingList (library-wide); `Some` for PullList.
    pub owner_id: Option<UserId>,
    /// True for containers derived from Issue attributes (series-group for
    /// Collection, alternate-series/-number for ReadingList) rather than
    /// curated by hand. Always `false` for PullList.
    pub auto_generated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
pub enum ContainerKind {
    Collection,
    ReadingList,
    PullList,
}

/// An issue's membership and ordering within one container.
///
/// Collections don't care about order, ReadingLists use a floating-point
/// `position` so items can be inserted between two existing ones without
/// renumbering the whole list, and PullLists use an integer `sort_order`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ContainerItem {
    pub container_id: ContainerId,
    pub issue_id: IssueId,
    pub position: Option<f64>,
    pub sort_order: Option<i32>,
}
