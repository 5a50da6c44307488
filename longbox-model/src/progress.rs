use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{IssueId, UserId};

/// How far a user has read into one issue (§3: ReadingProgress).
///
/// `percent_complete` is deliberately not a field here (§12 Open Questions):
/// it's derived from `current_page`/`total_pages` in the query layer at read
/// time, so it can never drift from the page count a rescan recomputes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReadingProgress {
    pub user_id: UserId,
    pub issue_id: IssueId,
    pub current_page: i32,
    pub total_pages: i32,
    pub completed: bool,
    pub last_read_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ReadingProgress {
    /// Invariant 6: `completed` tracks `current_page` exactly, it is never
    /// set independently of it.
    pub fn recompute_completed(&mut self) {
        self.completed = self.total_pages > 0 && self.current_page >= self.total_pages - 1;
    }
}

/// One append-only row in a user's reading history (§3, §4.10).
///
/// Source of truth for heatmaps, streaks and pages/minute; never updated or
/// deleted except by user-cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ActivityLog {
    pub user_id: UserId,
    pub issue_id: IssueId,
    pub pages_read: i32,
    pub start_page: i32,
    pub end_page: i32,
    pub context_type: Option<String>,
    pub context_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_flips_at_last_page() {
        let mut p = ReadingProgress {
            user_id: UserId::new(),
            issue_id: IssueId::new(),
            current_page: 0,
            total_pages: 22,
            completed: false,
            last_read_at: Utc::now(),
            created_at: Utc::now(),
        };
        p.recompute_completed();
        assert!(!p.completed);

        p.current_page = 21;
        p.recompute_completed();
        assert!(p.completed);
    }

    #[test]
    fn zero_pages_never_completes() {
        let mut p = ReadingProgress {
            user_id: UserId::new(),
            issue_id: IssueId::new(),
            current_page: 0,
            total_pages: 0,
            completed: false,
            last_read_at: Utc::now(),
            created_at: Utc::now(),
        };
        p.recompute_completed();
        assert!(!p.completed);
    }
}
