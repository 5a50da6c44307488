//! Reading Progress & Activity (C10): the service layer on top of
//! `db::progress`, plus the streak derivation the append-only ActivityLog
//! exists to support (§4.10).

use longbox_model::ids::{IssueId, UserId};
use longbox_model::progress::ReadingProgress;
use sqlx::PgPool;

use crate::db::progress as progress_db;
use crate::error::Result;

pub struct ProgressService {
    pool: PgPool,
}

impl ProgressService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn save(
        &self,
        user_id: UserId,
        issue_id: IssueId,
        current_page: i32,
        total_pages: i32,
        context_type: Option<&str>,
        context_id: Option<&str>,
    ) -> Result<ReadingProgress> {
        progress_db::save(&self.pool, user_id, issue_id, current_page, total_pages, context_type, context_id).await
    }

    /// Marks an issue fully read in one call, used by `POST
    /// /progress/{id}/mark-read` and the batch read-status endpoint.
    pub async fn mark_read(&self, user_id: UserId, issue_id: IssueId, total_pages: i32) -> Result<ReadingProgress> {
        let last_page = (total_pages - 1).max(0);
        self.save(user_id, issue_id, last_page, total_pages, None, None).await
    }

    pub async fn get(&self, user_id: UserId, issue_id: IssueId) -> Result<Option<ReadingProgress>> {
        progress_db::get(&self.pool, user_id, issue_id).await
    }

    pub async fn delete(&self, user_id: UserId, issue_id: IssueId) -> Result<()> {
        progress_db::delete(&self.pool, user_id, issue_id).await
    }

    /// Which of `issue_ids` this user has marked completed, for the
    /// `read_filter` query param and the batch read-status endpoint.
    pub async fn completed_issue_ids(&self, user_id: UserId, issue_ids: &[IssueId]) -> Result<std::collections::HashSet<IssueId>> {
        progress_db::completed_issue_ids(&self.pool, user_id, issue_ids).await
    }

    /// Longest run of consecutive UTC dates with at least one ActivityLog
    /// row, counted backwards from the most recent date; a gap over one day
    /// ends the run (§4.10).
    pub async fn current_streak_days(&self, user_id: UserId) -> Result<u32> {
        let dates = progress_db::distinct_activity_dates(&self.pool, user_id).await?;
        Ok(streak_from_dates(&dates))
    }
}

fn streak_from_dates(dates_desc: &[chrono::NaiveDate]) -> u32 {
    let mut streak = 0u32;
    let mut previous: Option<chrono::NaiveDate> = None;
    for &date in dates_desc {
        match previous {
            None => streak = 1,
            Some(prev) if prev - date == chrono::Duration::days(1) => streak += 1,
            Some(_) => break,
        }
        previous = Some(date);
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn consecutive_days_count_the_whole_run() {
        let dates = vec![date(2026, 7, 28), date(2026, 7, 27), date(2026, 7, 26)];
        assert_eq!(streak_from_dates(&dates), 3);
    }

    #[test]
    fn gap_over_one_day_breaks_the_run() {
        let dates = vec![date(2026, 7, 28), date(2026, 7, 27), date(2026, 7, 20)];
        assert_eq!(streak_from_dates(&dates), 2);
    }

    #[test]
    fn empty_history_has_no_streak() {
        assert_eq!(streak_from_dates(&[]), 0);
    }
}
