//! Scheduler (C7): a declarative table of periodic tasks whose effective
//! interval is read from Settings and re-armed whenever that setting
//! changes (§4.7).

use std::sync::Arc;

use chrono::{Datelike, Timelike, Utc};
use tokio::sync::broadcast;
use tokio::time::Duration;

use crate::db::libraries;
use crate::jobs::JobManager;
use crate::maintenance::Maintenance;
use crate::settings::SettingsService;
use crate::storage::StorageLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskId {
    Scan,
    Backup,
    Cleanup,
}

impl TaskId {
    const ALL: [TaskId; 3] = [TaskId::Scan, TaskId::Backup, TaskId::Cleanup];

    fn name(self) -> &'static str {
        match self {
            TaskId::Scan => "scan",
            TaskId::Backup => "backup",
            TaskId::Cleanup => "cleanup",
        }
    }

    fn settings_key(self) -> String {
        format!("system.task.{}.interval", self.name())
    }

    /// Default interval and default hour-of-day for a task with no
    /// Settings row yet (should only happen before the first sync).
    fn default_interval(self) -> Interval {
        match self {
            TaskId::Scan => Interval::Daily,
            TaskId::Backup => Interval::Weekly,
            TaskId::Cleanup => Interval::Weekly,
        }
    }

    fn default_hour(self) -> u32 {
        match self {
            TaskId::Scan => 3,
            TaskId::Backup => 4,
            TaskId::Cleanup => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interval {
    Daily,
    Weekly,
    Monthly,
    Disabled,
}

impl Interval {
    fn parse(raw: &str) -> Self {
        match raw {
            "daily" => Interval::Daily,
            "weekly" => Interval::Weekly,
            "monthly" => Interval::Monthly,
            _ => Interval::Disabled,
        }
    }
}

pub struct Scheduler {
    job_manager: Arc<JobManager>,
    maintenance: Arc<Maintenance>,
    settings: Arc<SettingsService>,
    database_url: String,
    storage: StorageLayout,
}

impl Scheduler {
    pub fn new(
        job_manager: Arc<JobManager>,
        maintenance: Arc<Maintenance>,
        settings: Arc<SettingsService>,
        database_url: String,
        storage: StorageLayout,
    ) -> Self {
        Self {
            job_manager,
            maintenance,
            settings,
            database_url,
            storage,
        }
    }

    /// Spawns one arm-loop per declared task; each re-arms on its own
    /// interval setting changing and stops when `shutdown` fires.
    pub fn run(self: Arc<Self>, shutdown: tokio_util::sync::CancellationToken) {
        for task in TaskId::ALL {
            let scheduler = self.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { scheduler.run_task_loop(task, shutdown).await });
        }
    }

    async fn run_task_loop(&self, task: TaskId, shutdown: tokio_util::sync::CancellationToken) {
        let key = task.settings_key();
        loop {
            let interval = self
                .settings
                .get_cached(&key)
                .map(|s| Interval::parse(&s.value))
                .unwrap_or_else(|| task.default_interval());

            let mut changes = self.settings.subscribe_changes();

            if interval == Interval::Disabled {
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    changed = wait_for_key(&mut changes, &key) => {
                        if !changed { return; }
                        continue;
                    }
                }
                continue;
            }

            let delay = duration_until_next(Utc::now(), interval, task.default_hour());
            tracing::debug!(task = task.name(), ?delay, "scheduler armed");

            tokio::select! {
                _ = shutdown.cancelled() => return,
                changed = wait_for_key(&mut changes, &key) => {
                    if !changed { return; }
                    continue;
                }
                _ = tokio::time::sleep(delay) => {
                    self.run_task(task).await;
                }
            }
        }
    }

    async fn run_task(&self, task: TaskId) {
        let result = match task {
            TaskId::Scan => self.run_scan_task().await,
            TaskId::Cleanup => self.job_manager.enqueue_cleanup().await.map(|_| ()),
            TaskId::Backup => self
                .maintenance
                .run_backup(&self.database_url, &self.storage)
                .await
                .map(|_| ()),
        };
        if let Err(e) = result {
            tracing::warn!(task = task.name(), error = %e, "scheduled task failed");
        }
    }

    async fn run_scan_task(&self) -> crate::error::Result<()> {
        for library in libraries::list(self.job_manager.pool()).await? {
            if let Err(e) = self.job_manager.enqueue_scan(library.id, false).await {
                tracing::warn!(library_id = %library.id, error = %e, "failed to enqueue scheduled scan");
            }
        }
        Ok(())
    }
}

/// Waits for a settings change matching `key`, a lagged receiver (treated
/// as "something changed, re-check"), or channel closure (shutdown). Returns
/// `false` only when the channel has closed for good.
async fn wait_for_key(rx: &mut broadcast::Receiver<String>, key: &str) -> bool {
    loop {
        match rx.recv().await {
            Ok(changed_key) if changed_key == key => return true,
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(_)) => return true,
            Err(broadcast::error::RecvError::Closed) => return false,
        }
    }
}

/// Computes the delay until the next scheduled fire time for `interval`
/// anchored at `default_hour` UTC: the next day/Sunday/first-of-month at
/// that hour, whichever is soonest and in the future.
fn duration_until_next(now: chrono::DateTime<Utc>, interval: Interval, hour: u32) -> Duration {
    let today_at_hour = now
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .expect("valid hour")
        .and_utc();

    let next = match interval {
        Interval::Daily => {
            if today_at_hour > now {
                today_at_hour
            } else {
                today_at_hour + chrono::Duration::days(1)
            }
        }
        Interval::Weekly => {
            let days_until_sunday = (7 - now.weekday().num_days_from_sunday()) % 7;
            let candidate = today_at_hour + chrono::Duration::days(days_until_sunday as i64);
            if candidate > now {
                candidate
            } else {
                candidate + chrono::Duration::days(7)
            }
        }
        Interval::Monthly => {
            let first_of_month = today_at_hour.with_day(1).expect("day 1 always valid");
            if first_of_month > now {
                first_of_month
            } else {
                let (year, month) = if now.month() == 12 { (now.year() + 1, 1) } else { (now.year(), now.month() + 1) };
                first_of_month
                    .with_year(year)
                    .and_then(|d| d.with_month(month))
                    .expect("next month is always representable")
            }
        }
        Interval::Disabled => return Duration::from_secs(u64::MAX / 2),
    };

    (next - now).to_std().unwrap_or(Duration::from_secs(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn daily_schedules_same_day_if_hour_not_yet_passed() {
        let now = Utc.with_ymd_and_hms(2026, 7, 28, 1, 0, 0).unwrap();
        let delay = duration_until_next(now, Interval::Daily, 3);
        assert_eq!(delay, Duration::from_secs(2 * 3600));
    }

    #[test]
    fn daily_rolls_to_tomorrow_once_hour_has_passed() {
        let now = Utc.with_ymd_and_hms(2026, 7, 28, 5, 0, 0).unwrap();
        let delay = duration_until_next(now, Interval::Daily, 3);
        assert_eq!(delay, Duration::from_secs(22 * 3600));
    }

    #[test]
    fn settings_key_matches_scheduler_prefix() {
        assert_eq!(TaskId::Scan.settings_key(), "system.task.scan.interval");
        assert!(crate::settings::is_task_interval_key(&TaskId::Scan.settings_key()));
    }
}
