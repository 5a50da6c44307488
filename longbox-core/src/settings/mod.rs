//! Settings & Cache (C11): typed key/value store with a process-global
//! read cache, defaults reconciliation on start, and a change feed the
//! Scheduler watches for `system.task.*.interval` edits (§4.11).

use dashmap::DashMap;
use longbox_model::settings::{Setting, SettingType};
use sqlx::PgPool;
use tokio::sync::broadcast;

use crate::db::settings as settings_db;
use crate::error::{CoreError, Result};

const CHANGE_CHANNEL_CAPACITY: usize = 32;

/// Code-side defaults reconciled against the database on start (§4.11):
/// missing keys are inserted, metadata always overwritten, values never.
pub fn defaults() -> Vec<Setting> {
    vec![
        setting(
            "system.task.scan.interval",
            "daily",
            SettingType::Select,
            "scheduling",
            "Scan interval",
            vec!["daily", "weekly", "monthly", "disabled"],
        ),
        setting(
            "system.task.backup.interval",
            "weekly",
            SettingType::Select,
            "scheduling",
            "Backup interval",
            vec!["daily", "weekly", "monthly", "disabled"],
        ),
        setting(
            "system.task.cleanup.interval",
            "weekly",
            SettingType::Select,
            "scheduling",
            "Cleanup interval",
            vec!["daily", "weekly", "monthly", "disabled"],
        ),
        setting(
            "scanning.batch_window",
            "600",
            SettingType::Int,
            "scanning",
            "Watcher debounce window (seconds)",
            vec![],
        ),
        setting(
            "system.parallel_metadata_workers",
            "0",
            SettingType::Int,
            "scanning",
            "Parallel metadata workers (0 = auto)",
            vec![],
        ),
        setting(
            "ui.on_deck.staleness_weeks",
            "8",
            SettingType::Int,
            "ui",
            "On Deck staleness window (weeks)",
            vec![],
        ),
        setting(
            "server.opds_enabled",
            "false",
            SettingType::Bool,
            "server",
            "Enable OPDS feed",
            vec![],
        ),
        setting(
            "backup.retention_days",
            "30",
            SettingType::Int,
            "backup",
            "Backup retention (days)",
            vec![],
        ),
        setting(
            "general.log_level",
            "info",
            SettingType::Select,
            "general",
            "Log level",
            vec!["trace", "debug", "info", "warn", "error"],
        ),
    ]
}

fn setting(key: &str, value: &str, data_type: SettingType, category: &str, label: &str, options: Vec<&str>) -> Setting {
    Setting {
        key: key.to_string(),
        value: value.to_string(),
        data_type,
        category: category.to_string(),
        label: label.to_string(),
        description: None,
        options: options.into_iter().map(str::to_string).collect(),
        depends_on: None,
        hidden: false,
    }
}

/// A setting key is a task-interval key iff it matches `system.task.*.interval`.
pub fn is_task_interval_key(key: &str) -> bool {
    key.starts_with("system.task.") && key.ends_with(".interval")
}

pub struct SettingsService {
    pool: PgPool,
    cache: DashMap<String, Setting>,
    changes: broadcast::Sender<String>,
}

impl SettingsService {
    pub fn new(pool: PgPool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            pool,
            cache: DashMap::new(),
            changes,
        }
    }

    /// Runs the default-reconciliation pass and primes the cache. Call once
    /// at process start, before serving any request.
    pub async fn sync_and_load(&self) -> Result<()> {
        settings_db::sync_defaults(&self.pool, &defaults()).await?;
        self.reload().await
    }

    async fn reload(&self) -> Result<()> {
        self.cache.clear();
        for setting in settings_db::all(&self.pool).await? {
            self.cache.insert(setting.key.clone(), setting);
        }
        Ok(())
    }

    pub fn get_cached(&self, key: &str) -> Option<Setting> {
        self.cache.get(key).map(|entry| entry.clone())
    }

    pub async fn get(&self, key: &str) -> Result<Option<Setting>> {
        if let Some(cached) = self.get_cached(key) {
            return Ok(Some(cached));
        }
        settings_db::get(&self.pool, key).await
    }

    pub fn all_cached(&self) -> Vec<Setting> {
        self.cache.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Writes the new value, invalidates the cache for that key, and — if
    /// it's a task-interval key — notifies any subscribed Scheduler.
    pub async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let existing = settings_db::get(&self.pool, key)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("setting {key}")))?;
        validate_value(&existing, value)?;

        settings_db::set_value(&self.pool, key, value).await?;
        let mut updated = existing;
        updated.value = value.to_string();
        self.cache.insert(key.to_string(), updated);

        if is_task_interval_key(key) {
            let _ = self.changes.send(key.to_string());
        }
        Ok(())
    }

    /// Subscribers (the Scheduler) see every changed key; they filter for
    /// the `system.task.*.interval` prefix themselves.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }
}

fn validate_value(setting: &Setting, value: &str) -> Result<()> {
    match setting.data_type {
        SettingType::Bool => value
            .parse::<bool>()
            .map(|_| ())
            .map_err(|_| CoreError::BadRequest(format!("{} expects a bool, got {value:?}", setting.key))),
        SettingType::Int => value
            .parse::<i64>()
            .map(|_| ())
            .map_err(|_| CoreError::BadRequest(format!("{} expects an int, got {value:?}", setting.key))),
        SettingType::Select if !setting.options.is_empty() && !setting.options.iter().any(|o| o == value) => {
            Err(CoreError::BadRequest(format!("{} must be one of {:?}", setting.key, setting.options)))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_interval_key_matches_the_three_tasks() {
        assert!(is_task_interval_key("system.task.scan.interval"));
        assert!(is_task_interval_key("system.task.backup.interval"));
        assert!(!is_task_interval_key("scanning.batch_window"));
        assert!(!is_task_interval_key("system.task.scan.enabled"));
    }

    #[test]
    fn defaults_cover_every_documented_key() {
        let keys: Vec<&str> = defaults().iter().map(|s| s.key.as_str()).collect();
        assert!(keys.contains(&"system.task.scan.interval"));
        assert!(keys.contains(&"backup.retention_days"));
        assert!(keys.contains(&"general.log_level"));
    }
}
