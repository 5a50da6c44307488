//! Server application state (§10.3), mirroring the teacher's
//! `infra::app_state::AppState` shape: `Arc`-wrapped services, cheap to
//! clone per request, with a `finish_non_exhaustive` `Debug` impl so adding
//! a field never breaks a derive.

use std::fmt;
use std::sync::Arc;

use longbox_core::coordinator::Coordinator;
use longbox_core::db::Db;
use longbox_core::jobs::JobManager;
use longbox_core::maintenance::Maintenance;
use longbox_core::progress::ProgressService;
use longbox_core::query::QueryService;
use longbox_core::settings::SettingsService;
use longbox_core::storage::StorageLayout;
use sqlx::PgPool;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Db>,
    pub config: Arc<Config>,
    pub storage: StorageLayout,
    pub query: Arc<QueryService>,
    pub jobs: Arc<JobManager>,
    pub progress: Arc<ProgressService>,
    pub settings: Arc<SettingsService>,
    pub maintenance: Arc<Maintenance>,
    /// `None` when another process already holds the Coordinator lock (§4.12);
    /// this process still serves HTTP, it just doesn't run Watcher/Scheduler.
    pub coordinator: Arc<Option<Coordinator>>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    pub fn pool(&self) -> &PgPool {
        self.db.pool()
    }
}
