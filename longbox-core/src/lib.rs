//! Core library for a self-hosted comic archive server: ingestion,
//! job management, filesystem watching, scheduling, age-rating access
//! policy, reading progress, search and reader navigation, and the
//! maintenance/backup routines that keep a long-running deployment healthy.

pub mod access;
pub mod archive;
pub mod coordinator;
pub mod db;
pub mod error;
pub mod ingest;
pub mod jobs;
pub mod maintenance;
pub mod metadata;
pub mod progress;
pub mod query;
pub mod scheduler;
pub mod settings;
pub mod storage;
pub mod watch;

/// Embedded migration set, exposed for `#[sqlx::test(migrator = "...")]`
/// in `longbox-server`'s integration tests; `db::Db::migrate` uses the
/// equivalent `sqlx::migrate!` invocation directly for production startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub mod prelude {
    pub use crate::access::AccessPolicy;
    pub use crate::error::{CoreError, Result};
    pub use crate::jobs::JobManager;
    pub use crate::query::{QueryService, ReaderContext, SearchRequest};
    pub use crate::scheduler::Scheduler;
    pub use crate::settings::SettingsService;
    pub use crate::storage::StorageLayout;
    pub use crate::watch::FsWatcher;
}
