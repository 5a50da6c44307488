//! Filesystem Watcher (C6): one recursive observer per watch-enabled
//! Library, coalescing bursts of filesystem activity into a single
//! non-forced scan per quiet period (§4.6).

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use longbox_model::ids::LibraryId;
use longbox_model::library::Library;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use tokio::sync::{mpsc, RwLock};
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::db::libraries;
use crate::error::{CoreError, Result};
use crate::jobs::JobManager;
use crate::settings::SettingsService;

const DEFAULT_BATCH_WINDOW_SECS: u64 = 600;

struct LibraryWatch {
    _watcher: RecommendedWatcher,
    cancel: CancellationToken,
}

/// Process-wide singleton (gated by the Process Coordinator, §4.12):
/// only the winning process ever calls [`Watcher::start`].
pub struct FsWatcher {
    pool: sqlx::PgPool,
    job_manager: Arc<JobManager>,
    settings: Arc<SettingsService>,
    handles: RwLock<HashMap<LibraryId, LibraryWatch>>,
}

impl FsWatcher {
    pub fn new(pool: sqlx::PgPool, job_manager: Arc<JobManager>, settings: Arc<SettingsService>) -> Self {
        Self {
            pool,
            job_manager,
            settings,
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Registers every watch-enabled Library. Called once at startup by
    /// the process that wins the coordinator lock.
    pub async fn start(&self) -> Result<()> {
        for library in libraries::list(&self.pool).await? {
            if library.watch_enabled {
                if let Err(e) = self.register_library(&library).await {
                    tracing::warn!(library_id = %library.id, error = %e, "failed to start watcher for library");
                }
            }
        }
        Ok(())
    }

    /// Idempotent: a library already registered is left untouched (§4.6).
    pub async fn register_library(&self, library: &Library) -> Result<()> {
        if self.handles.read().await.contains_key(&library.id) {
            return Ok(());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let library_id = library.id;

        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| match result {
            Ok(event) if is_relevant(&event) => {
                let _ = tx.send(());
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(%library_id, error = %e, "filesystem watch error"),
        })
        .map_err(|e| CoreError::Internal(format!("failed to create watcher: {e}")))?;

        watcher
            .watch(Path::new(&library.root_path), RecursiveMode::Recursive)
            .map_err(|e| CoreError::Internal(format!("failed to watch {}: {e}", library.root_path)))?;

        let cancel = CancellationToken::new();
        let debounce_cancel = cancel.clone();
        let job_manager = self.job_manager.clone();
        let settings = self.settings.clone();
        tokio::spawn(async move { debounce_loop(rx, job_manager, settings, library_id, debounce_cancel).await });

        self.handles.write().await.insert(
            library_id,
            LibraryWatch {
                _watcher: watcher,
                cancel,
            },
        );
        tracing::info!(library_id = %library_id, path = %library.root_path, "watching library");
        Ok(())
    }

    /// Cancels the pending debounce timer (if any) and unsubscribes the
    /// observer (§4.6: disabling watch cancels pending timers).
    pub async fn unregister_library(&self, library_id: LibraryId) {
        if let Some(handle) = self.handles.write().await.remove(&library_id) {
            handle.cancel.cancel();
            tracing::info!(%library_id, "stopped watching library");
        }
    }

    pub async fn shutdown(&self) {
        let ids: Vec<LibraryId> = self.handles.read().await.keys().copied().collect();
        for id in ids {
            self.unregister_library(id).await;
        }
    }
}

/// One coalescing timer per library: the first event of a quiet period
/// arms a `batch_window`-second timer; further events during that window
/// are swallowed; on fire a non-forced scan is enqueued and the timer
/// disarms (§4.6).
async fn debounce_loop(
    mut rx: mpsc::UnboundedReceiver<()>,
    job_manager: Arc<JobManager>,
    settings: Arc<SettingsService>,
    library_id: LibraryId,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            event = rx.recv() => {
                if event.is_none() {
                    return;
                }
            }
        }

        let batch_window = batch_window(&settings);
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(batch_window) => {
                while rx.try_recv().is_ok() {}
                if let Err(e) = job_manager.enqueue_scan(library_id, false).await {
                    tracing::warn!(%library_id, error = %e, "failed to enqueue watcher-triggered scan");
                }
            }
        }
    }
}

fn batch_window(settings: &SettingsService) -> Duration {
    settings
        .get_cached("scanning.batch_window")
        .and_then(|s| s.value.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(DEFAULT_BATCH_WINDOW_SECS))
}

/// Filters `notify` events down to the ones that should nudge a rescan:
/// creates, modifies and removes, never plain access events.
fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_events_are_not_relevant() {
        let event = Event::new(EventKind::Access(notify::event::AccessKind::Any));
        assert!(!is_relevant(&event));
    }

    #[test]
    fn create_events_are_relevant() {
        let event = Event::new(EventKind::Create(notify::event::CreateKind::File));
        assert!(is_relevant(&event));
    }
}
