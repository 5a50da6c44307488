//! Job Manager (C5): a singleton queue over the database, with crash
//! recovery, strict priority order, and dependent-job chaining (§4.5).

mod thumbnail;

use std::time::Duration;

use longbox_model::ids::LibraryId;
use longbox_model::job::{Job, JobKind};
use sqlx::PgPool;
use tokio::time::sleep;

use crate::db::{jobs as jobs_db, libraries};
use crate::error::{CoreError, Result};
use crate::ingest::pipeline::{ScanPipeline, WorkerCount};
use crate::maintenance::Maintenance;

const POLL_INTERVAL: Duration = Duration::from_secs(2);
const IDLE_SWEEPS_BEFORE_INTEGRITY_CHECK: u32 = 15; // ~30s at a 2s poll interval
const RETRY_ATTEMPTS: u32 = 5;
const RETRY_DELAY: Duration = Duration::from_millis(200);

pub enum EnqueueOutcome {
    Queued(Job),
    Ignored(longbox_model::ids::JobId),
}

pub struct JobManager {
    pool: PgPool,
    pipeline: ScanPipeline,
}

impl JobManager {
    pub fn new(pool: PgPool, workers: WorkerCount) -> Self {
        Self {
            pipeline: ScanPipeline::new(pool.clone(), workers),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn enqueue_scan(&self, library_id: LibraryId, force: bool) -> Result<EnqueueOutcome> {
        self.enqueue_with_retry(JobKind::Scan, Some(library_id), force).await
    }

    pub async fn enqueue_cleanup(&self) -> Result<EnqueueOutcome> {
        self.enqueue_with_retry(JobKind::Cleanup, None, false).await
    }

    async fn enqueue_with_retry(
        &self,
        kind: JobKind,
        library_id: Option<LibraryId>,
        force: bool,
    ) -> Result<EnqueueOutcome> {
        match with_retry(|| jobs_db::enqueue(&self.pool, kind, library_id, force)).await? {
            Some(job) => Ok(EnqueueOutcome::Queued(job)),
            None => {
                let existing = jobs_db::list_active(&self.pool)
                    .await?
                    .into_iter()
                    .find(|j| j.kind == kind && j.library_id == library_id)
                    .ok_or_else(|| CoreError::Internal("dedup race: no active job found".into()))?;
                Ok(EnqueueOutcome::Ignored(existing.id))
            }
        }
    }

    /// Run on process start, before the worker loop begins (§4.5, invariant
    /// 7, end-to-end scenario 4).
    pub async fn recover_from_crash(&self) -> Result<()> {
        let interrupted = jobs_db::fail_all_running_as_interrupted(&self.pool).await?;
        for job in &interrupted {
            tracing::warn!(job_id = %job.id, kind = ?job.kind, "recovered interrupted job");
            if let Some(library_id) = job.library_id {
                libraries::set_scanning(&self.pool, library_id, false).await?;
            }
        }
        Ok(())
    }

    /// The worker loop: poll, claim, execute, chain. Holds no long-lived
    /// database transaction (§4.5's public contract).
    pub async fn run_worker(&self, shutdown: tokio_util::sync::CancellationToken) {
        let mut idle_ticks: u32 = 0;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("job worker shutting down");
                    return;
                }
                _ = sleep(POLL_INTERVAL) => {}
            }

            match jobs_db::claim_next(&self.pool).await {
                Ok(Some(job)) => {
                    idle_ticks = 0;
                    self.execute(job).await;
                }
                Ok(None) => {
                    idle_ticks += 1;
                    if idle_ticks >= IDLE_SWEEPS_BEFORE_INTEGRITY_CHECK {
                        idle_ticks = 0;
                        if let Err(e) = self.integrity_sweep().await {
                            tracing::warn!(error = %e, "integrity sweep failed");
                        }
                    }
                }
                Err(e) => tracing::warn!(error = %e, "failed to claim next job"),
            }
        }
    }

    /// Resets any Library whose `is_scanning=true` has no corresponding
    /// running job (§4.5's idle integrity sweep).
    async fn integrity_sweep(&self) -> Result<()> {
        let stuck = libraries::ids_scanning_without_running_job(&self.pool).await?;
        for library_id in stuck {
            tracing::warn!(%library_id, "clearing stale is_scanning flag");
            libraries::set_scanning(&self.pool, library_id, false).await?;
        }
        Ok(())
    }

    async fn execute(&self, job: Job) {
        let outcome = match job.kind {
            JobKind::Scan => self.run_scan(&job).await,
            JobKind::Thumbnail => self.run_thumbnail(&job).await,
            JobKind::Cleanup => self.run_cleanup(&job).await,
        };

        match outcome {
            Ok(result) => {
                if let Err(e) = with_retry(|| jobs_db::complete(&self.pool, job.id, result.clone())).await {
                    tracing::error!(job_id = %job.id, error = %e, "failed to record job completion");
                    return;
                }
                self.chain_next(&job).await;
            }
            Err(e) => {
                tracing::error!(job_id = %job.id, kind = ?job.kind, error = %e, "job failed");
                let _ = with_retry(|| jobs_db::fail(&self.pool, job.id, &e.to_string())).await;
                if let Some(library_id) = job.library_id {
                    let _ = libraries::set_scanning(&self.pool, library_id, false).await;
                }
            }
        }
    }

    /// Scan -> Thumbnail -> Cleanup, only on success (§4.5, §5's ordering
    /// guarantee). A failure anywhere aborts the chain.
    async fn chain_next(&self, finished: &Job) {
        let next = match finished.kind {
            JobKind::Scan => Some(JobKind::Thumbnail),
            JobKind::Thumbnail => Some(JobKind::Cleanup),
            JobKind::Cleanup => None,
        };
        if let Some(kind) = next {
            if let Err(e) = self.enqueue_with_retry(kind, finished.library_id, false).await {
                tracing::warn!(error = %e, ?kind, "failed to chain next job");
            }
        }
    }

    async fn run_scan(&self, job: &Job) -> Result<serde_json::Value> {
        let library_id = job
            .library_id
            .ok_or_else(|| CoreError::Internal("scan job missing library_id".into()))?;
        let library = libraries::get(&self.pool, library_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("library {library_id}")))?;

        libraries::set_scanning(&self.pool, library_id, true).await?;
        let summary = self.pipeline.run(&library, job.force).await;
        libraries::set_scanning(&self.pool, library_id, false).await?;

        let summary = summary?;
        serde_json::to_value(&summary).map_err(Into::into)
    }

    async fn run_thumbnail(&self, job: &Job) -> Result<serde_json::Value> {
        let count = thumbnail::regenerate_dirty(&self.pool, job.library_id).await?;
        serde_json::to_value(serde_json::json!({ "regenerated": count })).map_err(Into::into)
    }

    async fn run_cleanup(&self, job: &Job) -> Result<serde_json::Value> {
        let maintenance = Maintenance::new(self.pool.clone());
        let report = maintenance.run_orphan_cleanup(job.library_id).await?;
        serde_json::to_value(&report).map_err(Into::into)
    }
}

/// Status/flag writes retry a small bounded number of times on transient
/// lock errors before giving up and logging (§4.5).
async fn with_retry<T, F, Fut>(mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() && attempt < RETRY_ATTEMPTS => {
                attempt += 1;
                tracing::debug!(attempt, error = %e, "retrying after transient error");
                sleep(RETRY_DELAY).await;
            }
            Err(e) => return Err(e),
        }
    }
}
