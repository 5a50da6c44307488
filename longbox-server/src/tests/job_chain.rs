//! Job-chain scenario (spec §8 scenario 2): a scan job on an empty library
//! chains into a thumbnail job, which chains into a cleanup job, and the
//! library's `is_scanning` flag is clear once the chain finishes. Also
//! covers scenario 3, enqueue de-duplication.

use std::time::Duration;

use longbox_core::db::libraries;
use longbox_core::jobs::EnqueueOutcome;
use longbox_model::job::{JobKind, JobStatus};
use serde_json::Value;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use super::support::{bearer, build_test_app, seed_user, token_for};

#[sqlx::test(migrator = "longbox_core::MIGRATOR")]
async fn scan_chains_into_thumbnail_then_cleanup(pool: PgPool) {
    let app = build_test_app(pool.clone()).await;

    let lib_root = tempfile::tempdir().expect("library root");
    let library = libraries::create(&pool, "Empty", lib_root.path().to_str().unwrap(), false).await.unwrap();

    let admin = seed_user(&pool, "admin", None, true, &[library.id]).await;
    let token = token_for(&app.state, admin);

    let shutdown = CancellationToken::new();
    let worker_jobs = app.state.jobs.clone();
    let worker_shutdown = shutdown.clone();
    let worker = tokio::spawn(async move { worker_jobs.run_worker(worker_shutdown).await });

    let trigger = app
        .server
        .post(&format!("/api/libraries/{}/scan", library.id))
        .add_header("Authorization", bearer(&token))
        .await;
    trigger.assert_status_ok();
    let triggered: Value = trigger.json();
    assert_eq!(triggered["deduplicated"], false);

    let mut kinds_completed = Vec::new();
    for _ in 0..60 {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let jobs = app.server.get("/api/jobs").add_header("Authorization", bearer(&token)).await;
        jobs.assert_status_ok();
        let body: Value = jobs.json();
        let jobs = body.as_array().expect("jobs array");

        assert!(
            jobs.iter().all(|j| j["status"] != "failed"),
            "no job in the chain should fail on an empty library: {jobs:?}"
        );

        kinds_completed = jobs
            .iter()
            .filter(|j| j["status"] == "completed")
            .map(|j| j["kind"].as_str().unwrap().to_string())
            .collect();

        if kinds_completed.len() >= 3 {
            break;
        }
    }

    shutdown.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), worker).await;

    assert!(kinds_completed.contains(&"scan".to_string()), "scan never completed: {kinds_completed:?}");
    assert!(kinds_completed.contains(&"thumbnail".to_string()), "thumbnail never chained: {kinds_completed:?}");
    assert!(kinds_completed.contains(&"cleanup".to_string()), "cleanup never chained: {kinds_completed:?}");

    let refreshed = libraries::get(&pool, library.id).await.unwrap().unwrap();
    assert!(!refreshed.is_scanning, "is_scanning must be cleared once the scan finishes");
}

#[sqlx::test(migrator = "longbox_core::MIGRATOR")]
async fn enqueueing_a_scan_twice_is_deduplicated(pool: PgPool) {
    let lib_root = tempfile::tempdir().expect("library root");
    let library = libraries::create(&pool, "Dup", lib_root.path().to_str().unwrap(), false).await.unwrap();

    let app = build_test_app(pool).await;

    let first = app.state.jobs.enqueue_scan(library.id, false).await.unwrap();
    let first_id = match first {
        EnqueueOutcome::Queued(job) => {
            assert_eq!(job.kind, JobKind::Scan);
            assert_eq!(job.status, JobStatus::Pending);
            job.id
        }
        EnqueueOutcome::Ignored(_) => panic!("first enqueue should not be deduplicated"),
    };

    let second = app.state.jobs.enqueue_scan(library.id, false).await.unwrap();
    match second {
        EnqueueOutcome::Ignored(job_id) => assert_eq!(job_id, first_id),
        EnqueueOutcome::Queued(_) => panic!("second enqueue for the same pending library scan should be ignored"),
    }
}
