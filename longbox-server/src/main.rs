//! Longbox server entrypoint: config/CLI parsing, storage and database
//! bootstrap, Process Coordinator gating of the Watcher/Scheduler/Job
//! worker, and the Axum HTTP surface (§0, §6, §10.3, §11).

mod auth;
mod config;
mod errors;
mod pagination;
mod routes;
mod state;
#[cfg(test)]
mod tests;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use clap::Parser;
use longbox_core::coordinator::Coordinator;
use longbox_core::db::Db;
use longbox_core::ingest::pipeline::WorkerCount;
use longbox_core::jobs::JobManager;
use longbox_core::maintenance::Maintenance;
use longbox_core::progress::ProgressService;
use longbox_core::query::QueryService;
use longbox_core::scheduler::Scheduler;
use longbox_core::settings::SettingsService;
use longbox_core::storage::StorageLayout;
use longbox_core::watch::FsWatcher;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{Args, Config};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(port) = args.port {
        config.server_port = port;
    }
    if let Some(host) = args.host {
        config.server_host = host;
    }
    let config = Arc::new(config);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "longbox_server=debug,longbox_core=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let storage = StorageLayout::new(&config.storage_root);
    storage.ensure_directories().await?;
    info!(root = %storage.root().display(), "storage layout ready");

    let db = Db::connect(&config.database_url).await?;
    db.migrate().await?;
    info!("database ready");

    let pool = db.pool().clone();
    let settings = Arc::new(SettingsService::new(pool.clone()));
    settings.sync_and_load().await?;

    let query = Arc::new(QueryService::new(pool.clone()));
    let progress = Arc::new(ProgressService::new(pool.clone()));
    let maintenance = Arc::new(Maintenance::new(pool.clone()));

    let jobs = Arc::new(JobManager::new(pool.clone(), WorkerCount::Auto));
    jobs.recover_from_crash().await?;

    let shutdown = CancellationToken::new();

    let coordinator = Coordinator::try_acquire(storage.root())?;
    if coordinator.is_some() {
        info!("coordinator lock acquired, starting watcher, scheduler and job worker");

        let watcher = Arc::new(FsWatcher::new(pool.clone(), jobs.clone(), settings.clone()));
        watcher.start().await?;

        let scheduler = Arc::new(Scheduler::new(jobs.clone(), maintenance.clone(), settings.clone(), config.database_url.clone(), storage.clone()));
        scheduler.run(shutdown.clone());

        let worker_jobs = jobs.clone();
        let worker_shutdown = shutdown.clone();
        tokio::spawn(async move { worker_jobs.run_worker(worker_shutdown).await });
    } else {
        warn!("another process holds the coordinator lock; serving HTTP only");
    }

    let state = AppState {
        db: Arc::new(db),
        config: config.clone(),
        storage,
        query,
        jobs,
        progress,
        settings,
        maintenance,
        coordinator: Arc::new(coordinator),
    };

    let app = create_app(state);

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    info!("starting longbox server on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    Ok(())
}

fn create_app(state: AppState) -> Router {
    routes::create_api_router(state.clone())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received, draining background workers");
    token.cancel();
}
