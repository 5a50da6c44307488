//! Shared test harness, grounded on the teacher's
//! `src/tests/test_utils::setup_test_state` + `tests/support::build_test_app`:
//! wrap a `#[sqlx::test]`-provisioned pool in a full `AppState` against a
//! tempdir storage root, then serve it through an `axum-test` `TestServer`.

use std::sync::Arc;

use axum_test::TestServer;
use longbox_core::db::Db;
use longbox_core::ingest::pipeline::WorkerCount;
use longbox_core::jobs::JobManager;
use longbox_core::maintenance::Maintenance;
use longbox_core::progress::ProgressService;
use longbox_core::query::QueryService;
use longbox_core::settings::SettingsService;
use longbox_core::storage::StorageLayout;
use longbox_model::ids::{LibraryId, UserId};
use longbox_model::rating::AgeRating;
use sqlx::PgPool;

use crate::auth::jwt;
use crate::config::Config;
use crate::state::AppState;

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    _tempdir: tempfile::TempDir,
}

pub async fn build_test_app(pool: PgPool) -> TestApp {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let storage = StorageLayout::new(tempdir.path());
    storage.ensure_directories().await.expect("storage dirs");

    let settings = Arc::new(SettingsService::new(pool.clone()));
    settings.sync_and_load().await.expect("settings sync");

    let config = Arc::new(Config {
        server_host: "127.0.0.1".into(),
        server_port: 0,
        database_url: String::new(),
        storage_root: tempdir.path().to_path_buf(),
        jwt_secret: "test-secret".into(),
        access_token_ttl_minutes: 60,
        base_url_prefix: String::new(),
        trusted_proxies: Vec::new(),
        unrar_path: "unrar".into(),
    });

    let state = AppState {
        db: Arc::new(Db::from_pool(pool.clone())),
        config,
        storage,
        query: Arc::new(QueryService::new(pool.clone())),
        jobs: Arc::new(JobManager::new(pool.clone(), WorkerCount::Explicit(1))),
        progress: Arc::new(ProgressService::new(pool.clone())),
        settings,
        maintenance: Arc::new(Maintenance::new(pool.clone())),
        coordinator: Arc::new(None),
    };

    let app = crate::routes::create_api_router(state.clone()).with_state(state.clone());
    let server = TestServer::builder().http_transport().build(app.into_make_service()).expect("test server");

    TestApp { server, state, _tempdir: tempdir }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub fn token_for(state: &AppState, user_id: UserId) -> String {
    jwt::generate_access_token(&state.config.jwt_secret, state.config.access_token_ttl_minutes, user_id)
        .expect("sign access token")
}

/// Inserts a user row directly (skipping the login/argon2 path, which these
/// scenarios don't exercise) and grants it access to `libraries`.
pub async fn seed_user(
    pool: &PgPool,
    username: &str,
    max_age_rating: Option<AgeRating>,
    is_superuser: bool,
    libraries: &[LibraryId],
) -> UserId {
    let id = UserId::new();
    sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, is_active, is_superuser, \
         max_age_rating, allow_unknown_age_ratings, share_progress, created_at, updated_at) \
         VALUES ($1, $2, $3, 'unused', true, $4, $5, false, false, now(), now())",
    )
    .bind(id)
    .bind(username)
    .bind(format!("{username}@example.com"))
    .bind(is_superuser)
    .bind(max_age_rating)
    .execute(pool)
    .await
    .expect("insert user");

    for library_id in libraries {
        sqlx::query("INSERT INTO user_library_access (user_id, library_id) VALUES ($1, $2)")
            .bind(id)
            .bind(library_id)
            .execute(pool)
            .await
            .expect("grant library access");
    }

    id
}

/// Inserts one issue row with just enough columns filled in for the access
/// policy and reader navigation to have something to resolve.
pub async fn seed_issue(
    pool: &PgPool,
    volume_id: longbox_model::ids::VolumeId,
    file_path: &str,
    age_rating: Option<AgeRating>,
) -> longbox_model::ids::IssueId {
    let id = longbox_model::ids::IssueId::new();
    sqlx::query(
        "INSERT INTO issues (id, volume_id, file_path, filename, file_size, file_mtime, age_rating, is_dirty) \
         VALUES ($1, $2, $3, $4, 1024, now(), $5, false)",
    )
    .bind(id)
    .bind(volume_id)
    .bind(file_path)
    .bind(file_path)
    .bind(age_rating)
    .execute(pool)
    .await
    .expect("insert issue");
    id
}
