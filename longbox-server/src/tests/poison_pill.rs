//! Poison-pill scenario (spec §8 scenario 1): a series holding one allowed
//! and one banned issue must disappear from its library's series listing,
//! while the allowed issue is still directly reachable and the banned one
//! still answers with a 403, not a 404 — and reader navigation from the
//! allowed issue sees no neighbours at all.

use axum::http::StatusCode;
use longbox_core::db::{libraries, series_volumes};
use longbox_model::rating::AgeRating;
use serde_json::Value;
use sqlx::PgPool;

use super::support::{bearer, build_test_app, seed_issue, seed_user, token_for};

#[sqlx::test(migrator = "longbox_core::MIGRATOR")]
async fn poison_pill_hides_the_series_but_not_the_safe_issue(pool: PgPool) {
    let app = build_test_app(pool.clone()).await;

    let library = libraries::create(&pool, "Contaminated", "/nonexistent", false).await.unwrap();
    let series = series_volumes::get_or_create_series(&pool, library.id, "Mixed Run").await.unwrap();
    let volume = series_volumes::get_or_create_volume(&pool, series.id, 1).await.unwrap();

    let safe_id = seed_issue(&pool, volume.id, "/mixed/001.cbz", Some(AgeRating::Teen)).await;
    let mature_id = seed_issue(&pool, volume.id, "/mixed/002.cbz", Some(AgeRating::Mature17Plus)).await;

    let user = seed_user(&pool, "reader", Some(AgeRating::Teen), false, &[library.id]).await;
    let token = token_for(&app.state, user);

    let series_list = app
        .server
        .get(&format!("/api/libraries/{}/series", library.id))
        .add_header("Authorization", bearer(&token))
        .await;
    series_list.assert_status_ok();
    let body: Value = series_list.json();
    let items = body["items"].as_array().expect("items array");
    assert!(items.is_empty(), "contaminated series must not appear in the library listing: {items:?}");

    let safe = app.server.get(&format!("/api/comics/{safe_id}")).add_header("Authorization", bearer(&token)).await;
    safe.assert_status_ok();

    let mature = app.server.get(&format!("/api/comics/{mature_id}")).add_header("Authorization", bearer(&token)).await;
    mature.assert_status(StatusCode::FORBIDDEN);

    let read_init = app
        .server
        .get(&format!("/api/reader/{safe_id}/read-init?context_type=series&context_id={}", series.id))
        .add_header("Authorization", bearer(&token))
        .await;
    read_init.assert_status_ok();
    let position: Value = read_init.json();
    assert!(position["prev"].is_null());
    assert!(position["next"].is_null());
}

#[sqlx::test(migrator = "longbox_core::MIGRATOR")]
async fn a_banned_rating_is_forbidden_not_missing(pool: PgPool) {
    let app = build_test_app(pool.clone()).await;

    let library = libraries::create(&pool, "Library", "/nonexistent", false).await.unwrap();
    let series = series_volumes::get_or_create_series(&pool, library.id, "Solo").await.unwrap();
    let volume = series_volumes::get_or_create_volume(&pool, series.id, 1).await.unwrap();
    let mature_id = seed_issue(&pool, volume.id, "/solo/001.cbz", Some(AgeRating::Mature17Plus)).await;

    let user = seed_user(&pool, "reader", Some(AgeRating::Teen), false, &[library.id]).await;
    let token = token_for(&app.state, user);

    let response = app.server.get(&format!("/api/comics/{mature_id}")).add_header("Authorization", bearer(&token)).await;
    response.assert_status(StatusCode::FORBIDDEN);

    let missing = uuid::Uuid::new_v4();
    let not_found = app.server.get(&format!("/api/comics/{missing}")).add_header("Authorization", bearer(&token)).await;
    not_found.assert_status(StatusCode::NOT_FOUND);
}

#[sqlx::test(migrator = "longbox_core::MIGRATOR")]
async fn missing_or_malformed_bearer_token_is_unauthenticated(pool: PgPool) {
    let app = build_test_app(pool).await;

    let no_header = app.server.get("/api/libraries").await;
    no_header.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(no_header.headers().get("www-authenticate").unwrap(), "Bearer");

    let bad_token = app.server.get("/api/libraries").add_header("Authorization", "Bearer not-a-real-token").await;
    bad_token.assert_status(StatusCode::UNAUTHORIZED);
}
