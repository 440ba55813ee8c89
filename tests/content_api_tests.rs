// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Saved content API against a fake Supabase.
//!
//! Call counts are asserted with `.expect(n)` and verified when the mock
//! server is dropped.

use axum::http::StatusCode;
use serde_json::json;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn exercise_row(id: Uuid, user_id: Uuid) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": user_id,
        "title": "Les fractions",
        "content": "1. Calcule 1/2 + 1/4",
        "subject": "mathématiques",
        "class_level": "CM1",
        "created_at": "2026-03-01T10:00:00Z",
        "updated_at": null,
    })
}

fn image_row(id: Uuid, user_id: Uuid) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": user_id,
        "prompt": "Un chat qui lit un livre",
        "image_url": "https://cdn.example/chat.png",
        "generated_at": "2026-03-02T09:00:00Z",
        "status": "success",
        "generation_month": "2026-03-01",
        "monthly_generation_count": 0,
    })
}

/// How long a held-open backend call takes to answer.
const SLOW: Duration = Duration::from_millis(400);

/// Every content table answers with no rows, `times` times.
async fn mock_empty_tables(server: &MockServer, times: u64) {
    for table in common::CONTENT_TABLES {
        common::mock_select(server, table, json!([]), times).await;
    }
}

#[tokio::test]
async fn test_listing_merges_tables_newest_first() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    let exercise_id = Uuid::new_v4();
    let image_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/saved_exercises"))
        .and(query_param("user_id", format!("eq.{}", user_id)))
        .and(query_param("order", "created_at.desc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([exercise_row(exercise_id, user_id)])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/image_generation_usage"))
        .and(query_param("status", "eq.success"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([image_row(image_id, user_id)])),
        )
        .expect(1)
        .mount(&server)
        .await;
    for table in &common::CONTENT_TABLES[1..4] {
        common::mock_select(&server, table, json!([]), 1).await;
    }

    let config = common::test_config(&server);
    let token = common::create_test_jwt(user_id, "prof@ecole.fr", &config.jwt_secret);
    let (app, _) = common::create_test_app(config);

    let response = app
        .oneshot(common::authed_request("GET", "/api/content", &token, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["total"], 2);

    let items = body["items"].as_array().unwrap();
    assert_eq!(items[0]["type"], "image");
    assert_eq!(items[0]["title"], "Un chat qui lit un livre");
    assert_eq!(items[0]["content"], "https://cdn.example/chat.png");
    assert_eq!(items[0]["created_at"], "2026-03-02T09:00:00Z");
    assert_eq!(items[1]["type"], "exercise");
    assert_eq!(items[1]["id"], exercise_id.to_string());
    assert_eq!(items[1]["metadata"]["class_level"], "CM1");
    assert!(items[1]["metadata"].get("user_id").is_none());
}

#[tokio::test]
async fn test_listing_is_cached_within_ttl() {
    let server = MockServer::start().await;
    mock_empty_tables(&server, 1).await;

    let config = common::test_config(&server);
    let user_id = Uuid::new_v4();
    let token = common::create_test_jwt(user_id, "prof@ecole.fr", &config.jwt_secret);
    let (app, _) = common::create_test_app(config);

    for uri in ["/api/content", "/api/content", "/api/content/exercise"] {
        let response = app
            .clone()
            .oneshot(common::authed_request("GET", uri, &token, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {}", uri);
    }
}

#[tokio::test]
async fn test_save_invalidates_cached_listing() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    let new_id = Uuid::new_v4();

    mock_empty_tables(&server, 2).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/saved_exercises"))
        .and(body_partial_json(json!({
            "title": "Les fractions",
            "user_id": user_id,
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!([exercise_row(new_id, user_id)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = common::test_config(&server);
    let token = common::create_test_jwt(user_id, "prof@ecole.fr", &config.jwt_secret);
    let (app, _) = common::create_test_app(config);

    let list = || common::authed_request("GET", "/api/content", &token, None);

    let response = app.clone().oneshot(list()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/content/exercise",
            &token,
            Some(json!({
                "title": "Les fractions",
                "content": "1. Calcule 1/2 + 1/4",
                "class_level": "CM1",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let saved = common::body_json(response).await;
    assert_eq!(saved["id"], new_id.to_string());
    assert_eq!(saved["type"], "exercise");

    // Cache was dropped, so this goes back to the database
    let response = app.clone().oneshot(list()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_save_reports_missing_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let config = common::test_config(&server);
    let token = common::create_test_jwt(Uuid::new_v4(), "prof@ecole.fr", &config.jwt_secret);
    let (app, _) = common::create_test_app(config);

    let response = app
        .oneshot(common::authed_request(
            "POST",
            "/api/content/music-lesson",
            &token,
            Some(json!({ "title": "Les saisons" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "MISSING_FIELDS");
    assert_eq!(body["fields"], json!(["content", "lyrics"]));
}

#[tokio::test]
async fn test_save_rejects_protected_columns() {
    let server = MockServer::start().await;
    let config = common::test_config(&server);
    let token = common::create_test_jwt(Uuid::new_v4(), "prof@ecole.fr", &config.jwt_secret);
    let (app, _) = common::create_test_app(config);

    let response = app
        .oneshot(common::authed_request(
            "POST",
            "/api/content/exercise",
            &token,
            Some(json!({
                "title": "Dictée",
                "content": "...",
                "user_id": Uuid::new_v4(),
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "REQUEST_ERROR");
}

#[tokio::test]
async fn test_unknown_kind_is_a_bad_request() {
    let (app, state) = common::create_offline_app();
    let token = common::create_test_jwt(Uuid::new_v4(), "prof@ecole.fr", &state.config.jwt_secret);

    let response = app
        .oneshot(common::authed_request("GET", "/api/content/poem", &token, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "REQUEST_ERROR");
}

#[tokio::test]
async fn test_delete_missing_row_is_not_found() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    let id = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/saved_lesson_plans"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(query_param("user_id", format!("eq.{}", user_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let config = common::test_config(&server);
    let token = common::create_test_jwt(user_id, "prof@ecole.fr", &config.jwt_secret);
    let (app, _) = common::create_test_app(config);

    let response = app
        .oneshot(common::authed_request(
            "DELETE",
            &format!("/api/content/lesson-plan/{}", id),
            &token,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_delete_refetches_listing() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    let id = Uuid::new_v4();

    mock_empty_tables(&server, 2).await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/saved_correspondences"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": id }])))
        .expect(1)
        .mount(&server)
        .await;

    let config = common::test_config(&server);
    let token = common::create_test_jwt(user_id, "prof@ecole.fr", &config.jwt_secret);
    let (app, _) = common::create_test_app(config);

    let response = app
        .clone()
        .oneshot(common::authed_request("GET", "/api/content", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "DELETE",
            &format!("/api/content/correspondence/{}", id),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(common::authed_request("GET", "/api/content", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_backend_rejection_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "message": "column \"titel\" does not exist" })),
        )
        // One call per table at most; a retry would go beyond that
        .expect(1..=5)
        .mount(&server)
        .await;

    let config = common::test_config(&server);
    let token = common::create_test_jwt(Uuid::new_v4(), "prof@ecole.fr", &config.jwt_secret);
    let (app, _) = common::create_test_app(config);

    let response = app
        .oneshot(common::authed_request("GET", "/api/content", &token, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "BACKEND_ERROR");
    // Database details stay in the logs
    assert!(!body["message"].as_str().unwrap().contains("titel"));
}

#[tokio::test]
async fn test_save_during_slow_listing_is_not_lost() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    let new_id = Uuid::new_v4();

    // First listing sees no exercises and answers late; later listings see the save
    Mock::given(method("GET"))
        .and(path("/rest/v1/saved_exercises"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])).set_delay(SLOW))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    common::mock_select(
        &server,
        "saved_exercises",
        json!([exercise_row(new_id, user_id)]),
        1,
    )
    .await;
    for table in &common::CONTENT_TABLES[1..] {
        common::mock_select(&server, table, json!([]), 2).await;
    }
    Mock::given(method("POST"))
        .and(path("/rest/v1/saved_exercises"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!([exercise_row(new_id, user_id)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = common::test_config(&server);
    let token = common::create_test_jwt(user_id, "prof@ecole.fr", &config.jwt_secret);
    let (app, _) = common::create_test_app(config);

    let slow_listing = tokio::spawn(
        app.clone()
            .oneshot(common::authed_request("GET", "/api/content", &token, None)),
    );
    tokio::time::sleep(SLOW / 4).await;

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/content/exercise",
            &token,
            Some(json!({ "title": "Les fractions", "content": "1. Calcule 1/2 + 1/4" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = slow_listing.await.unwrap().unwrap();
    assert_eq!(common::body_json(response).await["total"], 0);

    let response = app
        .oneshot(common::authed_request("GET", "/api/content", &token, None))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["id"], new_id.to_string());
}

#[tokio::test]
async fn test_concurrent_listing_without_cache_is_in_progress() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])).set_delay(SLOW))
        .expect(5)
        .mount(&server)
        .await;

    let config = common::test_config(&server);
    let token = common::create_test_jwt(Uuid::new_v4(), "prof@ecole.fr", &config.jwt_secret);
    let (app, _) = common::create_test_app(config);

    let first = tokio::spawn(
        app.clone()
            .oneshot(common::authed_request("GET", "/api/content", &token, None)),
    );
    tokio::time::sleep(SLOW / 4).await;

    let response = app
        .oneshot(common::authed_request("GET", "/api/content", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "REQUEST_IN_PROGRESS");

    let response = first.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_concurrent_listing_gets_stale_list() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    let id = Uuid::new_v4();

    // Fast first fetch fills the cache, the refresh is held open
    Mock::given(method("GET"))
        .and(path("/rest/v1/saved_exercises"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([exercise_row(id, user_id)])))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/saved_exercises"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])).set_delay(SLOW))
        .expect(1)
        .mount(&server)
        .await;
    for table in &common::CONTENT_TABLES[1..] {
        common::mock_select(&server, table, json!([]), 2).await;
    }

    let mut config = common::test_config(&server);
    config.content_cache_ttl = Duration::ZERO;
    let token = common::create_test_jwt(user_id, "prof@ecole.fr", &config.jwt_secret);
    let (app, _) = common::create_test_app(config);

    let list = || common::authed_request("GET", "/api/content", &token, None);

    let response = app.clone().oneshot(list()).await.unwrap();
    assert_eq!(common::body_json(response).await["total"], 1);

    let refresh = tokio::spawn(app.clone().oneshot(list()));
    tokio::time::sleep(SLOW / 4).await;

    let response = app.clone().oneshot(list()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["id"], id.to_string());

    let response = refresh.await.unwrap().unwrap();
    assert_eq!(common::body_json(response).await["total"], 0);
}

#[tokio::test]
async fn test_double_submitted_save_is_rejected() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/saved_exercises"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([exercise_row(Uuid::new_v4(), user_id)]))
                .set_delay(SLOW),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = common::test_config(&server);
    let token = common::create_test_jwt(user_id, "prof@ecole.fr", &config.jwt_secret);
    let (app, _) = common::create_test_app(config);

    let save = || {
        common::authed_request(
            "POST",
            "/api/content/exercise",
            &token,
            Some(json!({ "title": "Les fractions", "content": "1. Calcule 1/2 + 1/4" })),
        )
    };

    let first = tokio::spawn(app.clone().oneshot(save()));
    tokio::time::sleep(SLOW / 4).await;

    let response = app.clone().oneshot(save()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "REQUEST_IN_PROGRESS");

    let response = first.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_malformed_body_gets_json_error() {
    let (app, state) = common::create_offline_app();
    let token = common::create_test_jwt(Uuid::new_v4(), "prof@ecole.fr", &state.config.jwt_secret);

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/content/exercise")
        .header(axum::http::header::AUTHORIZATION, format!("Bearer {}", token))
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "REQUEST_ERROR");
}
