// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use pedagoia_api::config::Config;
use pedagoia_api::db::SupabaseDb;
use pedagoia_api::routes::create_router;
use pedagoia_api::AppState;
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Tables merged into the saved-content listing.
#[allow(dead_code)]
pub const CONTENT_TABLES: [&str; 5] = [
    "saved_exercises",
    "saved_lesson_plans",
    "saved_correspondences",
    "saved_music_lessons",
    "image_generation_usage",
];

/// Config pointed at a fake Supabase.
#[allow(dead_code)]
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::test_default();
    config.supabase_url = server.uri();
    config
}

/// Create a test app backed by the fake Supabase.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(config: Config) -> (axum::Router, Arc<AppState>) {
    let db = SupabaseDb::new(&config).expect("Failed to build Supabase client");
    let state = Arc::new(AppState::new(config, db));
    (create_router(state.clone()), state)
}

/// Create a test app with an offline database.
#[allow(dead_code)]
pub fn create_offline_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(
        Config::test_default(),
        SupabaseDb::new_mock(),
    ));
    (create_router(state.clone()), state)
}

/// Sign a Supabase-style access token.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: Uuid, email: &str, secret: &[u8]) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        aud: String,
        email: String,
        exp: usize,
        iat: usize,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        aud: "authenticated".to_string(),
        email: email.to_string(),
        exp: now + 3600,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .unwrap()
}

/// Build an authenticated request with an optional JSON body.
#[allow(dead_code)]
pub fn authed_request(
    http_method: &str,
    uri: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(http_method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Answer `GET /rest/v1/{table}` with `rows`, expecting exactly `times` calls.
#[allow(dead_code)]
pub async fn mock_select(
    server: &MockServer,
    table: &str,
    rows: serde_json::Value,
    times: u64,
) {
    Mock::given(method("GET"))
        .and(path(format!("/rest/v1/{}", table)))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .expect(times)
        .mount(server)
        .await;
}
