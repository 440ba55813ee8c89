// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Saved content routes.

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{ContentKind, SaveContentRequest, SavedContent};
use crate::routes::{parse_id, JsonBody};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/content", get(list_all_content))
        .route(
            "/api/content/{kind}",
            get(list_content).post(save_content),
        )
        .route("/api/content/{kind}/{id}", delete(delete_content))
}

/// Saved content listing.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ContentListResponse {
    pub items: Vec<SavedContent>,
    pub total: usize,
}

impl From<Vec<SavedContent>> for ContentListResponse {
    fn from(items: Vec<SavedContent>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}

async fn list_all_content(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ContentListResponse>> {
    let all = state.content_service.list_all(user.user_id).await?;
    Ok(Json(all.as_ref().clone().into()))
}

async fn list_content(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(kind): Path<String>,
) -> Result<Json<ContentListResponse>> {
    let kind: ContentKind = kind.parse()?;
    let items = state.content_service.list(user.user_id, kind).await?;
    Ok(Json(items.into()))
}

async fn save_content(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(kind): Path<String>,
    JsonBody(request): JsonBody<SaveContentRequest>,
) -> Result<(StatusCode, Json<SavedContent>)> {
    let kind: ContentKind = kind.parse()?;
    let saved = state
        .content_service
        .save(user.user_id, kind, request)
        .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn delete_content(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<StatusCode> {
    let kind: ContentKind = kind.parse()?;
    let id = parse_id(&id)?;
    state.content_service.delete(user.user_id, kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
