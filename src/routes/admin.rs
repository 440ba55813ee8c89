// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin-only routes. `require_admin` is applied in routes/mod.rs.

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{BugReport, BugReportStatus, Suggestion, SubscriptionType, UserSubscription};
use crate::routes::{parse_id, JsonBody};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

const SUGGESTION_STATUSES: &[&str] = &["pending", "planned", "in_progress", "done", "rejected"];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/bug-reports", get(list_bug_reports))
        .route(
            "/api/admin/bug-reports/{id}/status",
            put(set_bug_report_status),
        )
        .route(
            "/api/admin/suggestions/{id}/status",
            put(set_suggestion_status),
        )
        .route("/api/admin/subscriptions", post(grant_subscription))
}

async fn list_bug_reports(State(state): State<Arc<AppState>>) -> Result<Json<Vec<BugReport>>> {
    Ok(Json(state.db.list_bug_reports().await?))
}

#[derive(Deserialize)]
pub struct BugReportStatusRequest {
    pub status: BugReportStatus,
}

async fn set_bug_report_status(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<BugReportStatusRequest>,
) -> Result<Json<BugReport>> {
    let id = parse_id(&id)?;
    let report = state
        .db
        .set_bug_report_status(id, request.status)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bug report {}", id)))?;

    tracing::info!(
        admin_id = %admin.user_id,
        report_id = %id,
        status = ?request.status,
        "Bug report status changed"
    );
    Ok(Json(report))
}

#[derive(Deserialize)]
pub struct SuggestionStatusRequest {
    pub status: String,
}

async fn set_suggestion_status(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<SuggestionStatusRequest>,
) -> Result<Json<Suggestion>> {
    let id = parse_id(&id)?;
    if !SUGGESTION_STATUSES.contains(&request.status.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unknown suggestion status: {}",
            request.status
        )));
    }

    let suggestion = state
        .suggestion_service
        .set_status(id, &request.status)
        .await?;

    tracing::info!(
        admin_id = %admin.user_id,
        suggestion_id = %id,
        status = %request.status,
        "Suggestion status changed"
    );
    Ok(Json(suggestion))
}

#[derive(Deserialize)]
pub struct GrantSubscriptionRequest {
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub subscription_type: SubscriptionType,
    pub duration_days: u32,
}

/// Manually activate a subscription (e.g. after a failed payment webhook).
async fn grant_subscription(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    JsonBody(request): JsonBody<GrantSubscriptionRequest>,
) -> Result<Json<UserSubscription>> {
    tracing::info!(
        admin_id = %admin.user_id,
        user_id = %request.user_id,
        "Admin subscription grant"
    );
    let subscription = state
        .subscription_service
        .grant_manual(
            request.user_id,
            request.subscription_type,
            request.duration_days,
        )
        .await?;
    Ok(Json(subscription))
}
