// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bug report and suggestion routes.

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{BugReport, NewBugReport, NewSuggestion, Suggestion, VoteType};
use crate::routes::{parse_id, JsonBody};
use crate::services::VoteOutcome;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/bug-reports", post(submit_bug_report))
        .route(
            "/api/suggestions",
            get(list_suggestions).post(create_suggestion),
        )
        .route("/api/suggestions/{id}/vote", post(vote))
}

// ─── Bug Reports ─────────────────────────────────────────────

async fn submit_bug_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    JsonBody(report): JsonBody<NewBugReport>,
) -> Result<(StatusCode, Json<BugReport>)> {
    report.validate()?;

    let row = serde_json::json!({
        "user_id": user.user_id,
        "description": report.description.trim(),
        "url": report.url,
        "browser_info": report.browser_info,
        "screenshot_url": report.screenshot_url,
        "status": "new",
    });
    let stored = state.db.insert_bug_report(&row).await?;

    tracing::info!(user_id = %user.user_id, report_id = %stored.id, "Bug report submitted");
    Ok((StatusCode::CREATED, Json(stored)))
}

// ─── Suggestions ─────────────────────────────────────────────

/// A suggestion plus the caller's own vote on it.
#[derive(Serialize)]
pub struct SuggestionView {
    #[serde(flatten)]
    pub suggestion: Suggestion,
    pub user_vote: Option<VoteType>,
}

async fn list_suggestions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<SuggestionView>>> {
    let (suggestions, votes) = tokio::try_join!(
        state.suggestion_service.list(),
        state.suggestion_service.user_votes(user.user_id),
    )?;

    let views = suggestions
        .into_iter()
        .map(|suggestion| SuggestionView {
            user_vote: votes.get(&suggestion.id).copied(),
            suggestion,
        })
        .collect();
    Ok(Json(views))
}

async fn create_suggestion(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    JsonBody(suggestion): JsonBody<NewSuggestion>,
) -> Result<(StatusCode, Json<Suggestion>)> {
    suggestion.validate()?;
    let created = state
        .suggestion_service
        .create(user.user_id, suggestion)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Deserialize)]
pub struct VoteRequest {
    pub vote_type: VoteType,
}

async fn vote(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<VoteRequest>,
) -> Result<Json<VoteOutcome>> {
    let suggestion_id = parse_id(&id)?;
    let outcome = state
        .suggestion_service
        .vote(user.user_id, suggestion_id, request.vote_type)
        .await?;
    Ok(Json(outcome))
}
