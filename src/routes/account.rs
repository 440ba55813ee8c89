// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-in user: profile, subscription access and image quota.

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{AccessStatus, QuotaStatus};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Account routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/subscription", get(get_subscription))
        .route("/api/usage/images", post(consume_image_generation))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: String,
    pub email: Option<String>,
    /// Empty until the onboarding form is filled in
    pub first_name: Option<String>,
    pub is_admin: bool,
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let (profile, is_admin) = tokio::try_join!(
        state.db.get_profile(user.user_id),
        state.role_service.is_admin(user.user_id),
    )?;

    Ok(Json(UserResponse {
        id: user.user_id.to_string(),
        email: user.email,
        first_name: profile.map(|p| p.first_name),
        is_admin,
    }))
}

// ─── Subscription ────────────────────────────────────────────

async fn get_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AccessStatus>> {
    let status = state
        .subscription_service
        .check_access(user.user_id, user.email.as_deref())
        .await?;
    Ok(Json(status))
}

// ─── Image Quota ─────────────────────────────────────────────

/// Count one image generation against the monthly quota.
async fn consume_image_generation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<QuotaStatus>> {
    let status = state.quota_service.consume(user.user_id).await?;
    Ok(Json(status))
}
