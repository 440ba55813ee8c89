// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chat assistant history routes.

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{ChatMessage, Conversation, FeedbackType};
use crate::routes::JsonBody;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/conversations", get(list_conversations))
        .route("/api/conversations/{id}/messages", get(get_messages))
        .route("/api/conversations/{id}", delete(delete_conversation))
        .route("/api/messages/{id}/feedback", put(set_feedback))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteConversationResponse {
    pub success: bool,
    pub deleted_messages: usize,
}

#[derive(Deserialize)]
pub struct FeedbackRequest {
    pub feedback_type: FeedbackType,
}

async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Conversation>>> {
    let conversations = state
        .conversation_service
        .list_conversations(user.user_id)
        .await?;
    Ok(Json(conversations))
}

async fn get_messages(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(conversation_id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>> {
    let messages = state
        .conversation_service
        .messages(user.user_id, &conversation_id)
        .await?;
    Ok(Json(messages))
}

async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(conversation_id): Path<String>,
) -> Result<Json<DeleteConversationResponse>> {
    let deleted = state
        .conversation_service
        .delete_conversation(user.user_id, &conversation_id)
        .await?;
    Ok(Json(DeleteConversationResponse {
        success: true,
        deleted_messages: deleted,
    }))
}

async fn set_feedback(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(message_id): Path<String>,
    JsonBody(request): JsonBody<FeedbackRequest>,
) -> Result<StatusCode> {
    let message_id: i64 = message_id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid message id: {}", message_id)))?;
    state
        .conversation_service
        .set_feedback(user.user_id, message_id, request.feedback_type)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
