// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chat assistant messages and the conversations they form.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Like,
    Dislike,
}

/// Row in the `chats` table. One row per message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChatMessage {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub user_id: Uuid,
    pub message: String,
    /// "user" or "assistant"
    pub message_type: Option<String>,
    pub conversation_id: Option<String>,
    pub conversation_title: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub feedback_type: Option<FeedbackType>,
    /// Soft-delete marker
    #[serde(default)]
    pub deleted_at: Option<String>,
}

/// A conversation as shown in the sidebar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub last_message_at: String,
}
