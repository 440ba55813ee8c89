// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chat assistant conversation history.
//!
//! Messages are stored one row per message; a conversation is the set of
//! rows sharing a `conversation_id`. Deleting a conversation only stamps
//! `deleted_at`, and every read filters those rows out.

use crate::db::SupabaseDb;
use crate::error::AppError;
use crate::models::{ChatMessage, Conversation, FeedbackType};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Clone)]
pub struct ConversationService {
    db: SupabaseDb,
}

impl ConversationService {
    pub fn new(db: SupabaseDb) -> Self {
        Self { db }
    }

    /// Conversations with a title, most recently active first.
    pub async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<Conversation>, AppError> {
        let rows = self.db.list_conversation_heads(user_id).await?;
        Ok(group_conversations(rows))
    }

    pub async fn messages(
        &self,
        user_id: Uuid,
        conversation_id: &str,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let messages = self.db.list_messages(user_id, conversation_id).await?;
        if messages.is_empty() {
            return Err(AppError::NotFound(format!(
                "Conversation {}",
                conversation_id
            )));
        }
        Ok(messages)
    }

    pub async fn delete_conversation(
        &self,
        user_id: Uuid,
        conversation_id: &str,
    ) -> Result<usize, AppError> {
        let deleted = self
            .db
            .soft_delete_conversation(user_id, conversation_id)
            .await?;
        if deleted == 0 {
            return Err(AppError::NotFound(format!(
                "Conversation {}",
                conversation_id
            )));
        }

        tracing::info!(
            user_id = %user_id,
            conversation_id,
            messages = deleted,
            "Conversation deleted"
        );
        Ok(deleted)
    }

    pub async fn set_feedback(
        &self,
        user_id: Uuid,
        message_id: i64,
        feedback: FeedbackType,
    ) -> Result<(), AppError> {
        if !self
            .db
            .set_message_feedback(user_id, message_id, feedback)
            .await?
        {
            return Err(AppError::NotFound(format!("Message {}", message_id)));
        }
        Ok(())
    }
}

/// Collapse newest-first message rows into one entry per conversation.
///
/// The first row seen for an ID fixes its position; rows without a title
/// are skipped until a titled row for the same conversation appears.
fn group_conversations(rows: Vec<ChatMessage>) -> Vec<Conversation> {
    let mut seen = HashSet::new();
    let mut conversations = Vec::new();

    for row in rows {
        let (Some(id), Some(title)) = (row.conversation_id, row.conversation_title) else {
            continue;
        };
        if title.trim().is_empty() || !seen.insert(id.clone()) {
            continue;
        }
        conversations.push(Conversation {
            id,
            title,
            last_message_at: row.created_at,
        });
    }

    conversations
}
