// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Feature suggestions and up/down voting.

use crate::db::SupabaseDb;
use crate::error::AppError;
use crate::models::{NewSuggestion, Suggestion, SuggestionVote, VoteType};
use crate::single_flight::SingleFlight;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

const DEFAULT_AUTHOR: &str = "Anonyme";

/// What a vote request does to the user's existing vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChange {
    /// First vote on this suggestion
    Cast(VoteType),
    /// Same vote again: the vote is withdrawn
    Withdraw(VoteType),
    /// Opposite vote: the vote flips
    Switch(VoteType),
}

impl VoteChange {
    pub fn decide(current: Option<VoteType>, requested: VoteType) -> Self {
        match current {
            None => VoteChange::Cast(requested),
            Some(existing) if existing == requested => VoteChange::Withdraw(requested),
            Some(_) => VoteChange::Switch(requested),
        }
    }

    /// Change to apply to the suggestion's vote tally.
    pub fn delta(&self) -> i64 {
        match self {
            VoteChange::Cast(v) => v.weight(),
            VoteChange::Withdraw(v) => -v.weight(),
            VoteChange::Switch(v) => 2 * v.weight(),
        }
    }

    /// The user's vote after the change.
    pub fn resulting_vote(&self) -> Option<VoteType> {
        match self {
            VoteChange::Cast(v) | VoteChange::Switch(v) => Some(*v),
            VoteChange::Withdraw(_) => None,
        }
    }
}

/// Result of a vote as returned to the frontend.
#[derive(Debug, Clone, Serialize)]
pub struct VoteOutcome {
    pub suggestion_id: Uuid,
    pub votes: i64,
    pub user_vote: Option<VoteType>,
}

#[derive(Clone)]
pub struct SuggestionService {
    db: SupabaseDb,
    votes_in_flight: SingleFlight<(Uuid, Uuid)>,
}

impl SuggestionService {
    pub fn new(db: SupabaseDb) -> Self {
        Self {
            db,
            votes_in_flight: SingleFlight::new(),
        }
    }

    pub async fn list(&self) -> Result<Vec<Suggestion>, AppError> {
        self.db.list_suggestions().await
    }

    /// The user's votes keyed by suggestion.
    pub async fn user_votes(&self, user_id: Uuid) -> Result<HashMap<Uuid, VoteType>, AppError> {
        let votes = self.db.list_votes_for_user(user_id).await?;
        Ok(votes
            .into_iter()
            .map(|v| (v.suggestion_id, v.vote_type))
            .collect())
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        suggestion: NewSuggestion,
    ) -> Result<Suggestion, AppError> {
        let author = self
            .db
            .get_profile(user_id)
            .await?
            .map(|p| p.first_name)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());

        let row = serde_json::json!({
            "title": suggestion.title.trim(),
            "description": suggestion.description.trim(),
            "author": author,
            "author_id": user_id,
            "status": "pending",
            "votes": 0,
        });

        let created = self.db.insert_suggestion(&row).await?;
        tracing::info!(user_id = %user_id, suggestion_id = %created.id, "Suggestion created");
        Ok(created)
    }

    /// Apply an up/down vote with toggle semantics.
    pub async fn vote(
        &self,
        user_id: Uuid,
        suggestion_id: Uuid,
        requested: VoteType,
    ) -> Result<VoteOutcome, AppError> {
        let Some(_flight) = self.votes_in_flight.try_begin((user_id, suggestion_id)) else {
            return Err(AppError::RequestInProgress);
        };

        let suggestion = self
            .db
            .get_suggestion(suggestion_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Suggestion {}", suggestion_id)))?;

        if suggestion.author_id == Some(user_id) {
            return Err(AppError::Forbidden(
                "You cannot vote for your own suggestion".to_string(),
            ));
        }

        let current = self
            .db
            .get_vote(user_id, suggestion_id)
            .await?
            .map(|v| v.vote_type);
        let change = VoteChange::decide(current, requested);

        match change {
            VoteChange::Cast(vote_type) => {
                self.db
                    .insert_vote(&SuggestionVote {
                        suggestion_id,
                        user_id,
                        vote_type,
                    })
                    .await?
            }
            VoteChange::Withdraw(_) => self.db.delete_vote(user_id, suggestion_id).await?,
            VoteChange::Switch(vote_type) => {
                self.db
                    .change_vote(user_id, suggestion_id, vote_type)
                    .await?
            }
        }

        let votes = suggestion.votes + change.delta();
        self.db
            .update_suggestion(suggestion_id, &serde_json::json!({ "votes": votes }))
            .await?;

        tracing::info!(
            user_id = %user_id,
            suggestion_id = %suggestion_id,
            change = ?change,
            votes,
            "Vote recorded"
        );

        Ok(VoteOutcome {
            suggestion_id,
            votes,
            user_vote: change.resulting_vote(),
        })
    }

    pub async fn set_status(
        &self,
        suggestion_id: Uuid,
        status: &str,
    ) -> Result<Suggestion, AppError> {
        self.db
            .update_suggestion(suggestion_id, &serde_json::json!({ "status": status }))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Suggestion {}", suggestion_id)))
    }
}
