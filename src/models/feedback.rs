// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bug reports and feature suggestions submitted by teachers.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;
use validator::Validate;

// ─── Bug Reports ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum BugReportStatus {
    New,
    InProgress,
    Resolved,
}

/// Row in the `bug_reports` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BugReport {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub description: String,
    pub url: Option<String>,
    /// Free-form JSON captured by the browser (user agent, viewport, ...)
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub browser_info: Option<serde_json::Value>,
    pub screenshot_url: Option<String>,
    pub status: BugReportStatus,
    pub created_at: String,
}

/// Bug report submission from the widget.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewBugReport {
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[validate(length(max = 2048))]
    pub url: Option<String>,
    pub browser_info: Option<serde_json::Value>,
    #[validate(url)]
    pub screenshot_url: Option<String>,
}

// ─── Suggestions ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Up,
    Down,
}

impl VoteType {
    /// Contribution of one vote of this type to a suggestion's tally.
    pub fn weight(&self) -> i64 {
        match self {
            VoteType::Up => 1,
            VoteType::Down => -1,
        }
    }
}

/// Row in the `suggestions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Suggestion {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub author: String,
    pub author_id: Option<Uuid>,
    /// "pending", "planned", "in_progress", "done", ...
    pub status: String,
    pub votes: i64,
    pub created_at: Option<String>,
}

/// Row in the `suggestion_votes` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionVote {
    pub suggestion_id: Uuid,
    pub user_id: Uuid,
    pub vote_type: VoteType,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewSuggestion {
    #[validate(length(min = 3, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
}
