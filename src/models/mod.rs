// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod chat;
pub mod content;
pub mod feedback;
pub mod profile;
pub mod subscription;
pub mod usage;

pub use chat::{ChatMessage, Conversation, FeedbackType};
pub use content::{ContentKind, SaveContentRequest, SavedContent};
pub use feedback::{
    BugReport, BugReportStatus, NewBugReport, NewSuggestion, Suggestion, SuggestionVote, VoteType,
};
pub use profile::{AppRole, Profile, UserRole};
pub use subscription::{
    AccessSource, AccessStatus, SubscriptionStatus, SubscriptionType, UserSubscription,
};
pub use usage::{QuotaStatus, UsageCounter};
