// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod content;
pub mod conversation;
pub mod quota;
pub mod roles;
pub mod subscription;
pub mod suggestion;

pub use content::ContentService;
pub use conversation::ConversationService;
pub use quota::ImageQuotaService;
pub use roles::RoleService;
pub use subscription::SubscriptionService;
pub use suggestion::{SuggestionService, VoteChange, VoteOutcome};
