// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Supabase PostgREST).

pub mod supabase;

pub use supabase::{Query, SupabaseDb};

/// Table names as constants.
pub mod tables {
    pub const PROFILES: &str = "profiles";
    pub const USER_ROLES: &str = "user_roles";
    pub const USER_SUBSCRIPTIONS: &str = "user_subscriptions";
    pub const SAVED_EXERCISES: &str = "saved_exercises";
    pub const SAVED_LESSON_PLANS: &str = "saved_lesson_plans";
    pub const SAVED_CORRESPONDENCES: &str = "saved_correspondences";
    pub const SAVED_MUSIC_LESSONS: &str = "saved_music_lessons";
    /// Generated images and the monthly quota counter share this table
    pub const IMAGE_GENERATION_USAGE: &str = "image_generation_usage";
    pub const CHATS: &str = "chats";
    pub const BUG_REPORTS: &str = "bug_reports";
    pub const SUGGESTIONS: &str = "suggestions";
    pub const SUGGESTION_VOTES: &str = "suggestion_votes";
}
