// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! PedagoIA: content tools for teachers.
//!
//! This crate provides the backend API in front of the Supabase project:
//! saved content, subscription access, image quotas, chat history,
//! feedback and admin tools. BaaS calls are wrapped in retry, TTL caching
//! and single-flight guards.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod retry;
pub mod routes;
pub mod services;
pub mod single_flight;
pub mod time_utils;

use config::Config;
use db::SupabaseDb;
use services::{
    ContentService, ConversationService, ImageQuotaService, RoleService, SubscriptionService,
    SuggestionService,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: SupabaseDb,
    pub content_service: ContentService,
    pub subscription_service: SubscriptionService,
    pub quota_service: ImageQuotaService,
    pub role_service: RoleService,
    pub conversation_service: ConversationService,
    pub suggestion_service: SuggestionService,
}

impl AppState {
    /// Wire every service to the same database client.
    pub fn new(config: Config, db: SupabaseDb) -> Self {
        Self {
            content_service: ContentService::new(db.clone(), config.content_cache_ttl),
            subscription_service: SubscriptionService::new(
                db.clone(),
                config.subscription_cache_ttl,
                config.special_access_emails.clone(),
                config.special_access_domains.clone(),
            ),
            quota_service: ImageQuotaService::new(db.clone(), config.image_monthly_limit),
            role_service: RoleService::new(db.clone(), config.subscription_cache_ttl),
            conversation_service: ConversationService::new(db.clone()),
            suggestion_service: SuggestionService::new(db.clone()),
            db,
            config,
        }
    }
}
