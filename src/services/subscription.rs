// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscription access checks.
//!
//! Access is decided in order:
//! 1. Special-access emails and domains get beta access without any lookup.
//! 2. Otherwise the `user_subscriptions` row decides (see
//!    [`AccessStatus::from_subscription`]).
//!
//! Computed statuses are cached per user; failed lookups are not.

use crate::cache::TtlCache;
use crate::db::SupabaseDb;
use crate::error::AppError;
use crate::models::{AccessStatus, SubscriptionStatus, SubscriptionType, UserSubscription};
use crate::time_utils::format_utc_rfc3339;
use chrono::{TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Clone)]
pub struct SubscriptionService {
    db: SupabaseDb,
    cache: Arc<TtlCache<Uuid, AccessStatus>>,
    special_emails: Arc<Vec<String>>,
    special_domains: Arc<Vec<String>>,
}

impl SubscriptionService {
    pub fn new(
        db: SupabaseDb,
        cache_ttl: Duration,
        special_emails: Vec<String>,
        special_domains: Vec<String>,
    ) -> Self {
        Self {
            db,
            cache: Arc::new(TtlCache::new(cache_ttl)),
            special_emails: Arc::new(special_emails),
            special_domains: Arc::new(special_domains),
        }
    }

    /// Whether `email` is on the special-access allow-list (case-insensitive).
    pub fn has_special_access(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        if self.special_emails.iter().any(|e| *e == email) {
            return true;
        }
        email
            .rsplit_once('@')
            .is_some_and(|(_, domain)| self.special_domains.iter().any(|d| d == domain))
    }

    /// Current access status for a user.
    pub async fn check_access(
        &self,
        user_id: Uuid,
        email: Option<&str>,
    ) -> Result<AccessStatus, AppError> {
        if email.is_some_and(|e| self.has_special_access(e)) {
            tracing::debug!(user_id = %user_id, "Special access granted");
            return Ok(AccessStatus::special_access());
        }

        self.cache
            .get_or_fetch(user_id, || async {
                let status = match self.db.get_subscription(user_id).await? {
                    Some(sub) => AccessStatus::from_subscription(&sub, Utc::now()),
                    None => AccessStatus::none(),
                };
                tracing::info!(
                    user_id = %user_id,
                    is_active = status.is_active,
                    days_left = status.days_left,
                    "Subscription status computed"
                );
                Ok::<_, AppError>(status)
            })
            .await
    }

    /// Grant an active subscription by hand (admin repair tool).
    pub async fn grant_manual(
        &self,
        user_id: Uuid,
        subscription_type: SubscriptionType,
        duration_days: u32,
    ) -> Result<UserSubscription, AppError> {
        if duration_days == 0 {
            return Err(AppError::BadRequest(
                "duration_days must be at least 1".to_string(),
            ));
        }

        let expires_at = TimeDelta::try_days(i64::from(duration_days))
            .and_then(|duration| Utc::now().checked_add_signed(duration))
            .ok_or_else(|| {
                AppError::BadRequest(format!("duration_days {} is out of range", duration_days))
            })?;
        let subscription = UserSubscription {
            id: None,
            user_id,
            subscription_type,
            status: SubscriptionStatus::Active,
            expires_at: format_utc_rfc3339(expires_at),
            stripe_customer_id: None,
            stripe_subscription_id: None,
            plan_variant: None,
        };

        let stored = self.db.upsert_subscription(&subscription).await?;
        self.cache.invalidate(&user_id);

        tracing::info!(
            user_id = %user_id,
            subscription_type = ?subscription_type,
            duration_days,
            "Manual subscription granted"
        );
        Ok(stored)
    }

    /// Forget a cached status (e.g. after an out-of-band change).
    pub fn invalidate(&self, user_id: Uuid) {
        self.cache.invalidate(&user_id);
    }
}
