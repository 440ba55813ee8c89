// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscription rows and the access status derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionType {
    Beta,
    Trial,
    Paid,
    Ambassador,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    PastDue,
    Trialing,
    Incomplete,
    IncompleteExpired,
    Unpaid,
}

/// Row in the `user_subscriptions` table (one per user).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSubscription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub subscription_type: SubscriptionType,
    pub status: SubscriptionStatus,
    /// ISO 8601
    pub expires_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_subscription_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_variant: Option<String>,
}

/// Where an access decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum AccessSource {
    SpecialAccess,
    Subscription,
    None,
}

/// Access status returned to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AccessStatus {
    pub is_active: bool,
    #[serde(rename = "type")]
    pub subscription_type: Option<SubscriptionType>,
    pub expires_at: Option<String>,
    pub days_left: i64,
    pub source: AccessSource,
}

impl AccessStatus {
    /// No subscription row and no special access.
    pub fn none() -> Self {
        Self {
            is_active: false,
            subscription_type: None,
            expires_at: None,
            days_left: 0,
            source: AccessSource::None,
        }
    }

    /// Beta access granted by email allow-list.
    pub fn special_access() -> Self {
        Self {
            is_active: true,
            subscription_type: Some(SubscriptionType::Beta),
            expires_at: None,
            days_left: 0,
            source: AccessSource::SpecialAccess,
        }
    }

    /// Active iff status is `active` and the expiry is in the future.
    /// `days_left` rounds partial days up and never goes negative.
    pub fn from_subscription(sub: &UserSubscription, now: DateTime<Utc>) -> Self {
        let expires_at = DateTime::parse_from_rfc3339(&sub.expires_at)
            .map(|dt| dt.with_timezone(&Utc))
            .ok();

        let (is_active, days_left) = match expires_at {
            Some(expires_at) => {
                let remaining = (expires_at - now).num_seconds();
                let days = if remaining > 0 {
                    (remaining + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
                } else {
                    0
                };
                (
                    sub.status == SubscriptionStatus::Active && expires_at > now,
                    days,
                )
            }
            None => {
                tracing::warn!(
                    user_id = %sub.user_id,
                    expires_at = %sub.expires_at,
                    "Unparseable subscription expiry, treating as expired"
                );
                (false, 0)
            }
        };

        Self {
            is_active,
            subscription_type: Some(sub.subscription_type),
            expires_at: Some(sub.expires_at.clone()),
            days_left,
            source: AccessSource::Subscription,
        }
    }
}
