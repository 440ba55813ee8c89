// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Monthly image-generation quota.
//!
//! Each user has one counter row per generation month. The first
//! generation of a month creates it at 1; later ones increment it until the
//! limit is reached. Overlapping requests from the same user are refused so
//! a double click cannot read the same count twice.

use crate::db::SupabaseDb;
use crate::error::AppError;
use crate::models::QuotaStatus;
use crate::single_flight::SingleFlight;
use crate::time_utils::generation_month;
use uuid::Uuid;

#[derive(Clone)]
pub struct ImageQuotaService {
    db: SupabaseDb,
    monthly_limit: i64,
    flights: SingleFlight<Uuid>,
}

impl ImageQuotaService {
    pub fn new(db: SupabaseDb, monthly_limit: u32) -> Self {
        Self {
            db,
            monthly_limit: i64::from(monthly_limit),
            flights: SingleFlight::new(),
        }
    }

    /// Record one image generation, or fail with `RATE_LIMIT_EXCEEDED`.
    pub async fn consume(&self, user_id: Uuid) -> Result<QuotaStatus, AppError> {
        let Some(_flight) = self.flights.try_begin(user_id) else {
            return Err(AppError::RequestInProgress);
        };

        let month = generation_month(chrono::Utc::now());

        let used = match self.db.get_usage_counter(user_id, &month).await? {
            None => {
                self.db.create_usage_counter(user_id, &month).await?;
                1
            }
            Some(counter) => {
                let current = counter.monthly_generation_count.unwrap_or(0);
                if current >= self.monthly_limit {
                    tracing::info!(
                        user_id = %user_id,
                        used = current,
                        limit = self.monthly_limit,
                        "Image quota exhausted"
                    );
                    return Err(AppError::RateLimited(format!(
                        "{} image generations per month",
                        self.monthly_limit
                    )));
                }
                self.db.set_usage_count(counter.id, current + 1).await?;
                current + 1
            }
        };

        tracing::debug!(user_id = %user_id, used, month = %month, "Image generation counted");

        Ok(QuotaStatus {
            used,
            limit: self.monthly_limit,
            remaining: self.monthly_limit.saturating_sub(used),
            generation_month: month,
        })
    }
}
