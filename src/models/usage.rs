// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Monthly image-generation usage counters.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// Counter columns of an `image_generation_usage` row.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageCounter {
    pub id: Uuid,
    pub monthly_generation_count: Option<i64>,
    pub generation_month: Option<String>,
}

/// Outcome of consuming one image generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct QuotaStatus {
    pub used: i64,
    pub limit: i64,
    pub remaining: i64,
    pub generation_month: String,
}
