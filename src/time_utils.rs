// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Quota bucket for a timestamp: the first day of its month, `YYYY-MM-01`.
pub fn generation_month(date: DateTime<Utc>) -> String {
    format!("{:04}-{:02}-01", date.year(), date.month())
}
