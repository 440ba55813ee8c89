// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Saved content service: listing, saving and deleting teacher resources.
//!
//! Listing merges the five content tables into one newest-first list per
//! user. The merged list is cached for the configured TTL and dropped on
//! every save or delete. Concurrent listings for the same user share one
//! backend round: while a fetch is in flight, other callers get the last
//! known list, or `REQUEST_IN_PROGRESS` if there is none yet.

use crate::cache::TtlCache;
use crate::db::SupabaseDb;
use crate::error::AppError;
use crate::models::{ContentKind, SaveContentRequest, SavedContent};
use crate::single_flight::SingleFlight;
use crate::time_utils::{format_utc_rfc3339, generation_month};
use futures_util::future::try_join_all;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

type ContentList = Arc<Vec<SavedContent>>;

#[derive(Clone)]
pub struct ContentService {
    db: SupabaseDb,
    cache: Arc<TtlCache<Uuid, ContentList>>,
    fetches: SingleFlight<Uuid>,
    saves: SingleFlight<(Uuid, ContentKind)>,
}

impl ContentService {
    pub fn new(db: SupabaseDb, cache_ttl: Duration) -> Self {
        Self {
            db,
            cache: Arc::new(TtlCache::new(cache_ttl)),
            fetches: SingleFlight::new(),
            saves: SingleFlight::new(),
        }
    }

    /// All saved content for a user, newest first.
    pub async fn list_all(&self, user_id: Uuid) -> Result<ContentList, AppError> {
        if let Some(list) = self.cache.get(&user_id) {
            tracing::debug!(user_id = %user_id, count = list.len(), "Saved content cache hit");
            return Ok(list);
        }

        let Some(_flight) = self.fetches.try_begin(user_id) else {
            return self
                .cache
                .get_stale(&user_id)
                .ok_or(AppError::RequestInProgress);
        };

        self.cache
            .get_or_fetch(user_id, || self.fetch_all(user_id))
            .await
    }

    /// Saved content of one kind, newest first.
    pub async fn list(
        &self,
        user_id: Uuid,
        kind: ContentKind,
    ) -> Result<Vec<SavedContent>, AppError> {
        let all = self.list_all(user_id).await?;
        Ok(all.iter().filter(|c| c.kind == kind).cloned().collect())
    }

    /// Validate and store a new item, then drop the user's cached listing.
    pub async fn save(
        &self,
        user_id: Uuid,
        kind: ContentKind,
        request: SaveContentRequest,
    ) -> Result<SavedContent, AppError> {
        let row = build_row(user_id, kind, request.fields)?;

        let Some(_flight) = self.saves.try_begin((user_id, kind)) else {
            tracing::info!(user_id = %user_id, kind = %kind, "Duplicate save rejected");
            return Err(AppError::RequestInProgress);
        };

        let stored = self.db.insert_content_row(kind, &row).await?;
        self.cache.invalidate(&user_id);

        let saved = SavedContent::from_row(kind, stored)?;
        tracing::info!(user_id = %user_id, kind = %kind, id = %saved.id, "Content saved");
        Ok(saved)
    }

    /// Delete one item owned by the user.
    pub async fn delete(&self, user_id: Uuid, kind: ContentKind, id: Uuid) -> Result<(), AppError> {
        let deleted = self.db.delete_content_row(kind, user_id, id).await?;
        if !deleted {
            return Err(AppError::NotFound(format!("{} {}", kind, id)));
        }

        self.cache.invalidate(&user_id);
        tracing::info!(user_id = %user_id, kind = %kind, id = %id, "Content deleted");
        Ok(())
    }

    async fn fetch_all(&self, user_id: Uuid) -> Result<ContentList, AppError> {
        let per_kind = try_join_all(ContentKind::ALL.into_iter().map(|kind| async move {
            let rows = self.db.list_content_rows(kind, user_id).await?;
            rows.into_iter()
                .map(|row| SavedContent::from_row(kind, row))
                .collect::<Result<Vec<_>, AppError>>()
        }))
        .await?;

        let mut all: Vec<SavedContent> = per_kind.into_iter().flatten().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        tracing::debug!(user_id = %user_id, count = all.len(), "Saved content fetched");
        Ok(Arc::new(all))
    }
}

/// Turn a save request into a table row for `kind`.
///
/// Required fields must be non-blank strings; unknown columns are refused so
/// clients cannot write `user_id` or status columns.
fn build_row(
    user_id: Uuid,
    kind: ContentKind,
    fields: Map<String, Value>,
) -> Result<Map<String, Value>, AppError> {
    let missing: Vec<String> = kind
        .required_fields()
        .iter()
        .filter(|name| {
            !fields
                .get(**name)
                .and_then(Value::as_str)
                .is_some_and(|v| !v.trim().is_empty())
        })
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AppError::MissingFields(missing));
    }

    let writable = kind.writable_columns();
    if let Some(unknown) = fields.keys().find(|k| !writable.contains(&k.as_str())) {
        return Err(AppError::BadRequest(format!(
            "Field '{}' cannot be set on {}",
            unknown, kind
        )));
    }

    let mut row = fields;
    row.insert("user_id".to_string(), Value::String(user_id.to_string()));

    if kind == ContentKind::Image {
        let now = chrono::Utc::now();
        let has_url = row
            .get("image_url")
            .and_then(Value::as_str)
            .is_some_and(|url| !url.is_empty());
        row.insert(
            "status".to_string(),
            Value::from(if has_url { "success" } else { "pending" }),
        );
        row.insert("generated_at".to_string(), Value::from(format_utc_rfc3339(now)));
        row.insert("generation_month".to_string(), Value::from(generation_month(now)));
        row.insert("retry_count".to_string(), Value::from(0));
        row.insert("monthly_generation_count".to_string(), Value::from(0));
    }

    Ok(row)
}
