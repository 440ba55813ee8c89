// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Supabase PostgREST client wrapper with typed operations.
//!
//! Every request runs under a fixed timeout. Idempotent requests (GET,
//! PATCH, DELETE) are retried with exponential backoff on transient
//! failures; inserts are sent once.
//!
//! Provides high-level operations for:
//! - Profiles and roles
//! - Subscriptions
//! - Saved content rows (one table per kind)
//! - Image usage counters
//! - Chat messages, bug reports, suggestions and votes

use crate::config::Config;
use crate::db::tables;
use crate::error::AppError;
use crate::models::{
    AppRole, BugReport, BugReportStatus, ChatMessage, ContentKind, FeedbackType, Profile,
    Suggestion, SuggestionVote, UsageCounter, UserRole, UserSubscription, VoteType,
};
use crate::retry::{retry_when, RetryPolicy};
use crate::time_utils::format_utc_rfc3339;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Display;
use std::time::Duration;
use uuid::Uuid;

const PREFER_REPRESENTATION: &str = "return=representation";
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=representation";

// ─── Query Builder ───────────────────────────────────────────

/// PostgREST query: a table plus filter/order/limit parameters.
#[derive(Debug, Clone)]
pub struct Query {
    table: &'static str,
    params: Vec<(String, String)>,
}

impl Query {
    pub fn table(table: &'static str) -> Self {
        Self {
            table,
            params: Vec::new(),
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.params.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn gt(mut self, column: &str, value: impl Display) -> Self {
        self.params.push((column.to_string(), format!("gt.{}", value)));
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.params.push((column.to_string(), "is.null".to_string()));
        self
    }

    pub fn not_null(mut self, column: &str) -> Self {
        self.params
            .push((column.to_string(), "not.is.null".to_string()));
        self
    }

    /// Add a sort key. Repeated calls extend one `order` parameter.
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        let key = format!("{}.{}", column, direction);
        match self.params.iter_mut().find(|(name, _)| name == "order") {
            Some((_, value)) => {
                value.push(',');
                value.push_str(&key);
            }
            None => self.params.push(("order".to_string(), key)),
        }
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    pub fn on_conflict(mut self, columns: &str) -> Self {
        self.params
            .push(("on_conflict".to_string(), columns.to_string()));
        self
    }

    pub fn table_name(&self) -> &'static str {
        self.table
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

// ─── Client ──────────────────────────────────────────────────

#[derive(Clone)]
struct RestClient {
    http: reqwest::Client,
    rest_url: String,
    service_key: String,
    timeout: Duration,
    retry: RetryPolicy,
}

/// Supabase database client.
#[derive(Clone)]
pub struct SupabaseDb {
    client: Option<RestClient>,
}

impl SupabaseDb {
    /// Create a client for the project configured in `config`.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.backend_timeout)
            .build()
            .map_err(|e| AppError::backend(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(url = %config.supabase_url, "Supabase client initialized");

        Ok(Self {
            client: Some(RestClient {
                http,
                rest_url: format!("{}/rest/v1", config.supabase_url),
                service_key: config.supabase_service_key.clone(),
                timeout: config.backend_timeout,
                retry: config.retry,
            }),
        })
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&RestClient, AppError> {
        self.client.as_ref().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Database not connected (offline mode)"))
        })
    }

    // ─── Generic Operations ──────────────────────────────────────

    /// Run a SELECT and deserialize every row.
    pub async fn select<T: DeserializeOwned>(&self, query: Query) -> Result<Vec<T>, AppError> {
        self.get_client()?
            .execute(Method::GET, &query, None, None)
            .await
    }

    /// Run a SELECT limited to one row.
    pub async fn select_one<T: DeserializeOwned>(
        &self,
        query: Query,
    ) -> Result<Option<T>, AppError> {
        let rows: Vec<T> = self.select(query.limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row and return the stored representation.
    pub async fn insert<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &'static str,
        body: &B,
    ) -> Result<T, AppError> {
        let body = to_json(body)?;
        let rows: Vec<T> = self
            .get_client()?
            .execute(
                Method::POST,
                &Query::table(table),
                Some(body),
                Some(PREFER_REPRESENTATION),
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::backend(format!("Insert into {} returned no row", table)))
    }

    /// Insert or merge on the `conflict` columns.
    pub async fn upsert<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &'static str,
        conflict: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let body = to_json(body)?;
        let rows: Vec<T> = self
            .get_client()?
            .execute(
                Method::POST,
                &Query::table(table).on_conflict(conflict),
                Some(body),
                Some(PREFER_UPSERT),
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::backend(format!("Upsert into {} returned no row", table)))
    }

    /// Update matching rows and return them.
    pub async fn update<B: Serialize, T: DeserializeOwned>(
        &self,
        query: Query,
        body: &B,
    ) -> Result<Vec<T>, AppError> {
        let body = to_json(body)?;
        self.get_client()?
            .execute(
                Method::PATCH,
                &query,
                Some(body),
                Some(PREFER_REPRESENTATION),
            )
            .await
    }

    /// Delete matching rows and return how many were removed.
    pub async fn delete(&self, query: Query) -> Result<usize, AppError> {
        let rows: Vec<Value> = self
            .get_client()?
            .execute(Method::DELETE, &query, None, Some(PREFER_REPRESENTATION))
            .await?;
        Ok(rows.len())
    }

    // ─── Profile & Role Operations ───────────────────────────────

    pub async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        self.select_one(Query::table(tables::PROFILES).eq("id", user_id))
            .await
    }

    pub async fn get_role(&self, user_id: Uuid) -> Result<Option<AppRole>, AppError> {
        let row: Option<UserRole> = self
            .select_one(Query::table(tables::USER_ROLES).eq("user_id", user_id))
            .await?;
        Ok(row.and_then(|r| r.role))
    }

    // ─── Subscription Operations ─────────────────────────────────

    pub async fn get_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserSubscription>, AppError> {
        self.select_one(Query::table(tables::USER_SUBSCRIPTIONS).eq("user_id", user_id))
            .await
    }

    /// Create or replace the user's subscription row.
    pub async fn upsert_subscription(
        &self,
        subscription: &UserSubscription,
    ) -> Result<UserSubscription, AppError> {
        self.upsert(tables::USER_SUBSCRIPTIONS, "user_id", subscription)
            .await
    }

    // ─── Saved Content Operations ────────────────────────────────

    /// Raw rows of one content kind for a user, newest first.
    pub async fn list_content_rows(
        &self,
        kind: ContentKind,
        user_id: Uuid,
    ) -> Result<Vec<Map<String, Value>>, AppError> {
        let query = match kind {
            ContentKind::Image => Query::table(kind.table())
                .eq("user_id", user_id)
                .eq("status", "success")
                .order("generated_at", false),
            _ => Query::table(kind.table())
                .eq("user_id", user_id)
                .order("created_at", false),
        };
        self.select(query).await
    }

    pub async fn insert_content_row(
        &self,
        kind: ContentKind,
        row: &Map<String, Value>,
    ) -> Result<Map<String, Value>, AppError> {
        self.insert(kind.table(), row).await
    }

    /// Delete one row owned by `user_id`. Returns false if nothing matched.
    pub async fn delete_content_row(
        &self,
        kind: ContentKind,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<bool, AppError> {
        let deleted = self
            .delete(
                Query::table(kind.table())
                    .eq("id", id)
                    .eq("user_id", user_id),
            )
            .await?;
        Ok(deleted > 0)
    }

    // ─── Image Usage Operations ──────────────────────────────────

    /// The user's quota counter row for a generation month, if any.
    ///
    /// Saved images share the table with a count of 0, so only rows with a
    /// positive count are counters.
    pub async fn get_usage_counter(
        &self,
        user_id: Uuid,
        generation_month: &str,
    ) -> Result<Option<UsageCounter>, AppError> {
        self.select_one(
            Query::table(tables::IMAGE_GENERATION_USAGE)
                .select("id,monthly_generation_count,generation_month")
                .eq("user_id", user_id)
                .eq("generation_month", generation_month)
                .gt("monthly_generation_count", 0)
                .order("monthly_generation_count", false),
        )
        .await
    }

    pub async fn create_usage_counter(
        &self,
        user_id: Uuid,
        generation_month: &str,
    ) -> Result<UsageCounter, AppError> {
        let row = serde_json::json!({
            "user_id": user_id,
            "monthly_generation_count": 1,
            "generation_month": generation_month,
            "prompt": "monthly quota counter",
            "image_url": null,
            "status": "pending",
        });
        self.insert(tables::IMAGE_GENERATION_USAGE, &row).await
    }

    pub async fn set_usage_count(&self, counter_id: Uuid, count: i64) -> Result<(), AppError> {
        let _: Vec<Value> = self
            .update(
                Query::table(tables::IMAGE_GENERATION_USAGE).eq("id", counter_id),
                &serde_json::json!({ "monthly_generation_count": count }),
            )
            .await?;
        Ok(())
    }

    // ─── Chat Operations ─────────────────────────────────────────

    /// Non-deleted messages that belong to a conversation, newest first.
    pub async fn list_conversation_heads(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ChatMessage>, AppError> {
        self.select(
            Query::table(tables::CHATS)
                .eq("user_id", user_id)
                .is_null("deleted_at")
                .not_null("conversation_id")
                .order("created_at", false),
        )
        .await
    }

    pub async fn list_messages(
        &self,
        user_id: Uuid,
        conversation_id: &str,
    ) -> Result<Vec<ChatMessage>, AppError> {
        self.select(
            Query::table(tables::CHATS)
                .eq("user_id", user_id)
                .eq("conversation_id", conversation_id)
                .is_null("deleted_at")
                .order("created_at", true),
        )
        .await
    }

    /// Soft-delete every message of a conversation. Returns rows touched.
    pub async fn soft_delete_conversation(
        &self,
        user_id: Uuid,
        conversation_id: &str,
    ) -> Result<usize, AppError> {
        let now = format_utc_rfc3339(chrono::Utc::now());
        let rows: Vec<Value> = self
            .update(
                Query::table(tables::CHATS)
                    .eq("user_id", user_id)
                    .eq("conversation_id", conversation_id)
                    .is_null("deleted_at"),
                &serde_json::json!({ "deleted_at": now }),
            )
            .await?;
        Ok(rows.len())
    }

    pub async fn set_message_feedback(
        &self,
        user_id: Uuid,
        message_id: i64,
        feedback: FeedbackType,
    ) -> Result<bool, AppError> {
        let rows: Vec<Value> = self
            .update(
                Query::table(tables::CHATS)
                    .eq("id", message_id)
                    .eq("user_id", user_id),
                &serde_json::json!({ "feedback_type": feedback }),
            )
            .await?;
        Ok(!rows.is_empty())
    }

    // ─── Bug Report Operations ───────────────────────────────────

    pub async fn insert_bug_report(&self, row: &Value) -> Result<BugReport, AppError> {
        self.insert(tables::BUG_REPORTS, row).await
    }

    pub async fn list_bug_reports(&self) -> Result<Vec<BugReport>, AppError> {
        self.select(Query::table(tables::BUG_REPORTS).order("created_at", false))
            .await
    }

    pub async fn set_bug_report_status(
        &self,
        id: Uuid,
        status: BugReportStatus,
    ) -> Result<Option<BugReport>, AppError> {
        let rows: Vec<BugReport> = self
            .update(
                Query::table(tables::BUG_REPORTS).eq("id", id),
                &serde_json::json!({
                    "status": status,
                    "updated_at": format_utc_rfc3339(chrono::Utc::now()),
                }),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    // ─── Suggestion Operations ───────────────────────────────────

    pub async fn list_suggestions(&self) -> Result<Vec<Suggestion>, AppError> {
        self.select(
            Query::table(tables::SUGGESTIONS)
                .order("votes", false)
                .order("created_at", false),
        )
        .await
    }

    pub async fn get_suggestion(&self, id: Uuid) -> Result<Option<Suggestion>, AppError> {
        self.select_one(Query::table(tables::SUGGESTIONS).eq("id", id))
            .await
    }

    pub async fn insert_suggestion(&self, row: &Value) -> Result<Suggestion, AppError> {
        self.insert(tables::SUGGESTIONS, row).await
    }

    pub async fn update_suggestion(
        &self,
        id: Uuid,
        changes: &Value,
    ) -> Result<Option<Suggestion>, AppError> {
        let rows: Vec<Suggestion> = self
            .update(Query::table(tables::SUGGESTIONS).eq("id", id), changes)
            .await?;
        Ok(rows.into_iter().next())
    }

    pub async fn get_vote(
        &self,
        user_id: Uuid,
        suggestion_id: Uuid,
    ) -> Result<Option<SuggestionVote>, AppError> {
        self.select_one(
            Query::table(tables::SUGGESTION_VOTES)
                .eq("user_id", user_id)
                .eq("suggestion_id", suggestion_id),
        )
        .await
    }

    pub async fn list_votes_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<SuggestionVote>, AppError> {
        self.select(
            Query::table(tables::SUGGESTION_VOTES)
                .select("suggestion_id,user_id,vote_type")
                .eq("user_id", user_id),
        )
        .await
    }

    pub async fn insert_vote(&self, vote: &SuggestionVote) -> Result<(), AppError> {
        let _: Value = self.insert(tables::SUGGESTION_VOTES, vote).await?;
        Ok(())
    }

    pub async fn change_vote(
        &self,
        user_id: Uuid,
        suggestion_id: Uuid,
        vote_type: VoteType,
    ) -> Result<(), AppError> {
        let _: Vec<Value> = self
            .update(
                Query::table(tables::SUGGESTION_VOTES)
                    .eq("user_id", user_id)
                    .eq("suggestion_id", suggestion_id),
                &serde_json::json!({ "vote_type": vote_type }),
            )
            .await?;
        Ok(())
    }

    pub async fn delete_vote(&self, user_id: Uuid, suggestion_id: Uuid) -> Result<(), AppError> {
        self.delete(
            Query::table(tables::SUGGESTION_VOTES)
                .eq("user_id", user_id)
                .eq("suggestion_id", suggestion_id),
        )
        .await?;
        Ok(())
    }
}

impl RestClient {
    /// Send one PostgREST request, retrying idempotent methods.
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        query: &Query,
        body: Option<Value>,
        prefer: Option<&'static str>,
    ) -> Result<T, AppError> {
        let policy = if method == Method::POST {
            RetryPolicy::none()
        } else {
            self.retry
        };

        retry_when(policy, AppError::is_retryable, || {
            self.send_once(method.clone(), query, body.as_ref(), prefer)
        })
        .await
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        query: &Query,
        body: Option<&Value>,
        prefer: Option<&'static str>,
    ) -> Result<T, AppError> {
        let table = query.table_name();
        let url = format!("{}/{}", self.rest_url, table);

        let mut request = self
            .http
            .request(method.clone(), &url)
            .query(query.params())
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key);
        if let Some(prefer) = prefer {
            request = request.header("Prefer", prefer);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| AppError::Timeout)?
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout
                } else {
                    AppError::backend(format!("{} {} failed: {}", method, table, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
                .unwrap_or(body);

            tracing::debug!(table, status = status.as_u16(), "Supabase request rejected");
            return Err(AppError::Backend {
                status: Some(status.as_u16()),
                message: format!("{} {}: {}", method, table, message),
            });
        }

        response.json().await.map_err(|e| AppError::Backend {
            status: Some(status.as_u16()),
            message: format!("Invalid response from {}: {}", table, e),
        })
    }
}

fn to_json<B: Serialize>(body: &B) -> Result<Value, AppError> {
    serde_json::to_value(body)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode request body: {}", e)))
}
