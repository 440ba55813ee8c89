// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup. Supabase credentials are required;
//! the tuning knobs for caching, retries and quotas have defaults matching
//! what the web client used to hard-code.

use crate::retry::RetryPolicy;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Supabase project URL (e.g. https://xyz.supabase.co)
    pub supabase_url: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// Service-role key used for PostgREST calls
    pub supabase_service_key: String,
    /// Secret that signs Supabase session JWTs
    pub jwt_secret: Vec<u8>,

    // --- Tuning ---
    /// How long a user's saved-content listing stays cached
    pub content_cache_ttl: Duration,
    /// How long a computed subscription status stays cached
    pub subscription_cache_ttl: Duration,
    /// Per-request timeout for Supabase calls
    pub backend_timeout: Duration,
    /// Retry policy for idempotent Supabase calls
    pub retry: RetryPolicy,
    /// Image generations allowed per user per month
    pub image_monthly_limit: u32,
    /// Emails granted beta access without a subscription row
    pub special_access_emails: Vec<String>,
    /// Email domains granted beta access without a subscription row
    pub special_access_domains: Vec<String>,
}

impl Config {
    /// Config for tests, pointed at a local fake Supabase.
    pub fn test_default() -> Self {
        Self {
            supabase_url: "http://127.0.0.1:54321".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            supabase_service_key: "test_service_key".to_string(),
            jwt_secret: b"test_jwt_secret_32_bytes_minimum!".to_vec(),
            content_cache_ttl: Duration::from_secs(180),
            subscription_cache_ttl: Duration::from_secs(300),
            backend_timeout: Duration::from_secs(5),
            retry: RetryPolicy::new(3, Duration::from_millis(10)),
            image_monthly_limit: 5,
            special_access_emails: vec![],
            special_access_domains: vec![],
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let retry = RetryPolicy::new(
            parse_or("RETRY_MAX_ATTEMPTS", 3)?,
            Duration::from_millis(parse_or("RETRY_BASE_DELAY_MS", 1000)?),
        );

        Ok(Self {
            supabase_url: required("SUPABASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parse_or("PORT", 8080)?,

            supabase_service_key: required("SUPABASE_SERVICE_ROLE_KEY")?,
            jwt_secret: required("SUPABASE_JWT_SECRET")?.into_bytes(),

            content_cache_ttl: Duration::from_secs(parse_or("CONTENT_CACHE_TTL_SECS", 180)?),
            subscription_cache_ttl: Duration::from_secs(parse_or(
                "SUBSCRIPTION_CACHE_TTL_SECS",
                300,
            )?),
            backend_timeout: Duration::from_secs(parse_or("BACKEND_TIMEOUT_SECS", 30)?),
            retry,
            image_monthly_limit: parse_or("IMAGE_MONTHLY_LIMIT", 5)?,
            special_access_emails: list("SPECIAL_ACCESS_EMAILS"),
            special_access_domains: list("SPECIAL_ACCESS_DOMAINS"),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .map_err(|_| ConfigError::Missing(name))
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

fn list(name: &'static str) -> Vec<String> {
    env::var(name)
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("SUPABASE_URL", "https://project.supabase.co/");
        env::set_var("SUPABASE_SERVICE_ROLE_KEY", " service_key ");
        env::set_var("SUPABASE_JWT_SECRET", "test_jwt_secret_32_bytes_minimum!");
        env::set_var("SPECIAL_ACCESS_DOMAINS", "Pedagogia.fr, ,example.org");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.supabase_url, "https://project.supabase.co");
        assert_eq!(config.supabase_service_key, "service_key");
        assert_eq!(config.port, 8080);
        assert_eq!(config.content_cache_ttl, Duration::from_secs(180));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(
            config.special_access_domains,
            vec!["pedagogia.fr".to_string(), "example.org".to_string()]
        );
    }
}
