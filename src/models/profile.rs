// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile and role models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row in the `profiles` table (one per auth user).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Same ID as the Supabase auth user
    pub id: Uuid,
    pub first_name: String,
    pub created_at: String,
}

/// Application role stored in `user_roles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppRole {
    Admin,
    User,
}

/// Row in the `user_roles` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRole {
    pub user_id: Option<Uuid>,
    pub role: Option<AppRole>,
}
