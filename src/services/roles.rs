// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin role lookups, cached per user.

use crate::cache::TtlCache;
use crate::db::SupabaseDb;
use crate::error::AppError;
use crate::models::AppRole;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Clone)]
pub struct RoleService {
    db: SupabaseDb,
    cache: Arc<TtlCache<Uuid, bool>>,
}

impl RoleService {
    pub fn new(db: SupabaseDb, cache_ttl: Duration) -> Self {
        Self {
            db,
            cache: Arc::new(TtlCache::new(cache_ttl)),
        }
    }

    pub async fn is_admin(&self, user_id: Uuid) -> Result<bool, AppError> {
        self.cache
            .get_or_fetch(user_id, || async {
                let role = self.db.get_role(user_id).await?;
                Ok::<_, AppError>(role == Some(AppRole::Admin))
            })
            .await
    }
}
