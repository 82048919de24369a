//! Database models for login sessions.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::UserId;

/// Database entity model
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token_hash: String,
    pub user_id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Request for creating a session
#[derive(Debug, Clone)]
pub struct SessionCreateDBRequest {
    pub token_hash: String,
    pub user_id: UserId,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// Filter for listing sessions
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub user_id: Option<UserId>,
}
