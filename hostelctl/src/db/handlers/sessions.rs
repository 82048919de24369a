//! Database repository for login sessions.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::instrument;

use crate::{
    auth::session,
    config::Config,
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::{
            sessions::{Session, SessionCreateDBRequest, SessionFilter},
            users::UserDBResponse,
        },
    },
};

const SESSION_COLUMNS: &str = "token_hash, user_id, username, created_at, expires_at";

pub struct Sessions<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Sessions<'c> {
    type CreateRequest = SessionCreateDBRequest;
    type Response = Session;
    type Id = String;
    type Filter = SessionFilter;

    #[instrument(skip(self, request), fields(user_id = request.user_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "INSERT INTO sessions (token_hash, user_id, username, created_at, expires_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(&request.token_hash)
        .bind(request.user_id)
        .bind(&request.username)
        .bind(Utc::now())
        .bind(request.expires_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(session)
    }

    #[instrument(skip_all, err)]
    async fn get_by_id(&mut self, token_hash: Self::Id) -> Result<Option<Self::Response>> {
        let session = sqlx::query_as::<_, Session>(&format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE token_hash = ?"))
            .bind(token_hash)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(session)
    }

    #[instrument(skip(self, filter), fields(user_id = ?filter.user_id), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = format!("SELECT {SESSION_COLUMNS} FROM sessions");
        if filter.user_id.is_some() {
            query.push_str(" WHERE user_id = ?");
        }
        query.push_str(" ORDER BY created_at DESC");

        let mut sql_query = sqlx::query_as::<_, Session>(&query);
        if let Some(user_id) = filter.user_id {
            sql_query = sql_query.bind(user_id);
        }

        Ok(sql_query.fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip_all, err)]
    async fn delete(&mut self, token_hash: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> Sessions<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Open a session for a user. Returns the raw token for the cookie; only its digest is stored.
    #[instrument(skip(self, user, config), fields(user_id = user.id), err)]
    pub async fn create_for_user(&mut self, user: &UserDBResponse, config: &Config) -> Result<(String, Session)> {
        let raw_token = session::generate_session_token();
        let expires_at = Utc::now()
            + chrono::Duration::from_std(config.auth.session.timeout).unwrap_or_else(|_| chrono::Duration::hours(24));

        let request = SessionCreateDBRequest {
            token_hash: session::hash_session_token(&raw_token),
            user_id: user.id,
            username: user.username.clone(),
            expires_at,
        };

        let session = self.create(&request).await?;
        Ok((raw_token, session))
    }

    /// Look up the session for a raw cookie token, ignoring expired ones.
    #[instrument(skip_all, err)]
    pub async fn find_valid(&mut self, raw_token: &str, now: DateTime<Utc>) -> Result<Option<Session>> {
        let session = self.get_by_id(session::hash_session_token(raw_token)).await?;
        Ok(session.filter(|s| !s.is_expired_at(now)))
    }

    /// Delete the session for a raw cookie token.
    #[instrument(skip_all, err)]
    pub async fn revoke(&mut self, raw_token: &str) -> Result<bool> {
        self.delete(session::hash_session_token(raw_token)).await
    }

    /// Remove every session that expired at or before `now`.
    #[instrument(skip(self), err)]
    pub async fn purge_expired(&mut self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }
}
