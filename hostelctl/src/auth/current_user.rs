use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    db::{errors::DbError, handlers::Sessions},
    errors::{Error, Result},
};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use chrono::Utc;
use tracing::{debug, instrument, trace};

/// Resolve the session cookie on a request into the logged-in user, if any.
///
/// A missing, unknown or expired session yields `Ok(None)`; only storage failures are errors.
#[instrument(skip_all)]
async fn try_session_auth(parts: &Parts, state: &AppState) -> Result<Option<CurrentUser>> {
    let Some(token) = session::session_token_from_headers(&parts.headers, &state.config.auth.session.cookie_name) else {
        trace!("No session cookie on request");
        return Ok(None);
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(DbError::from(e)))?;
    let session = Sessions::new(&mut conn).find_valid(token, Utc::now()).await?;

    match session {
        Some(session) => {
            debug!(user_id = session.user_id, "Found session authenticated user");
            Ok(Some(CurrentUser {
                id: session.user_id,
                username: session.username,
            }))
        }
        None => {
            trace!("Session cookie present but unknown or expired");
            Ok(None)
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // The auth middleware has already resolved the session for protected routes
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        try_session_auth(parts, state)
            .await?
            .ok_or(Error::Unauthenticated { message: None })
    }
}

impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Option<Self>> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(Some(user.clone()));
        }

        try_session_auth(parts, state).await
    }
}
