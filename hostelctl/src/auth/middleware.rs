use crate::{AppState, api::models::users::CurrentUser, errors::Error};
use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::trace;

/// Authentication gate for every protected route.
///
/// Resolves the session cookie once and stores the [`CurrentUser`] in the request extensions for
/// handlers. Requests without a valid session get [`Error::Unauthenticated`], which renders as a
/// redirect to the login page.
pub async fn require_session(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, Error> {
    let (mut parts, body) = request.into_parts();
    let user = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state).await?;

    trace!(user_id = user.id, path = %parts.uri.path(), "Session accepted");
    parts.extensions.insert(user);

    Ok(next.run(Request::from_parts(parts, body)).await)
}
