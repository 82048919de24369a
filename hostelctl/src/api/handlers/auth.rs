//! Login, logout and the root redirect.
//!
//! These routes sit outside the authentication gate. Failures on the login form are reported by
//! redirecting back to `/login?error=...` so the page can show them; nothing here renders JSON.

use axum::{
    Form,
    extract::State,
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::{
    AppState,
    api::{handlers::pages, models::{auth::LoginForm, users::CurrentUser}},
    auth::{
        password::{Credential, Verification},
        session,
    },
    db::{
        handlers::{Sessions, Users},
        models::users::UserDBResponse,
    },
    errors::{Error, LOGIN_PATH, Result},
};

/// Landing page for a logged-in user.
pub const DASHBOARD_PATH: &str = "/dashboard";

const MISSING_CREDENTIALS: &str = "Please enter both username and password";
const INVALID_CREDENTIALS: &str = "Invalid username or password";
const LOGIN_FAILED: &str = "An error occurred. Please try again.";

fn login_error(message: &str) -> Response {
    let encoded: String = url::form_urlencoded::byte_serialize(message.as_bytes()).collect();
    Redirect::to(&format!("{LOGIN_PATH}?error={encoded}")).into_response()
}

/// `GET /`
#[tracing::instrument(skip_all)]
pub async fn root_redirect(user: Option<CurrentUser>) -> Redirect {
    match user {
        Some(_) => Redirect::to(DASHBOARD_PATH),
        None => Redirect::to(LOGIN_PATH),
    }
}

/// `GET /login`
#[tracing::instrument(skip_all)]
pub async fn login_page(user: Option<CurrentUser>) -> Response {
    match user {
        Some(_) => Redirect::to(DASHBOARD_PATH).into_response(),
        None => pages::serve_page("login.html"),
    }
}

/// Check a username and password. `Ok(None)` means the credentials are wrong, without saying which.
async fn authenticate(state: &AppState, username: &str, password: &str) -> Result<Option<UserDBResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let Some(user) = Users::new(&mut conn).get_by_username(username).await? else {
        return Ok(None);
    };

    let credential = Credential::from_stored(user.password.clone());
    let allow_plaintext = state.config.auth.allow_legacy_plaintext;
    if credential.is_legacy() && !allow_plaintext {
        warn!(user_id = user.id, "Login refused: stored password is not hashed and legacy plaintext is disabled");
    }

    // Verify password on a blocking thread to avoid blocking async runtime
    let candidate = password.to_string();
    let verification = tokio::task::spawn_blocking(move || credential.verify(&candidate, allow_plaintext))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    match verification {
        Verification::Mismatch => Ok(None),
        Verification::Match => Ok(Some(user)),
        Verification::MatchNeedsRehash => {
            warn!(user_id = user.id, "Accepted legacy plaintext password; replacing it with a hash");

            let candidate = password.to_string();
            let rehashed = tokio::task::spawn_blocking(move || Credential::hash(&candidate))
                .await
                .map_err(|e| Error::Internal {
                    operation: format!("spawn password hashing task: {e}"),
                })?;

            match rehashed {
                Ok(hashed) => {
                    if let Err(e) = Users::new(&mut conn).update_password(user.id, hashed.as_stored()).await {
                        error!(user_id = user.id, error = %e, "Failed to store rehashed password");
                    }
                }
                Err(e) => error!(user_id = user.id, error = %e, "Failed to rehash legacy password"),
            }
            Ok(Some(user))
        }
    }
}

/// Open a session and return the `Set-Cookie` value for it.
async fn open_session(state: &AppState, user: &UserDBResponse) -> Result<String> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut sessions = Sessions::new(&mut conn);

    let purged = sessions.purge_expired(Utc::now()).await?;
    if purged > 0 {
        info!(purged, "Removed expired sessions");
    }

    let (token, _) = sessions.create_for_user(user, &state.config).await?;
    Ok(session::create_session_cookie(&token, &state.config))
}

/// `POST /login`
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let Some((username, password)) = form.credentials() else {
        return login_error(MISSING_CREDENTIALS);
    };

    let user = match authenticate(&state, username, password).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            info!("Login failed: invalid username or password");
            return login_error(INVALID_CREDENTIALS);
        }
        Err(e) => {
            error!(error = %e, "Login failed");
            return login_error(LOGIN_FAILED);
        }
    };

    match open_session(&state, &user).await {
        Ok(cookie) => {
            info!(user_id = user.id, "User logged in");
            ([(header::SET_COOKIE, cookie)], Redirect::to(DASHBOARD_PATH)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to open session");
            login_error(LOGIN_FAILED)
        }
    }
}

/// `GET /logout`
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, headers: axum::http::HeaderMap) -> Response {
    if let Some(token) = session::session_token_from_headers(&headers, &state.config.auth.session.cookie_name) {
        let revoked = match state.db.acquire().await {
            Ok(mut conn) => Sessions::new(&mut conn).revoke(token).await.map_err(Error::from),
            Err(e) => Err(Error::Database(e.into())),
        };
        if let Err(e) = revoked {
            // The cookie is cleared regardless; the row expires on its own
            warn!(error = %e, "Failed to delete session on logout");
        }
    }

    (
        [(header::SET_COOKIE, session::clear_session_cookie(&state.config))],
        Redirect::to(LOGIN_PATH),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::handlers::Repository,
        test_utils::{create_test_app, create_test_user, insert_legacy_user},
    };
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use sqlx::SqlitePool;

    fn location(response: &axum_test::TestResponse) -> String {
        response.header("location").to_str().unwrap().to_string()
    }

    fn session_cookie(response: &axum_test::TestResponse) -> String {
        let set_cookie = response.header("set-cookie").to_str().unwrap().to_string();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn server(pool: SqlitePool) -> TestServer {
        let (server, _) = create_test_app(pool).await;
        server
    }

    #[test]
    fn test_login_error_is_encoded() {
        let response = login_error(LOGIN_FAILED);
        let location = response.headers()["location"].to_str().unwrap();
        assert_eq!(location, "/login?error=An+error+occurred.+Please+try+again.");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[sqlx::test]
    async fn test_login_with_hashed_password_then_use_session(pool: SqlitePool) {
        create_test_user(&pool, "matron", "correct-horse").await;
        let server = server(pool).await;

        let response = server
            .post("/login")
            .form(&[("username", "matron"), ("password", "correct-horse")])
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/dashboard");

        let cookie = session_cookie(&response);
        assert!(cookie.starts_with("hostel_session="));

        let stats = server.get("/api/stats").add_header("cookie", cookie).await;
        stats.assert_status_ok();
    }

    #[sqlx::test]
    async fn test_wrong_password_and_unknown_user_look_the_same(pool: SqlitePool) {
        create_test_user(&pool, "matron", "correct-horse").await;
        let server = server(pool).await;

        let wrong_password = server
            .post("/login")
            .form(&[("username", "matron"), ("password", "battery-staple")])
            .await;
        let unknown_user = server
            .post("/login")
            .form(&[("username", "nobody"), ("password", "correct-horse")])
            .await;

        assert_eq!(location(&wrong_password), "/login?error=Invalid+username+or+password");
        assert_eq!(location(&wrong_password), location(&unknown_user));
        assert!(!wrong_password.headers().contains_key("set-cookie"));
    }

    #[sqlx::test]
    async fn test_missing_fields(pool: SqlitePool) {
        let server = server(pool).await;

        let response = server.post("/login").form(&[("username", "matron"), ("password", "")]).await;
        assert_eq!(
            location(&response),
            "/login?error=Please+enter+both+username+and+password"
        );
    }

    #[sqlx::test]
    async fn test_legacy_password_is_rehashed_on_login(pool: SqlitePool) {
        let legacy = insert_legacy_user(&pool, "caretaker", "old-secret").await;
        let server = server(pool.clone()).await;

        let response = server
            .post("/login")
            .form(&[("username", "caretaker"), ("password", "old-secret")])
            .await;
        assert_eq!(location(&response), "/dashboard");

        let mut conn = pool.acquire().await.unwrap();
        let stored = Users::new(&mut conn).get_by_id(legacy.id).await.unwrap().unwrap();
        assert!(matches!(Credential::from_stored(stored.password), Credential::Hashed(_)));
        drop(conn);

        // The new hash still accepts the same password
        let again = server
            .post("/login")
            .form(&[("username", "caretaker"), ("password", "old-secret")])
            .await;
        assert_eq!(location(&again), "/dashboard");
    }

    #[sqlx::test]
    async fn test_legacy_password_refused_when_disabled(pool: SqlitePool) {
        insert_legacy_user(&pool, "caretaker", "old-secret").await;

        let mut state = crate::test_utils::create_test_state(pool);
        state.config.auth.allow_legacy_plaintext = false;
        let server = TestServer::new(crate::build_router(state).unwrap()).unwrap();

        let response = server
            .post("/login")
            .form(&[("username", "caretaker"), ("password", "old-secret")])
            .await;
        assert_eq!(location(&response), "/login?error=Invalid+username+or+password");
    }

    #[sqlx::test]
    async fn test_login_page_and_root_redirects(pool: SqlitePool) {
        let (server, cookie) = create_test_app(pool).await;

        let anonymous_root = server.get("/").await;
        assert_eq!(location(&anonymous_root), "/login");

        let login_page = server.get("/login").await;
        login_page.assert_status_ok();
        assert!(login_page.text().contains("<form"));

        let root = server.get("/").add_header(cookie.0.clone(), cookie.1.clone()).await;
        assert_eq!(location(&root), "/dashboard");

        let logged_in_login = server.get("/login").add_header(cookie.0, cookie.1).await;
        assert_eq!(location(&logged_in_login), "/dashboard");
    }

    #[sqlx::test]
    async fn test_logout_revokes_session(pool: SqlitePool) {
        let (server, cookie) = create_test_app(pool).await;

        server
            .get("/api/stats")
            .add_header(cookie.0.clone(), cookie.1.clone())
            .await
            .assert_status_ok();

        let response = server.get("/logout").add_header(cookie.0.clone(), cookie.1.clone()).await;
        assert_eq!(location(&response), "/login");
        assert!(response.header("set-cookie").to_str().unwrap().contains("Max-Age=0"));

        let after = server.get("/api/stats").add_header(cookie.0, cookie.1).await;
        after.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&after), "/login");
    }
}
