//! Authentication for the administration interface.
//!
//! Staff log in with a username and password through the `/login` form. A successful login opens
//! a server-held session, identified to the browser by an opaque token in an HTTP-only cookie.
//! Every page and `/api` route other than the login page passes through
//! [`middleware::require_session`]; requests without a valid session are redirected to `/login`.
//!
//! # Modules
//!
//! - [`current_user`]: Extractor resolving the session cookie into the logged-in user
//! - [`middleware`]: Route protection middleware
//! - [`password`]: Argon2 hashing and classification of stored credentials
//! - [`session`]: Session token generation, hashing and cookies
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use hostelctl::api::models::users::CurrentUser;
//!
//! async fn protected_handler(user: CurrentUser) -> String {
//!     format!("Hello, {}!", user.username)
//! }
//! ```

pub mod current_user;
pub mod middleware;
pub mod password;
pub mod session;
