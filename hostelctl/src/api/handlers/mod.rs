//! HTTP request handlers.
//!
//! - [`auth`]: login form, logout and the root redirect (public)
//! - [`pages`]: the embedded HTML pages and their assets
//! - [`students`], [`rooms`], [`payments`]: JSON CRUD under `/api`
//! - [`stats`]: dashboard figures
//!
//! Handlers return [`crate::errors::Error`], which renders as `{"error": "..."}` with the matching
//! status, or as a redirect to the login page when the session is missing.

pub mod auth;
pub mod pages;
pub mod payments;
pub mod rooms;
pub mod stats;
pub mod students;
