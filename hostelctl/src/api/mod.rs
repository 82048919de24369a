//! API layer: route handlers and the request/response models they exchange.
//!
//! The JSON API lives under `/api` and is documented at `/api/docs`. All of it, and every page
//! except `/login`, requires a session (see [`crate::auth::middleware`]).

pub mod handlers;
pub mod models;
