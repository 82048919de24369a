//! Request and response types for the JSON API.
//!
//! Request types keep every field optional so that a missing field is reported with the
//! endpoint's own validation message rather than a deserialisation error. Conversion into the
//! database request types is where validation happens.

pub mod auth;
pub mod payments;
pub mod responses;
pub mod rooms;
pub mod stats;
pub mod students;
pub mod users;
