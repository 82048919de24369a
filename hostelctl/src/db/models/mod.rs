//! Database record models matching table schemas.
//!
//! This module contains struct definitions that directly correspond to database
//! table rows. These models are used by repositories to return query results
//! and accept insertion data.
//!
//! # Design Principles
//!
//! - **Schema Mapping**: Each model struct matches a database table schema
//! - **SQLx Integration**: Models derive `sqlx::FromRow` for query results
//! - **Separation**: Database models are distinct from API models to allow
//!   independent evolution of storage and API representations
//!
//! # Models
//!
//! - [`users`]: Login accounts and their stored credentials
//! - [`sessions`]: Server-held login sessions
//! - [`rooms`]: Rooms, capacity and occupancy
//! - [`students`]: Students and their room assignment
//! - [`payments`]: Fee payments

pub mod payments;
pub mod rooms;
pub mod sessions;
pub mod students;
pub mod users;
