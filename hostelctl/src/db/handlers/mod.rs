//! Repository implementations for database access.
//!
//! This module provides repository structs for each table in the system.
//! Repositories follow a consistent pattern and implement the [`Repository`] trait.
//!
//! # Design Pattern
//!
//! Each repository:
//! - Wraps a SQLx connection or transaction
//! - Provides strongly-typed CRUD operations
//! - Handles query construction and parameter binding
//! - Returns domain models from [`crate::db::models`]
//!
//! Multi-statement operations (adding or removing a student together with the room's occupancy
//! counter) open a transaction on the wrapped connection, so they are atomic whether the caller
//! hands in a pooled connection or an outer transaction.
//!
//! # Available Repositories
//!
//! - [`Users`]: Login accounts and stored credentials
//! - [`Sessions`]: Server-held login sessions
//! - [`Rooms`]: Rooms, occupancy bookkeeping and status
//! - [`Students`]: Students and their room assignment
//! - [`Payments`]: Fee payments
//! - [`stats`]: Dashboard aggregates (free functions over the pool)
//!
//! # Common Pattern
//!
//! ```ignore
//! use hostelctl::db::handlers::{Rooms, Repository};
//!
//! async fn example(pool: &sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut conn = pool.acquire().await?;
//!     let mut repo = Rooms::new(&mut conn);
//!
//!     let rooms = repo.list(&Default::default()).await?;
//!     Ok(())
//! }
//! ```

pub mod payments;
pub mod repository;
pub mod rooms;
pub mod sessions;
pub mod stats;
pub mod students;
pub mod users;

pub use payments::Payments;
pub use repository::Repository;
pub use rooms::Rooms;
pub use sessions::Sessions;
pub use students::Students;
pub use users::Users;
