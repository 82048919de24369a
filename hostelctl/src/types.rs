//! Common type definitions.
//!
//! # ID Types
//!
//! All entity IDs are SQLite `INTEGER PRIMARY KEY` rowids wrapped in type aliases so signatures
//! say which table an id belongs to:
//!
//! - [`UserId`]: Login account identifier
//! - [`StudentId`]: Student identifier
//! - [`RoomId`]: Room identifier
//! - [`PaymentId`]: Fee payment identifier

use std::fmt;

// Type aliases for IDs
pub type UserId = i64;
pub type StudentId = i64;
pub type RoomId = i64;
pub type PaymentId = i64;

/// Operations reported in errors when a database-level rule refuses a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}
