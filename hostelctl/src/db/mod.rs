//! Persistence for staff accounts, sessions, rooms, students and payments.
//!
//! Everything lives in one SQLite database. Handlers never issue SQL themselves: they open a
//! connection (or transaction) from the pool and hand it to a repository in [`handlers`], which
//! returns the row types in [`models`]. Driver failures are classified once, in [`errors`], so
//! constraint violations surface as typed variants rather than raw SQLite messages.
//!
//! The occupancy counter on `rooms` is only ever changed inside the student repository's
//! transactions; see [`handlers::Rooms::claim_bed`].

pub mod errors;
pub mod handlers;
pub mod models;
