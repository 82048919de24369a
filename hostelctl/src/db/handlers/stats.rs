//! Dashboard aggregate queries.
//!
//! Each aggregate is an independent read against the pool so callers can run them concurrently
//! and report whichever succeed.

use sqlx::SqlitePool;
use tracing::instrument;

use crate::db::{errors::Result, models::rooms::RoomStatus};

#[instrument(skip(db), err)]
pub async fn total_students(db: &SqlitePool) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM students").fetch_one(db).await?)
}

#[instrument(skip(db), err)]
pub async fn total_rooms(db: &SqlitePool) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM rooms").fetch_one(db).await?)
}

#[instrument(skip(db), err)]
pub async fn available_rooms(db: &SqlitePool) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM rooms WHERE status = ?")
        .bind(RoomStatus::Available)
        .fetch_one(db)
        .await?)
}

/// Sum of all pending payment amounts; zero when nothing is pending.
#[instrument(skip(db), err)]
pub async fn pending_fees(db: &SqlitePool) -> Result<f64> {
    Ok(
        sqlx::query_scalar("SELECT CAST(COALESCE(SUM(amount), 0) AS REAL) FROM payments WHERE status = 'pending'")
            .fetch_one(db)
            .await?,
    )
}
