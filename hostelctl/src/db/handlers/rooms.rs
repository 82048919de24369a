//! Database repository for rooms.
//!
//! Besides plain CRUD, this repository owns the occupancy counter: [`Rooms::claim_bed`] and
//! [`Rooms::release_bed`] are the only statements that change `rooms.occupied`, and both are
//! guarded in SQL so the counter stays within `0..=capacity` regardless of interleaving.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::rooms::{RoomCreateDBRequest, RoomDBResponse, RoomFilter, RoomStatus},
    },
    types::{Operation, RoomId},
};

const ROOM_COLUMNS: &str = "id, room_number, capacity, occupied, status, created_at";

pub struct Rooms<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Rooms<'c> {
    type CreateRequest = RoomCreateDBRequest;
    type Response = RoomDBResponse;
    type Id = RoomId;
    type Filter = RoomFilter;

    #[instrument(skip(self, request), fields(room_number = %request.room_number), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let room = sqlx::query_as::<_, RoomDBResponse>(&format!(
            "INSERT INTO rooms (room_number, capacity, occupied, status, created_at)
             VALUES (?, ?, 0, ?, ?)
             RETURNING {ROOM_COLUMNS}"
        ))
        .bind(&request.room_number)
        .bind(request.capacity)
        .bind(RoomStatus::Available)
        .bind(Utc::now())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(room)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let room = sqlx::query_as::<_, RoomDBResponse>(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(room)
    }

    #[instrument(skip(self, filter), fields(status = ?filter.status), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = format!("SELECT {ROOM_COLUMNS} FROM rooms");
        if filter.status.is_some() {
            query.push_str(" WHERE status = ?");
        }
        query.push_str(" ORDER BY room_number");

        let mut sql_query = sqlx::query_as::<_, RoomDBResponse>(&query);
        if let Some(status) = filter.status {
            sql_query = sql_query.bind(status);
        }

        Ok(sql_query.fetch_all(&mut *self.db).await?)
    }

    /// Delete a room that has no students assigned.
    ///
    /// Returns `ProtectedEntity` while any student references the room's number, and `false`
    /// when the room does not exist.
    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM rooms
             WHERE id = ?
               AND NOT EXISTS (SELECT 1 FROM students WHERE students.room_number = rooms.room_number)",
        )
        .bind(id)
        .execute(&mut *self.db)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        match self.get_by_id(id).await? {
            Some(_) => Err(DbError::ProtectedEntity {
                operation: Operation::Delete,
                reason: "students assigned".to_string(),
                entity_type: "room".to_string(),
                entity_id: Some(id.to_string()),
            }),
            None => Ok(false),
        }
    }
}

impl<'c> Rooms<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_number(&mut self, room_number: &str) -> Result<Option<RoomDBResponse>> {
        let room = sqlx::query_as::<_, RoomDBResponse>(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE room_number = ?"))
            .bind(room_number)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(room)
    }

    /// Set a room's status. Returns `None` if the room does not exist.
    #[instrument(skip(self), err)]
    pub async fn update_status(&mut self, id: RoomId, status: RoomStatus) -> Result<Option<RoomDBResponse>> {
        let room = sqlx::query_as::<_, RoomDBResponse>(&format!(
            "UPDATE rooms SET status = ? WHERE id = ? RETURNING {ROOM_COLUMNS}"
        ))
        .bind(status)
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(room)
    }

    /// Take one bed in a room, failing if the room is unknown or already at capacity.
    #[instrument(skip(self), err)]
    pub async fn claim_bed(&mut self, room_number: &str) -> Result<()> {
        let result = sqlx::query("UPDATE rooms SET occupied = occupied + 1 WHERE room_number = ? AND occupied < capacity")
            .bind(room_number)
            .execute(&mut *self.db)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        match self.get_by_number(room_number).await? {
            Some(_) => Err(DbError::CapacityExceeded {
                room_number: room_number.to_string(),
            }),
            None => Err(DbError::MissingReference {
                entity_type: "room".to_string(),
                reference: room_number.to_string(),
            }),
        }
    }

    /// Give back one bed. The counter never drops below zero.
    #[instrument(skip(self), err)]
    pub async fn release_bed(&mut self, room_number: &str) -> Result<()> {
        let result = sqlx::query("UPDATE rooms SET occupied = occupied - 1 WHERE room_number = ? AND occupied > 0")
            .bind(room_number)
            .execute(&mut *self.db)
            .await?;

        if result.rows_affected() == 0 {
            tracing::warn!(room_number, "occupancy already zero or room missing; counter left unchanged");
        }
        Ok(())
    }
}
