//! Database repository for students.

use chrono::Utc;
use sqlx::{Connection, SqliteConnection};
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::{repository::Repository, rooms::Rooms},
        models::students::{StudentCreateDBRequest, StudentDBResponse, StudentFilter},
    },
    types::StudentId,
};

const STUDENT_COLUMNS: &str = "id, name, email, roll_number, room_number, phone, created_at";

pub struct Students<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Students<'c> {
    type CreateRequest = StudentCreateDBRequest;
    type Response = StudentDBResponse;
    type Id = StudentId;
    type Filter = StudentFilter;

    /// Add a student and take a bed in their room, atomically.
    ///
    /// The bed is claimed first so a full or unknown room is reported before uniqueness; if the
    /// insert then fails the claim is rolled back with it.
    #[instrument(skip(self, request), fields(room_number = %request.room_number), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;

        Rooms::new(&mut tx).claim_bed(&request.room_number).await?;

        let student = sqlx::query_as::<_, StudentDBResponse>(&format!(
            "INSERT INTO students (name, email, roll_number, room_number, phone, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {STUDENT_COLUMNS}"
        ))
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.roll_number)
        .bind(&request.room_number)
        .bind(&request.phone)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(student)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let student = sqlx::query_as::<_, StudentDBResponse>(&format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(student)
    }

    /// Most recently added first.
    #[instrument(skip(self, filter), fields(room_number = ?filter.room_number), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = format!("SELECT {STUDENT_COLUMNS} FROM students");
        if filter.room_number.is_some() {
            query.push_str(" WHERE room_number = ?");
        }
        query.push_str(" ORDER BY created_at DESC, id DESC");

        let mut sql_query = sqlx::query_as::<_, StudentDBResponse>(&query);
        if let Some(room_number) = &filter.room_number {
            sql_query = sql_query.bind(room_number);
        }

        Ok(sql_query.fetch_all(&mut *self.db).await?)
    }

    /// Remove a student and free their bed, atomically. Returns false if the student is unknown.
    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let mut tx = self.db.begin().await?;

        let room_number: Option<String> = sqlx::query_scalar("DELETE FROM students WHERE id = ? RETURNING room_number")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(room_number) = room_number else {
            return Ok(false);
        };

        Rooms::new(&mut tx).release_bed(&room_number).await?;

        tx.commit().await?;
        Ok(true)
    }
}

impl<'c> Students<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }
}
