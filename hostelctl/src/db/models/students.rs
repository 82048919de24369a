//! Database models for students.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::StudentId;

/// Database request for creating a student
#[derive(Debug, Clone)]
pub struct StudentCreateDBRequest {
    pub name: String,
    pub email: String,
    pub roll_number: String,
    pub room_number: String,
    pub phone: Option<String>,
}

/// Database response for a student
#[derive(Debug, Clone, FromRow)]
pub struct StudentDBResponse {
    pub id: StudentId,
    pub name: String,
    pub email: String,
    pub roll_number: String,
    pub room_number: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Filter for listing students
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub room_number: Option<String>,
}
