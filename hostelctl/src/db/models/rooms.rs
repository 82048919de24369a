//! Database models for rooms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

use crate::types::RoomId;

/// Room availability, stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RoomStatus {
    Available,
    Full,
    Maintenance,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomStatus::Available => write!(f, "available"),
            RoomStatus::Full => write!(f, "full"),
            RoomStatus::Maintenance => write!(f, "maintenance"),
        }
    }
}

impl FromStr for RoomStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(RoomStatus::Available),
            "full" => Ok(RoomStatus::Full),
            "maintenance" => Ok(RoomStatus::Maintenance),
            other => Err(format!("unknown room status '{other}'")),
        }
    }
}

/// Database request for creating a room. New rooms start empty and available.
#[derive(Debug, Clone)]
pub struct RoomCreateDBRequest {
    pub room_number: String,
    pub capacity: i64,
}

/// Database response for a room
#[derive(Debug, Clone, FromRow)]
pub struct RoomDBResponse {
    pub id: RoomId,
    pub room_number: String,
    pub capacity: i64,
    pub occupied: i64,
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
}

/// Filter for listing rooms
#[derive(Debug, Clone, Default)]
pub struct RoomFilter {
    pub status: Option<RoomStatus>,
}
