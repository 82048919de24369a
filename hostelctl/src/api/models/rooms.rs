//! API models for rooms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::models::students::non_blank,
    db::models::rooms::{RoomCreateDBRequest, RoomDBResponse, RoomStatus},
    errors::Error,
    types::RoomId,
};

/// New room. `capacity` may be sent as a number or a numeric string.
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RoomCreate {
    pub room_number: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    #[schema(value_type = Option<i64>)]
    pub capacity: Option<i64>,
}

impl TryFrom<RoomCreate> for RoomCreateDBRequest {
    type Error = Error;

    fn try_from(api: RoomCreate) -> Result<Self, Self::Error> {
        let (Some(room_number), Some(capacity)) = (non_blank(&api.room_number), api.capacity) else {
            return Err(Error::BadRequest {
                message: "Room number and capacity are required".to_string(),
            });
        };

        if capacity < 1 {
            return Err(Error::BadRequest {
                message: "Capacity must be a positive integer".to_string(),
            });
        }

        Ok(Self { room_number, capacity })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RoomStatusUpdate {
    pub status: Option<String>,
}

impl RoomStatusUpdate {
    pub fn parse(&self) -> Result<RoomStatus, Error> {
        self.status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::BadRequest {
                message: "Invalid status".to_string(),
            })
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListRoomsQuery {
    #[param(value_type = Option<String>)]
    pub status: Option<RoomStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoomResponse {
    pub id: RoomId,
    pub room_number: String,
    pub capacity: i64,
    pub occupied: i64,
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
}

impl From<RoomDBResponse> for RoomResponse {
    fn from(db: RoomDBResponse) -> Self {
        Self {
            id: db.id,
            room_number: db.room_number,
            capacity: db.capacity,
            occupied: db.occupied,
            status: db.status,
            created_at: db.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_capacity_accepts_numeric_string() {
        let request: RoomCreate = serde_json::from_value(json!({ "room_number": "101", "capacity": "2" })).unwrap();
        assert_eq!(request.capacity, Some(2));

        let request: RoomCreate = serde_json::from_value(json!({ "room_number": "101", "capacity": 3 })).unwrap();
        assert_eq!(request.capacity, Some(3));

        let request: RoomCreate = serde_json::from_value(json!({ "room_number": "101" })).unwrap();
        assert_eq!(request.capacity, None);
    }

    #[test]
    fn test_room_create_validation() {
        let missing = RoomCreate {
            room_number: Some("101".to_string()),
            capacity: None,
        };
        assert_eq!(
            RoomCreateDBRequest::try_from(missing).unwrap_err().user_message(),
            "Room number and capacity are required"
        );

        let zero = RoomCreate {
            room_number: Some("101".to_string()),
            capacity: Some(0),
        };
        assert_eq!(
            RoomCreateDBRequest::try_from(zero).unwrap_err().user_message(),
            "Capacity must be a positive integer"
        );
    }

    #[test]
    fn test_status_update_parsing() {
        let ok = RoomStatusUpdate {
            status: Some("maintenance".to_string()),
        };
        assert_eq!(ok.parse().unwrap(), RoomStatus::Maintenance);

        for bad in [None, Some("closed".to_string()), Some("FULL".to_string())] {
            let err = RoomStatusUpdate { status: bad }.parse().unwrap_err();
            assert_eq!(err.user_message(), "Invalid status");
        }
    }
}
