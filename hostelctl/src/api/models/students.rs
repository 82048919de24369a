//! API models for students.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    db::models::students::{StudentCreateDBRequest, StudentDBResponse},
    errors::Error,
    types::StudentId,
};

/// Trimmed value of an optional text field, treating blank as missing.
pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct StudentCreate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub roll_number: Option<String>,
    pub room_number: Option<String>,
    pub phone: Option<String>,
}

impl TryFrom<StudentCreate> for StudentCreateDBRequest {
    type Error = Error;

    fn try_from(api: StudentCreate) -> Result<Self, Self::Error> {
        match (
            non_blank(&api.name),
            non_blank(&api.email),
            non_blank(&api.roll_number),
            non_blank(&api.room_number),
        ) {
            (Some(name), Some(email), Some(roll_number), Some(room_number)) => Ok(Self {
                name,
                email,
                roll_number,
                room_number,
                phone: non_blank(&api.phone),
            }),
            _ => Err(Error::BadRequest {
                message: "All fields are required".to_string(),
            }),
        }
    }
}

/// Query parameters for listing students
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListStudentsQuery {
    /// Only students assigned to this room
    pub room_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentResponse {
    pub id: StudentId,
    pub name: String,
    pub email: String,
    pub roll_number: String,
    pub room_number: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<StudentDBResponse> for StudentResponse {
    fn from(db: StudentDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            email: db.email,
            roll_number: db.roll_number,
            room_number: db.room_number,
            phone: db.phone,
            created_at: db.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> StudentCreate {
        StudentCreate {
            name: Some("Asha Rao".to_string()),
            email: Some("asha@example.com".to_string()),
            roll_number: Some("CS-01".to_string()),
            room_number: Some(" 101 ".to_string()),
            phone: Some("".to_string()),
        }
    }

    #[test]
    fn test_complete_request_converts() {
        let db = StudentCreateDBRequest::try_from(complete()).unwrap();
        assert_eq!(db.room_number, "101");
        assert_eq!(db.phone, None, "blank phone is stored as missing");
    }

    #[test]
    fn test_missing_or_blank_field_rejected() {
        let mut request = complete();
        request.email = None;
        let err = StudentCreateDBRequest::try_from(request).unwrap_err();
        assert_eq!(err.user_message(), "All fields are required");

        let mut request = complete();
        request.name = Some("   ".to_string());
        assert!(StudentCreateDBRequest::try_from(request).is_err());
    }
}
