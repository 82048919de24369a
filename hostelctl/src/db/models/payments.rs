//! Database models for fee payments.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

use crate::types::{PaymentId, StudentId};

/// Database request for recording a payment
#[derive(Debug, Clone)]
pub struct PaymentCreateDBRequest {
    pub student_id: StudentId,
    pub amount: f64,
    pub payment_type: String,
    pub payment_date: NaiveDate,
}

/// Database response for a payment, joined with its student when one still exists
#[derive(Debug, Clone, FromRow)]
pub struct PaymentDBResponse {
    pub id: PaymentId,
    pub student_id: StudentId,
    pub amount: f64,
    pub payment_date: NaiveDate,
    pub payment_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub student_name: Option<String>,
    pub roll_number: Option<String>,
}

/// Filter for listing payments
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub status: Option<String>,
    pub student_id: Option<StudentId>,
}
