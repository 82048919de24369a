//! API models for fee payments.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::models::students::non_blank,
    db::models::payments::PaymentDBResponse,
    errors::Error,
    types::{PaymentId, StudentId},
};

/// Payment statuses the pages know how to display.
///
/// Updates may store other values; see [`PaymentStatus::recognise`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn recognise(status: &str) -> Option<Self> {
        match status {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }
}

/// New payment. Numeric fields may be sent as numbers or numeric strings.
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PaymentCreate {
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    #[schema(value_type = Option<i64>)]
    pub student_id: Option<StudentId>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub amount: Option<f64>,
    pub payment_type: Option<String>,
}

/// Validated payment fields, before the server fills in date and status.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPayment {
    pub student_id: StudentId,
    pub amount: f64,
    pub payment_type: String,
}

impl PaymentCreate {
    /// A zero student id or amount counts as missing, and so does an amount that is not finite.
    pub fn validate(&self) -> Result<ValidPayment, Error> {
        let student_id = self.student_id.filter(|id| *id != 0);
        let amount = self.amount.filter(|amount| amount.is_finite() && *amount != 0.0);

        match (student_id, amount, non_blank(&self.payment_type)) {
            (Some(student_id), Some(amount), Some(payment_type)) => Ok(ValidPayment {
                student_id,
                amount,
                payment_type,
            }),
            _ => Err(Error::BadRequest {
                message: "All fields are required".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PaymentStatusUpdate {
    pub status: Option<String>,
}

impl PaymentStatusUpdate {
    pub fn status(&self) -> Result<String, Error> {
        non_blank(&self.status).ok_or_else(|| Error::BadRequest {
            message: "Status is required".to_string(),
        })
    }
}

/// Query parameters for listing payments
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListPaymentsQuery {
    /// Exact status to match, e.g. `pending`
    pub status: Option<String>,
    pub student_id: Option<StudentId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: PaymentId,
    pub student_id: StudentId,
    pub amount: f64,
    pub payment_date: NaiveDate,
    pub payment_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    /// Null when the student has since been removed
    pub student_name: Option<String>,
    pub roll_number: Option<String>,
}

impl From<PaymentDBResponse> for PaymentResponse {
    fn from(db: PaymentDBResponse) -> Self {
        Self {
            id: db.id,
            student_id: db.student_id,
            amount: db.amount,
            payment_date: db.payment_date,
            payment_type: db.payment_type,
            status: db.status,
            created_at: db.created_at,
            student_name: db.student_name,
            roll_number: db.roll_number,
        }
    }
}
