use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Local;
use tracing::{info, warn};

use crate::{
    AppState,
    api::models::{
        payments::{ListPaymentsQuery, PaymentCreate, PaymentResponse, PaymentStatus, PaymentStatusUpdate},
        responses::{CreatedResponse, ErrorResponse, MessageResponse},
    },
    db::{
        handlers::{Payments, Repository},
        models::payments::{PaymentCreateDBRequest, PaymentFilter},
    },
    errors::{Error, Result},
    types::PaymentId,
};

fn payment_not_found(id: PaymentId) -> Error {
    Error::NotFound {
        resource: "Payment".to_string(),
        id: id.to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/api/payments",
    tag = "payments",
    summary = "List payments",
    description = "All payments with the student's name and roll number, most recent first. \
        Payments whose student has been deleted are included with null student fields.",
    params(ListPaymentsQuery),
    responses(
        (status = 200, description = "List of payments", body = Vec<PaymentResponse>),
        (status = 303, description = "Not logged in; redirects to /login"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<ListPaymentsQuery>,
) -> Result<Json<Vec<PaymentResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let payments = Payments::new(&mut conn)
        .list(&PaymentFilter {
            status: query.status,
            student_id: query.student_id,
        })
        .await?;

    Ok(Json(payments.into_iter().map(PaymentResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/payments",
    tag = "payments",
    summary = "Record payment",
    description = "New payments are dated today and start as `pending`.",
    request_body = PaymentCreate,
    responses(
        (status = 200, description = "Payment recorded", body = CreatedResponse),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 303, description = "Not logged in; redirects to /login"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_payment(State(state): State<AppState>, Json(create): Json<PaymentCreate>) -> Result<Json<CreatedResponse>> {
    let valid = create.validate()?;
    let request = PaymentCreateDBRequest {
        student_id: valid.student_id,
        amount: valid.amount,
        payment_type: valid.payment_type,
        payment_date: Local::now().date_naive(),
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let payment = Payments::new(&mut conn).create(&request).await?;

    info!(payment_id = payment.id, student_id = payment.student_id, "Payment recorded");
    Ok(Json(CreatedResponse::new("Payment recorded successfully", payment.id)))
}

#[utoipa::path(
    get,
    path = "/api/payments/{id}",
    tag = "payments",
    summary = "Get payment",
    params(("id" = i64, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment details", body = PaymentResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 303, description = "Not logged in; redirects to /login")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_payment(State(state): State<AppState>, Path(id): Path<PaymentId>) -> Result<Json<PaymentResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let payment = Payments::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| payment_not_found(id))?;

    Ok(Json(PaymentResponse::from(payment)))
}

#[utoipa::path(
    put,
    path = "/api/payments/{id}",
    tag = "payments",
    summary = "Update payment status",
    description = "Any non-empty status is stored. The pages only know `pending` and `paid`.",
    params(("id" = i64, Path, description = "Payment ID")),
    request_body = PaymentStatusUpdate,
    responses(
        (status = 200, description = "Status updated", body = MessageResponse),
        (status = 400, description = "Status missing", body = ErrorResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 303, description = "Not logged in; redirects to /login")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_payment_status(
    State(state): State<AppState>,
    Path(id): Path<PaymentId>,
    Json(update): Json<PaymentStatusUpdate>,
) -> Result<Json<MessageResponse>> {
    let status = update.status()?;
    if PaymentStatus::recognise(&status).is_none() {
        warn!(payment_id = id, status = %status, "Storing unrecognised payment status");
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Payments::new(&mut conn).update_status(id, &status).await? {
        return Err(payment_not_found(id));
    }

    info!(payment_id = id, status = %status, "Payment status updated");
    Ok(Json(MessageResponse::new("Payment status updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/payments/{id}",
    tag = "payments",
    summary = "Delete payment",
    params(("id" = i64, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment deleted", body = MessageResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 303, description = "Not logged in; redirects to /login")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_payment(State(state): State<AppState>, Path(id): Path<PaymentId>) -> Result<Json<MessageResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if !Payments::new(&mut conn).delete(id).await? {
        return Err(payment_not_found(id));
    }

    info!(payment_id = id, "Payment deleted");
    Ok(Json(MessageResponse::new("Payment deleted successfully")))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_app, create_test_room, create_test_student};
    use axum::http::StatusCode;
    use chrono::Local;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    #[sqlx::test]
    async fn test_record_and_list_payment(pool: SqlitePool) {
        create_test_room(&pool, "101", 2).await;
        let student = create_test_student(&pool, "A-1", "101").await;
        let (server, (name, value)) = create_test_app(pool).await;

        let created = server
            .post("/api/payments")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "student_id": student.id.to_string(), "amount": "4500", "payment_type": "hostel_fee" }))
            .await;
        created.assert_status_ok();
        let body: Value = created.json();
        assert_eq!(body["message"], "Payment recorded successfully");

        let payments: Value = server.get("/api/payments").add_header(name, value).await.json();
        let payment = &payments[0];
        assert_eq!(payment["id"], body["id"]);
        assert_eq!(payment["status"], "pending");
        assert_eq!(payment["amount"], 4500.0);
        assert_eq!(payment["student_name"], "Student A-1");
        assert_eq!(payment["roll_number"], "A-1");
        assert_eq!(payment["payment_date"], Local::now().date_naive().to_string());
    }

    #[sqlx::test]
    async fn test_missing_fields(pool: SqlitePool) {
        let (server, (name, value)) = create_test_app(pool).await;

        let response = server
            .post("/api/payments")
            .add_header(name, value)
            .json(&json!({ "student_id": 1, "payment_type": "mess_fee" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "All fields are required" }));
    }

    #[sqlx::test]
    async fn test_unusable_amounts_rejected_and_stats_stay_numeric(pool: SqlitePool) {
        let (server, (name, value)) = create_test_app(pool).await;

        for body in [
            json!({ "student_id": 1, "amount": "NaN", "payment_type": "hostel_fee" }),
            json!({ "student_id": 1, "amount": "inf", "payment_type": "hostel_fee" }),
            json!({ "student_id": 1, "amount": "-inf", "payment_type": "hostel_fee" }),
            json!({ "student_id": 1, "amount": 0, "payment_type": "hostel_fee" }),
            json!({ "student_id": 0, "amount": 250, "payment_type": "hostel_fee" }),
        ] {
            let response = server
                .post("/api/payments")
                .add_header(name.clone(), value.clone())
                .json(&body)
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
            response.assert_json(&json!({ "error": "All fields are required" }));
        }

        let payments: Value = server.get("/api/payments").add_header(name.clone(), value.clone()).await.json();
        assert_eq!(payments, json!([]));

        let stats: Value = server.get("/api/stats").add_header(name, value).await.json();
        assert_eq!(stats["pendingFees"], 0.0);
    }

    #[sqlx::test]
    async fn test_update_status_and_delete(pool: SqlitePool) {
        let (server, (name, value)) = create_test_app(pool).await;

        let body: Value = server
            .post("/api/payments")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "student_id": 7, "amount": 1200.5, "payment_type": "mess_fee" }))
            .await
            .json();
        let path = format!("/api/payments/{}", body["id"]);

        let paid = server
            .put(&path)
            .add_header(name.clone(), value.clone())
            .json(&json!({ "status": "paid" }))
            .await;
        paid.assert_status_ok();
        paid.assert_json(&json!({ "message": "Payment status updated successfully" }));

        // Unrecognised values are stored as given
        server
            .put(&path)
            .add_header(name.clone(), value.clone())
            .json(&json!({ "status": "waived" }))
            .await
            .assert_status_ok();
        let payment: Value = server.get(&path).add_header(name.clone(), value.clone()).await.json();
        assert_eq!(payment["status"], "waived");

        let empty = server
            .put(&path)
            .add_header(name.clone(), value.clone())
            .json(&json!({ "status": "" }))
            .await;
        empty.assert_status(StatusCode::BAD_REQUEST);
        empty.assert_json(&json!({ "error": "Status is required" }));

        let unknown = server
            .put("/api/payments/9999")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "status": "paid" }))
            .await;
        unknown.assert_status(StatusCode::NOT_FOUND);
        unknown.assert_json(&json!({ "error": "Payment not found" }));

        server
            .delete(&path)
            .add_header(name.clone(), value.clone())
            .await
            .assert_json(&json!({ "message": "Payment deleted successfully" }));
        server
            .delete(&path)
            .add_header(name, value)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
