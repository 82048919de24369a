//! Database repository for fee payments.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::payments::{PaymentCreateDBRequest, PaymentDBResponse, PaymentFilter},
    },
    types::PaymentId,
};

/// Payments joined with their student. The join is a LEFT JOIN so payments for students that have
/// since been removed are still listed, with a null name and roll number.
const PAYMENT_SELECT: &str = "SELECT p.id, p.student_id, p.amount, p.payment_date, p.payment_type, p.status, p.created_at,
        s.name AS student_name, s.roll_number AS roll_number
     FROM payments p
     LEFT JOIN students s ON p.student_id = s.id";

pub struct Payments<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Payments<'c> {
    type CreateRequest = PaymentCreateDBRequest;
    type Response = PaymentDBResponse;
    type Id = PaymentId;
    type Filter = PaymentFilter;

    /// Record a payment. New payments are always pending.
    #[instrument(skip(self, request), fields(student_id = request.student_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id: PaymentId = sqlx::query_scalar(
            "INSERT INTO payments (student_id, amount, payment_date, payment_type, status, created_at)
             VALUES (?, ?, ?, ?, 'pending', ?)
             RETURNING id",
        )
        .bind(request.student_id)
        .bind(request.amount)
        .bind(request.payment_date)
        .bind(&request.payment_type)
        .bind(Utc::now())
        .fetch_one(&mut *self.db)
        .await?;

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let payment = sqlx::query_as::<_, PaymentDBResponse>(&format!("{PAYMENT_SELECT} WHERE p.id = ?"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(payment)
    }

    /// Most recently recorded first.
    #[instrument(skip(self, filter), fields(status = ?filter.status, student_id = ?filter.student_id), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = String::from(PAYMENT_SELECT);
        let mut conditions = Vec::new();

        if filter.status.is_some() {
            conditions.push("p.status = ?");
        }
        if filter.student_id.is_some() {
            conditions.push("p.student_id = ?");
        }

        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }
        query.push_str(" ORDER BY p.created_at DESC, p.id DESC");

        let mut sql_query = sqlx::query_as::<_, PaymentDBResponse>(&query);
        if let Some(status) = &filter.status {
            sql_query = sql_query.bind(status);
        }
        if let Some(student_id) = filter.student_id {
            sql_query = sql_query.bind(student_id);
        }

        Ok(sql_query.fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM payments WHERE id = ?").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> Payments<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Set a payment's status. Any string is stored as given. Returns false if the payment is unknown.
    #[instrument(skip(self), err)]
    pub async fn update_status(&mut self, id: PaymentId, status: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE payments SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::handlers::Students,
        test_utils::{create_test_room, create_test_student, payment_request},
    };
    use sqlx::SqlitePool;

    #[sqlx::test]
    async fn test_create_payment_defaults(pool: SqlitePool) {
        create_test_room(&pool, "101", 2).await;
        let student = create_test_student(&pool, "R-A", "101").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Payments::new(&mut conn);
        let request = payment_request(student.id, 1500.0);
        let payment = repo.create(&request).await.unwrap();

        assert_eq!(payment.status, "pending");
        assert_eq!(payment.amount, 1500.0);
        assert_eq!(payment.payment_date, request.payment_date);
        assert_eq!(payment.student_name.as_deref(), Some(student.name.as_str()));
        assert_eq!(payment.roll_number.as_deref(), Some("R-A"));
    }

    #[sqlx::test]
    async fn test_orphaned_payment_still_listed(pool: SqlitePool) {
        create_test_room(&pool, "101", 2).await;
        let student = create_test_student(&pool, "R-A", "101").await;

        let mut conn = pool.acquire().await.unwrap();
        Payments::new(&mut conn).create(&payment_request(student.id, 800.0)).await.unwrap();
        assert!(Students::new(&mut conn).delete(student.id).await.unwrap());

        let payments = Payments::new(&mut conn).list(&PaymentFilter::default()).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].student_id, student.id);
        assert!(payments[0].student_name.is_none());
        assert!(payments[0].roll_number.is_none());
    }

    #[sqlx::test]
    async fn test_list_order_and_filters(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Payments::new(&mut conn);

        let first = repo.create(&payment_request(1, 100.0)).await.unwrap();
        let second = repo.create(&payment_request(2, 200.0)).await.unwrap();
        let third = repo.create(&payment_request(1, 300.0)).await.unwrap();
        assert!(repo.update_status(second.id, "paid").await.unwrap());

        let ids: Vec<_> = repo.list(&PaymentFilter::default()).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);

        let pending = repo
            .list(&PaymentFilter {
                status: Some("pending".to_string()),
                student_id: None,
            })
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);

        let for_student = repo
            .list(&PaymentFilter {
                status: Some("pending".to_string()),
                student_id: Some(1),
            })
            .await
            .unwrap();
        assert_eq!(for_student.len(), 2);
    }

    #[sqlx::test]
    async fn test_update_status_accepts_any_string(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Payments::new(&mut conn);

        let payment = repo.create(&payment_request(1, 100.0)).await.unwrap();
        assert!(repo.update_status(payment.id, "waived").await.unwrap());
        assert_eq!(repo.get_by_id(payment.id).await.unwrap().unwrap().status, "waived");

        assert!(!repo.update_status(9999, "paid").await.unwrap());
    }

    #[sqlx::test]
    async fn test_delete_payment(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Payments::new(&mut conn);

        let payment = repo.create(&payment_request(1, 100.0)).await.unwrap();
        assert!(repo.delete(payment.id).await.unwrap());
        assert!(!repo.delete(payment.id).await.unwrap());
    }
}
