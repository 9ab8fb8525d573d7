//! Customer repository.

use sqlx::PgPool;

use crate::entities::CustomerEntity;

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<CustomerEntity>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CustomerEntity>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM customers WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    /// Dashboard listing, most recently active first.
    pub async fn list(&self, limit: i64) -> Result<Vec<CustomerEntity>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM customers
            ORDER BY last_booking_date DESC NULLS LAST, created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}
