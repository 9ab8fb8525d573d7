//! Deposit transaction ledger repository. Append-only.

use sqlx::PgPool;

use crate::entities::DepositTransactionEntity;

#[derive(Clone)]
pub struct DepositTransactionRepository {
    pool: PgPool,
}

impl DepositTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends a ledger row. Called only after the gateway call succeeded,
    /// so the ledger never records money movements that did not happen.
    pub async fn append(
        &self,
        booking_id: i64,
        action: &str,
        amount_cents: i64,
        reason: Option<&str>,
        actor: &str,
    ) -> Result<DepositTransactionEntity, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO deposit_transactions (booking_id, action, amount_cents, reason, actor)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(booking_id)
        .bind(action)
        .bind(amount_cents)
        .bind(reason)
        .bind(actor)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_for_booking(
        &self,
        booking_id: i64,
    ) -> Result<Vec<DepositTransactionEntity>, sqlx::Error> {
        sqlx::query_as(
            "SELECT * FROM deposit_transactions WHERE booking_id = $1 ORDER BY created_at",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await
    }
}
