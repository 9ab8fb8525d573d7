//! Email outbox repository.
//!
//! Delivery is at-least-once: a `pending` row is written before the
//! transport is called, then flipped to `sent` or `failed`. The retry sweep
//! picks up failed rows and pending rows old enough to be crash leftovers.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::email_log::{
    EmailLogEntity, EMAIL_MAX_ATTEMPTS, EMAIL_STUCK_AFTER_SECS, STATUS_FAILED, STATUS_PENDING,
    STATUS_SENT,
};

#[derive(Clone)]
pub struct EmailLogRepository {
    pool: PgPool,
}

impl EmailLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Logs an email as `pending` before any send attempt. The rendered
    /// payload is stored so a retry resends exactly what was composed.
    pub async fn create_pending(
        &self,
        template_key: &str,
        recipient: &str,
        payload: &serde_json::Value,
        booking_id: Option<i64>,
    ) -> Result<EmailLogEntity, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO email_log (email_id, template_key, recipient, payload, status, booking_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(template_key)
        .bind(recipient)
        .bind(payload)
        .bind(STATUS_PENDING)
        .bind(booking_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn mark_sent(
        &self,
        email_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<Option<EmailLogEntity>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE email_log
            SET status = $2, sent_at = $3, last_error = NULL
            WHERE email_id = $1
            RETURNING *
            "#,
        )
        .bind(email_id)
        .bind(STATUS_SENT)
        .bind(sent_at)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn mark_failed(
        &self,
        email_id: Uuid,
        error: &str,
    ) -> Result<Option<EmailLogEntity>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE email_log
            SET status = $2, attempts = attempts + 1, last_error = $3
            WHERE email_id = $1
            RETURNING *
            "#,
        )
        .bind(email_id)
        .bind(STATUS_FAILED)
        .bind(error)
        .fetch_optional(&self.pool)
        .await
    }

    /// Rows the retry sweep should attempt: failures under the attempt cap,
    /// plus pending rows old enough that the original sender must have
    /// crashed between logging and sending.
    pub async fn find_retryable(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<EmailLogEntity>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM email_log
            WHERE (status = $1 AND attempts < $2)
               OR (status = $3 AND created_at < $4)
            ORDER BY created_at
            LIMIT $5
            "#,
        )
        .bind(STATUS_FAILED)
        .bind(EMAIL_MAX_ATTEMPTS)
        .bind(STATUS_PENDING)
        .bind(now - chrono::Duration::seconds(EMAIL_STUCK_AFTER_SECS))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Recent outbox entries for the dashboard.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<EmailLogEntity>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM email_log ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }
}
