//! Staff notification repository.

use sqlx::PgPool;

use crate::entities::NotificationEntity;

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        notification_type: &str,
        title: &str,
        message: &str,
        priority: &str,
        booking_id: Option<i64>,
        action_url: Option<&str>,
    ) -> Result<NotificationEntity, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO notifications (
                notification_type, title, message, priority, booking_id, action_url
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(notification_type)
        .bind(title)
        .bind(message)
        .bind(priority)
        .bind(booking_id)
        .bind(action_url)
        .fetch_one(&self.pool)
        .await
    }

    /// Feed for the dashboard bell. Dismissed entries never show up.
    pub async fn list(
        &self,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<NotificationEntity>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM notifications
            WHERE NOT dismissed AND ($1 = FALSE OR read = FALSE)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn unread_count(&self) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*)::BIGINT FROM notifications WHERE NOT read AND NOT dismissed",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    pub async fn mark_read(&self, id: i64) -> Result<Option<NotificationEntity>, sqlx::Error> {
        sqlx::query_as("UPDATE notifications SET read = TRUE WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn mark_all_read(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE NOT read")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn dismiss(&self, id: i64) -> Result<Option<NotificationEntity>, sqlx::Error> {
        sqlx::query_as(
            "UPDATE notifications SET dismissed = TRUE, read = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}
