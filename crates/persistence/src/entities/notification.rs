//! Staff notification entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::notification::{Notification, NotificationPriority, NotificationType};

/// Database row mapping for the notifications table.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationEntity {
    pub id: i64,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub priority: String,
    pub booking_id: Option<i64>,
    pub action_url: Option<String>,
    pub read: bool,
    pub dismissed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationEntity> for Notification {
    fn from(entity: NotificationEntity) -> Self {
        Self {
            id: entity.id,
            notification_type: NotificationType::parse(&entity.notification_type)
                .unwrap_or(NotificationType::BookingCreated),
            title: entity.title,
            message: entity.message,
            priority: NotificationPriority::parse(&entity.priority)
                .unwrap_or(NotificationPriority::Normal),
            booking_id: entity.booking_id,
            action_url: entity.action_url,
            read: entity.read,
            dismissed: entity.dismissed,
            created_at: entity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_domain() {
        let entity = NotificationEntity {
            id: 1,
            notification_type: "booking_cancelled".to_string(),
            title: "Booking cancelled".to_string(),
            message: "TB-K7M2QX was cancelled by the customer".to_string(),
            priority: "high".to_string(),
            booking_id: Some(7),
            action_url: Some("/dashboard/bookings/7".to_string()),
            read: false,
            dismissed: false,
            created_at: Utc::now(),
        };
        let notification: Notification = entity.into();
        assert_eq!(
            notification.notification_type,
            NotificationType::BookingCancelled
        );
        assert_eq!(notification.priority, NotificationPriority::High);
    }
}
