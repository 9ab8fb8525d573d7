//! Email outbox entity (database row mapping).
//!
//! Every email attempt is logged in `pending` status before the transport is
//! called, so a crash mid-send leaves a reclaimable row behind.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the email_log table.
#[derive(Debug, Clone, FromRow)]
pub struct EmailLogEntity {
    pub id: i64,
    pub email_id: Uuid,
    pub template_key: String,
    pub recipient: String,
    /// Rendered payload: `{subject, body_text, body_html?}`.
    pub payload: serde_json::Value,
    pub status: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub booking_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// Outbox status values.
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_SENT: &str = "sent";
pub const STATUS_FAILED: &str = "failed";

/// A `pending` entry older than this is treated as a crash mid-send and
/// reclaimed by the sweep.
pub const EMAIL_STUCK_AFTER_SECS: i64 = 120;

/// Failed entries are retried by the sweep until this many attempts.
pub const EMAIL_MAX_ATTEMPTS: i32 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_constants() {
        assert_eq!(STATUS_PENDING, "pending");
        assert_eq!(STATUS_SENT, "sent");
        assert_eq!(STATUS_FAILED, "failed");
    }

    #[test]
    fn test_sweep_constants() {
        // Stuck threshold is 2 minutes; the sweep runs every 5.
        assert_eq!(EMAIL_STUCK_AFTER_SECS, 120);
        assert!(EMAIL_MAX_ATTEMPTS >= 1);
    }
}
