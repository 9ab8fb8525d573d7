//! Staff notification domain model.
//!
//! Notifications are created by the dispatcher as a side effect of booking
//! transitions and only ever mutated (read/dismissed) by staff.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    BookingCreated,
    BookingConfirmed,
    BookingCancelled,
    ReconfirmationRequested,
    BookingReconfirmed,
    NoShowRecorded,
    DepositCaptured,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::BookingCreated => "booking_created",
            NotificationType::BookingConfirmed => "booking_confirmed",
            NotificationType::BookingCancelled => "booking_cancelled",
            NotificationType::ReconfirmationRequested => "reconfirmation_requested",
            NotificationType::BookingReconfirmed => "booking_reconfirmed",
            NotificationType::NoShowRecorded => "no_show_recorded",
            NotificationType::DepositCaptured => "deposit_captured",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "booking_created" => Some(NotificationType::BookingCreated),
            "booking_confirmed" => Some(NotificationType::BookingConfirmed),
            "booking_cancelled" => Some(NotificationType::BookingCancelled),
            "reconfirmation_requested" => Some(NotificationType::ReconfirmationRequested),
            "booking_reconfirmed" => Some(NotificationType::BookingReconfirmed),
            "no_show_recorded" => Some(NotificationType::NoShowRecorded),
            "deposit_captured" => Some(NotificationType::DepositCaptured),
            _ => None,
        }
    }
}

/// Display priority in the staff dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Normal => "normal",
            NotificationPriority::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(NotificationPriority::Low),
            "normal" => Some(NotificationPriority::Normal),
            "high" => Some(NotificationPriority::High),
            _ => None,
        }
    }
}

/// A staff-facing notification row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Notification {
    pub id: i64,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub booking_id: Option<i64>,
    pub action_url: Option<String>,
    pub read: bool,
    pub dismissed: bool,
    pub created_at: DateTime<Utc>,
}
