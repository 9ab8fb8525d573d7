//! Customer domain model.
//!
//! Customers are created implicitly on first booking (upsert by email) and
//! never hard-deleted while bookings reference them. The segment is a
//! derived classification; see `services::segments` for the rules.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Derived customer classification, recomputed from booking history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSegment {
    New,
    Regular,
    Vip,
    Inactive,
}

impl CustomerSegment {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerSegment::New => "new",
            CustomerSegment::Regular => "regular",
            CustomerSegment::Vip => "vip",
            CustomerSegment::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(CustomerSegment::New),
            "regular" => Some(CustomerSegment::Regular),
            "vip" => Some(CustomerSegment::Vip),
            "inactive" => Some(CustomerSegment::Inactive),
            _ => None,
        }
    }
}

impl std::fmt::Display for CustomerSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a customer in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub customer_segment: CustomerSegment,
    pub total_bookings: i32,
    /// Bookings within the recency window used by segmentation.
    pub recent_bookings: i32,
    pub average_party_size: f64,
    pub last_booking_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}
