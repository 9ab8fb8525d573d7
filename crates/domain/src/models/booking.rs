//! Booking domain model and lifecycle guards.
//!
//! The booking lifecycle is `pending -> confirmed -> completed/no_show`,
//! with cancellation reachable from both live states. Large parties also
//! carry a reconfirmation flag on top of `confirmed`; the flag never
//! introduces a separate persisted state.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::deposit::DepositStatus;

/// Lifecycle state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
            BookingStatus::NoShow => "no_show",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "completed" => Some(BookingStatus::Completed),
            "no_show" => Some(BookingStatus::NoShow),
            _ => None,
        }
    }

    /// Whether the lifecycle permits moving from `self` to `target`.
    pub fn can_transition_to(&self, target: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, target),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Confirmed, Completed)
                | (Confirmed, NoShow)
        )
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Cancelled | BookingStatus::Completed | BookingStatus::NoShow
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a booking originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingSource {
    Website,
    Dashboard,
}

impl BookingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingSource::Website => "website",
            BookingSource::Dashboard => "dashboard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "website" => Some(BookingSource::Website),
            "dashboard" => Some(BookingSource::Dashboard),
            _ => None,
        }
    }
}

/// Represents a reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Booking {
    pub id: i64,
    pub customer_id: i64,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub party_size: i32,
    pub status: BookingStatus,
    pub source: BookingSource,
    pub special_requests: Option<String>,
    pub booking_reference: String,
    pub cancellation_token: Uuid,
    pub reconfirmation_token: Option<Uuid>,
    pub reconfirmation_sent_at: Option<DateTime<Utc>>,
    pub reconfirmation_deadline: Option<DateTime<Utc>>,
    /// Reconfirmation was requested and the customer has not yet answered.
    pub reconfirmation_pending: bool,
    pub payment_intent_id: Option<String>,
    pub deposit_amount_cents: i64,
    pub deposit_status: DepositStatus,
    pub deposit_refund_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Whether the reconfirmation deadline has passed at `now`. The deadline
    /// instant itself counts as expired, matching the `deadline > now`
    /// predicate the conditional updates use.
    pub fn reconfirmation_expired(&self, now: DateTime<Utc>) -> bool {
        match self.reconfirmation_deadline {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }
}

/// Request payload for creating a booking from the public website.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    #[validate(custom(function = "shared::validation::validate_guest_name"))]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub phone: Option<String>,

    /// `YYYY-MM-DD`.
    pub date: String,

    /// `HH:MM`, 24h clock.
    pub time: String,

    #[validate(range(min = 1, message = "Party size must be at least 1"))]
    pub party_size: i32,

    #[validate(length(max = 500, message = "Special requests must be at most 500 characters"))]
    pub special_requests: Option<String>,
}

/// Response payload after a successful creation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    pub success: bool,
    pub booking_id: i64,
    pub booking_reference: String,
    pub status: BookingStatus,
}

/// Public detail view returned by the token lookup endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetailResponse {
    pub booking_reference: String,
    pub date: String,
    pub time: String,
    pub party_size: i32,
    pub status: BookingStatus,
    pub special_requests: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconfirmation_deadline: Option<DateTime<Utc>>,
}

impl BookingDetailResponse {
    pub fn from_booking(b: &Booking) -> Self {
        Self {
            booking_reference: b.booking_reference.clone(),
            date: b.booking_date.format("%Y-%m-%d").to_string(),
            time: shared::validation::format_slot(b.booking_time),
            party_size: b.party_size,
            status: b.status,
            special_requests: b.special_requests.clone(),
            reconfirmation_deadline: b.reconfirmation_deadline,
        }
    }
}

/// Customer's answer to a reconfirmation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconfirmAction {
    Confirm,
    Cancel,
}

/// Request payload for the reconfirmation answer endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconfirmRequest {
    pub action: ReconfirmAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(NoShow));
    }

    #[test]
    fn test_illegal_transitions() {
        use BookingStatus::*;
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(NoShow));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!NoShow.can_transition_to(Confirmed));
    }

    #[test]
    fn test_terminal_states() {
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::NoShow.is_terminal());
        assert!(!BookingStatus::Pending.is_terminal());
        assert!(!BookingStatus::Confirmed.is_terminal());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
            BookingStatus::NoShow,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("seated"), None);
    }

    #[test]
    fn test_create_request_deserializes_camel_case() {
        let json = r#"{
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "date": "2025-06-15",
            "time": "19:00",
            "partySize": 4
        }"#;
        let request: CreateBookingRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.party_size, 4);
        assert!(request.phone.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_request_accepts_generated_contact_details() {
        use fake::faker::internet::en::SafeEmail;
        use fake::faker::name::en::Name;
        use fake::Fake;

        for _ in 0..20 {
            let request = CreateBookingRequest {
                name: Name().fake(),
                email: SafeEmail().fake(),
                phone: None,
                date: "2025-06-15".to_string(),
                time: "19:00".to_string(),
                party_size: 2,
                special_requests: None,
            };
            assert!(request.validate().is_ok());
        }
    }

    #[test]
    fn test_create_request_rejects_bad_email() {
        let json = r#"{
            "name": "Ada",
            "email": "not-an-email",
            "date": "2025-06-15",
            "time": "19:00",
            "partySize": 2
        }"#;
        let request: CreateBookingRequest = serde_json::from_str(json).unwrap();
        assert!(request.validate().is_err());
    }

    fn booking_with_deadline(deadline: Option<DateTime<Utc>>) -> Booking {
        Booking {
            id: 1,
            customer_id: 1,
            booking_date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
            booking_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            party_size: 6,
            status: BookingStatus::Confirmed,
            source: BookingSource::Website,
            special_requests: None,
            booking_reference: "TB-ABC234".to_string(),
            cancellation_token: Uuid::new_v4(),
            reconfirmation_token: Some(Uuid::new_v4()),
            reconfirmation_sent_at: Some(Utc::now()),
            reconfirmation_deadline: deadline,
            reconfirmation_pending: true,
            payment_intent_id: None,
            deposit_amount_cents: 0,
            deposit_status: DepositStatus::None,
            deposit_refund_cents: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_reconfirmation_expired_before_deadline() {
        let deadline = Utc::now();
        let booking = booking_with_deadline(Some(deadline));
        assert!(!booking.reconfirmation_expired(deadline - chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_reconfirmation_expired_at_deadline() {
        // The boundary instant is expired so the service and the SQL
        // predicate agree on which error the customer sees.
        let deadline = Utc::now();
        let booking = booking_with_deadline(Some(deadline));
        assert!(booking.reconfirmation_expired(deadline));
    }

    #[test]
    fn test_reconfirmation_expired_after_deadline() {
        let deadline = Utc::now();
        let booking = booking_with_deadline(Some(deadline));
        assert!(booking.reconfirmation_expired(deadline + chrono::Duration::hours(1)));
    }

    #[test]
    fn test_reconfirmation_expired_without_deadline() {
        let booking = booking_with_deadline(None);
        assert!(!booking.reconfirmation_expired(Utc::now()));
    }

    #[test]
    fn test_reconfirm_action_deserialization() {
        let request: ReconfirmRequest = serde_json::from_str(r#"{"action":"confirm"}"#).unwrap();
        assert_eq!(request.action, ReconfirmAction::Confirm);
        let request: ReconfirmRequest = serde_json::from_str(r#"{"action":"cancel"}"#).unwrap();
        assert_eq!(request.action, ReconfirmAction::Cancel);
    }
}
