//! Booking entity (database row mapping).

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::booking::{Booking, BookingSource, BookingStatus};
use domain::models::deposit::DepositStatus;

/// Database row mapping for the bookings table.
#[derive(Debug, Clone, FromRow)]
pub struct BookingEntity {
    pub id: i64,
    pub customer_id: i64,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub party_size: i32,
    pub status: String,
    pub source: String,
    pub special_requests: Option<String>,
    pub booking_reference: String,
    pub cancellation_token: Uuid,
    pub reconfirmation_token: Option<Uuid>,
    pub reconfirmation_sent_at: Option<DateTime<Utc>>,
    pub reconfirmation_deadline: Option<DateTime<Utc>>,
    pub reconfirmation_pending: bool,
    pub payment_intent_id: Option<String>,
    pub deposit_amount_cents: i64,
    pub deposit_status: String,
    pub deposit_refund_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl From<BookingEntity> for Booking {
    fn from(entity: BookingEntity) -> Self {
        Self {
            id: entity.id,
            customer_id: entity.customer_id,
            booking_date: entity.booking_date,
            booking_time: entity.booking_time,
            party_size: entity.party_size,
            status: BookingStatus::parse(&entity.status).unwrap_or(BookingStatus::Pending),
            source: BookingSource::parse(&entity.source).unwrap_or(BookingSource::Website),
            special_requests: entity.special_requests,
            booking_reference: entity.booking_reference,
            cancellation_token: entity.cancellation_token,
            reconfirmation_token: entity.reconfirmation_token,
            reconfirmation_sent_at: entity.reconfirmation_sent_at,
            reconfirmation_deadline: entity.reconfirmation_deadline,
            reconfirmation_pending: entity.reconfirmation_pending,
            payment_intent_id: entity.payment_intent_id,
            deposit_amount_cents: entity.deposit_amount_cents,
            deposit_status: DepositStatus::parse(&entity.deposit_status)
                .unwrap_or(DepositStatus::None),
            deposit_refund_cents: entity.deposit_refund_cents,
            created_at: entity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> BookingEntity {
        BookingEntity {
            id: 1,
            customer_id: 2,
            booking_date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            booking_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            party_size: 4,
            status: "confirmed".to_string(),
            source: "website".to_string(),
            special_requests: Some("window table".to_string()),
            booking_reference: "TB-K7M2QX".to_string(),
            cancellation_token: Uuid::new_v4(),
            reconfirmation_token: None,
            reconfirmation_sent_at: None,
            reconfirmation_deadline: None,
            reconfirmation_pending: false,
            payment_intent_id: None,
            deposit_amount_cents: 0,
            deposit_status: "none".to_string(),
            deposit_refund_cents: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_conversion_to_domain() {
        let booking: Booking = entity().into();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.source, BookingSource::Website);
        assert_eq!(booking.deposit_status, DepositStatus::None);
        assert_eq!(booking.booking_reference, "TB-K7M2QX");
    }

    #[test]
    fn test_unknown_status_falls_back_to_pending() {
        let mut e = entity();
        e.status = "seated".to_string();
        let booking: Booking = e.into();
        assert_eq!(booking.status, BookingStatus::Pending);
    }
}
