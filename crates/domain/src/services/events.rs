//! Domain events emitted by booking transitions.
//!
//! Events are handed to the dispatcher only after the primary transaction
//! has committed; consuming them must never affect the outcome of the
//! operation that produced them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::booking::Booking;
use crate::models::customer::Customer;

/// Who triggered a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationOrigin {
    Customer,
    Staff,
    DeadlineExpired,
}

/// A booking lifecycle event with the data the dispatcher needs to render
/// notifications and emails without re-reading booking state.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BookingEvent {
    BookingCreated {
        booking: Booking,
        customer: Customer,
        /// Set when the booking was auto-confirmed (no staff review).
        auto_confirmed: bool,
    },
    BookingConfirmed {
        booking: Booking,
        customer: Customer,
    },
    BookingCancelled {
        booking: Booking,
        customer: Customer,
        origin: CancellationOrigin,
    },
    ReconfirmationRequested {
        booking: Booking,
        customer: Customer,
        token: Uuid,
        deadline: DateTime<Utc>,
    },
    BookingReconfirmed {
        booking: Booking,
        customer: Customer,
    },
    NoShowRecorded {
        booking: Booking,
        customer: Customer,
    },
}

impl BookingEvent {
    /// The booking the event concerns.
    pub fn booking(&self) -> &Booking {
        match self {
            BookingEvent::BookingCreated { booking, .. }
            | BookingEvent::BookingConfirmed { booking, .. }
            | BookingEvent::BookingCancelled { booking, .. }
            | BookingEvent::ReconfirmationRequested { booking, .. }
            | BookingEvent::BookingReconfirmed { booking, .. }
            | BookingEvent::NoShowRecorded { booking, .. } => booking,
        }
    }

    /// The customer the event concerns.
    pub fn customer(&self) -> &Customer {
        match self {
            BookingEvent::BookingCreated { customer, .. }
            | BookingEvent::BookingConfirmed { customer, .. }
            | BookingEvent::BookingCancelled { customer, .. }
            | BookingEvent::ReconfirmationRequested { customer, .. }
            | BookingEvent::BookingReconfirmed { customer, .. }
            | BookingEvent::NoShowRecorded { customer, .. } => customer,
        }
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BookingEvent::BookingCreated { .. } => "booking_created",
            BookingEvent::BookingConfirmed { .. } => "booking_confirmed",
            BookingEvent::BookingCancelled { .. } => "booking_cancelled",
            BookingEvent::ReconfirmationRequested { .. } => "reconfirmation_requested",
            BookingEvent::BookingReconfirmed { .. } => "booking_reconfirmed",
            BookingEvent::NoShowRecorded { .. } => "no_show_recorded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::{BookingSource, BookingStatus};
    use crate::models::customer::CustomerSegment;
    use crate::models::deposit::DepositStatus;
    use chrono::{NaiveDate, NaiveTime};

    fn fixture() -> (Booking, Customer) {
        let booking = Booking {
            id: 7,
            customer_id: 3,
            booking_date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            booking_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            party_size: 4,
            status: BookingStatus::Confirmed,
            source: BookingSource::Website,
            special_requests: None,
            booking_reference: "TB-K7M2QX".to_string(),
            cancellation_token: Uuid::new_v4(),
            reconfirmation_token: None,
            reconfirmation_sent_at: None,
            reconfirmation_deadline: None,
            reconfirmation_pending: false,
            payment_intent_id: None,
            deposit_amount_cents: 0,
            deposit_status: DepositStatus::None,
            deposit_refund_cents: 0,
            created_at: Utc::now(),
        };
        let customer = Customer {
            id: 3,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            customer_segment: CustomerSegment::New,
            total_bookings: 1,
            recent_bookings: 1,
            average_party_size: 4.0,
            last_booking_date: Some(booking.booking_date),
            created_at: Utc::now(),
        };
        (booking, customer)
    }

    #[test]
    fn test_event_accessors() {
        let (booking, customer) = fixture();
        let event = BookingEvent::BookingCreated {
            booking: booking.clone(),
            customer: customer.clone(),
            auto_confirmed: true,
        };
        assert_eq!(event.booking().id, 7);
        assert_eq!(event.customer().email, "ada@example.com");
        assert_eq!(event.name(), "booking_created");
    }

    #[test]
    fn test_event_names_are_distinct() {
        let (booking, customer) = fixture();
        let events = vec![
            BookingEvent::BookingCreated {
                booking: booking.clone(),
                customer: customer.clone(),
                auto_confirmed: false,
            },
            BookingEvent::BookingConfirmed {
                booking: booking.clone(),
                customer: customer.clone(),
            },
            BookingEvent::BookingCancelled {
                booking: booking.clone(),
                customer: customer.clone(),
                origin: CancellationOrigin::Customer,
            },
            BookingEvent::ReconfirmationRequested {
                booking: booking.clone(),
                customer: customer.clone(),
                token: Uuid::new_v4(),
                deadline: Utc::now(),
            },
            BookingEvent::BookingReconfirmed {
                booking: booking.clone(),
                customer: customer.clone(),
            },
            BookingEvent::NoShowRecorded { booking, customer },
        ];
        let names: std::collections::HashSet<_> = events.iter().map(|e| e.name()).collect();
        assert_eq!(names.len(), events.len());
    }
}
