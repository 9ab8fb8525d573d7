//! Customer segmentation.
//!
//! The segment is derived from booking history and recomputed after every
//! booking mutation; it is never user-settable.

use chrono::NaiveDate;

use crate::models::customer::CustomerSegment;

/// Bookings needed before a customer stops being `new`.
const REGULAR_MIN_BOOKINGS: i32 = 3;

/// Bookings needed for `vip`.
const VIP_MIN_BOOKINGS: i32 = 10;

/// Days without a booking before a previously active customer is `inactive`.
const INACTIVE_AFTER_DAYS: i64 = 365;

/// Classifies a customer from booking history.
///
/// Rules, in order:
/// - no completed history or below the regular threshold -> `new`
/// - last booking older than a year -> `inactive`
/// - at or above the VIP threshold -> `vip`
/// - otherwise -> `regular`
pub fn classify(
    total_bookings: i32,
    last_booking_date: Option<NaiveDate>,
    today: NaiveDate,
) -> CustomerSegment {
    if total_bookings < REGULAR_MIN_BOOKINGS {
        return CustomerSegment::New;
    }

    if let Some(last) = last_booking_date {
        if today.signed_duration_since(last).num_days() > INACTIVE_AFTER_DAYS {
            return CustomerSegment::Inactive;
        }
    }

    if total_bookings >= VIP_MIN_BOOKINGS {
        CustomerSegment::Vip
    } else {
        CustomerSegment::Regular
    }
}
