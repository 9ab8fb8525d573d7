//! Availability rules.
//!
//! Decides whether `(date, time, party_size)` is bookable given the global
//! configuration, the generated slot set, and the seats already booked for
//! the slot. Pure: callers supply all inputs, nothing here touches storage.

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Serialize;
use thiserror::Error;

use crate::models::booking_config::BookingConfig;

/// Why a request is not bookable. Each reason maps to a distinct,
/// actionable message for the caller.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    #[error("online booking is currently disabled")]
    BookingDisabled,

    #[error("date is outside the bookable window")]
    DateOutOfRange,

    #[error("the restaurant is closed on this date")]
    DateClosed,

    #[error("the requested time is not a bookable slot")]
    SlotNotOffered,

    #[error("party size is outside the accepted range")]
    PartySizeInvalid,

    #[error("no seats remain for this time")]
    CapacityExceeded,
}

impl UnavailableReason {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            UnavailableReason::BookingDisabled => "booking_disabled",
            UnavailableReason::DateOutOfRange => "date_out_of_range",
            UnavailableReason::DateClosed => "date_closed",
            UnavailableReason::SlotNotOffered => "slot_not_offered",
            UnavailableReason::PartySizeInvalid => "party_size_invalid",
            UnavailableReason::CapacityExceeded => "capacity_exceeded",
        }
    }
}

/// A single availability decision.
pub type AvailabilityResult = Result<(), UnavailableReason>;

/// Checks date-level rules only: booking enabled, advance window, closures.
///
/// Used by the public slot-listing endpoint, which has no time or party yet.
pub fn check_date(config: &BookingConfig, today: NaiveDate, date: NaiveDate) -> AvailabilityResult {
    if !config.booking_enabled {
        return Err(UnavailableReason::BookingDisabled);
    }

    if date < today || date > today + chrono::Duration::days(config.max_advance_days as i64) {
        return Err(UnavailableReason::DateOutOfRange);
    }

    if config.closed_dates.contains(&date) {
        return Err(UnavailableReason::DateClosed);
    }

    // chrono: Sunday = 0 via num_days_from_sunday, matching config encoding.
    let weekday = date.weekday().num_days_from_sunday() as i32;
    if config.closed_days_of_week.contains(&weekday) {
        return Err(UnavailableReason::DateClosed);
    }

    Ok(())
}

/// Full availability decision for a candidate booking.
///
/// `booked_seats` is the party-size sum over non-cancelled bookings already
/// holding the `(date, time)` slot. The caller is responsible for reading it
/// under whatever isolation makes the check-then-insert atomic.
pub fn check_booking(
    config: &BookingConfig,
    slots: &[NaiveTime],
    today: NaiveDate,
    date: NaiveDate,
    time: NaiveTime,
    party_size: i32,
    booked_seats: i64,
) -> AvailabilityResult {
    check_date(config, today, date)?;

    if !slots.contains(&time) {
        return Err(UnavailableReason::SlotNotOffered);
    }

    if party_size < 1 || party_size > config.max_party_size {
        return Err(UnavailableReason::PartySizeInvalid);
    }

    if booked_seats + party_size as i64 > config.slot_capacity() as i64 {
        return Err(UnavailableReason::CapacityExceeded);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking_config::{test_config, CapacityPolicy};
    use crate::models::service_period::{PeriodType, ServicePeriod};
    use crate::services::slots::generate_slots;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Lunch 12:00-15:00 (last order 14:30) and Dinner 18:00-22:00
    /// (last order 21:30), both at 30-minute intervals.
    fn scenario_slots() -> Vec<NaiveTime> {
        let lunch = ServicePeriod {
            id: 1,
            name: "Lunch".to_string(),
            start_time: t(12, 0),
            end_time: t(15, 0),
            last_order_time: t(14, 30),
            kitchen_closing_time: t(15, 0),
            interval_minutes: 30,
            enabled: true,
            period_type: PeriodType::Lunch,
            sort_order: 0,
        };
        let dinner = ServicePeriod {
            id: 2,
            name: "Dinner".to_string(),
            start_time: t(18, 0),
            end_time: t(22, 0),
            last_order_time: t(21, 30),
            kitchen_closing_time: t(22, 0),
            interval_minutes: 30,
            enabled: true,
            period_type: PeriodType::Dinner,
            sort_order: 1,
        };
        generate_slots(&[lunch, dinner])
    }

    #[test]
    fn test_available_slot_and_party() {
        let config = test_config();
        let slots = scenario_slots();
        let today = d(2025, 6, 1);
        let result = check_booking(&config, &slots, today, d(2025, 6, 10), t(19, 0), 4, 0);
        assert!(result.is_ok());
    }

    #[test]
    fn test_time_between_slots_is_not_offered() {
        // 14:45 falls between lunch last-order and dinner start.
        let config = test_config();
        let slots = scenario_slots();
        let today = d(2025, 6, 1);
        let result = check_booking(&config, &slots, today, d(2025, 6, 10), t(14, 45), 4, 0);
        assert_eq!(result, Err(UnavailableReason::SlotNotOffered));
    }

    #[test]
    fn test_party_size_above_max() {
        let config = test_config(); // max_party_size = 8
        let slots = scenario_slots();
        let today = d(2025, 6, 1);
        let result = check_booking(&config, &slots, today, d(2025, 6, 10), t(19, 0), 9, 0);
        assert_eq!(result, Err(UnavailableReason::PartySizeInvalid));
    }

    #[test]
    fn test_party_size_zero() {
        let config = test_config();
        let slots = scenario_slots();
        let today = d(2025, 6, 1);
        let result = check_booking(&config, &slots, today, d(2025, 6, 10), t(19, 0), 0, 0);
        assert_eq!(result, Err(UnavailableReason::PartySizeInvalid));
    }

    #[test]
    fn test_booking_disabled() {
        let mut config = test_config();
        config.booking_enabled = false;
        let result = check_date(&config, d(2025, 6, 1), d(2025, 6, 10));
        assert_eq!(result, Err(UnavailableReason::BookingDisabled));
    }

    #[test]
    fn test_date_in_past() {
        let config = test_config();
        let result = check_date(&config, d(2025, 6, 10), d(2025, 6, 9));
        assert_eq!(result, Err(UnavailableReason::DateOutOfRange));
    }

    #[test]
    fn test_date_beyond_advance_window() {
        let config = test_config(); // max_advance_days = 60
        let result = check_date(&config, d(2025, 6, 1), d(2025, 8, 1));
        assert_eq!(result, Err(UnavailableReason::DateOutOfRange));
    }

    #[test]
    fn test_date_at_window_edges() {
        let config = test_config();
        assert!(check_date(&config, d(2025, 6, 1), d(2025, 6, 1)).is_ok());
        assert!(check_date(&config, d(2025, 6, 1), d(2025, 7, 31)).is_ok());
    }

    #[test]
    fn test_closed_date() {
        let mut config = test_config();
        config.closed_dates = vec![d(2025, 12, 25)];
        let result = check_date(&config, d(2025, 12, 1), d(2025, 12, 25));
        assert_eq!(result, Err(UnavailableReason::DateClosed));
    }

    #[test]
    fn test_closed_day_of_week() {
        let mut config = test_config();
        config.closed_days_of_week = vec![1]; // Mondays
        let monday = d(2025, 6, 9);
        assert_eq!(monday.weekday(), chrono::Weekday::Mon);
        let result = check_date(&config, d(2025, 6, 1), monday);
        assert_eq!(result, Err(UnavailableReason::DateClosed));
    }

    #[test]
    fn test_capacity_exact_fit() {
        let config = test_config(); // total_seats = 40
        let slots = scenario_slots();
        let today = d(2025, 6, 1);
        // 36 booked + party of 4 exactly fills the pool.
        let ok = check_booking(&config, &slots, today, d(2025, 6, 10), t(19, 0), 4, 36);
        assert!(ok.is_ok());
        // One more seat would overflow.
        let overflow = check_booking(&config, &slots, today, d(2025, 6, 10), t(19, 0), 5, 36);
        assert_eq!(overflow, Err(UnavailableReason::CapacityExceeded));
    }

    #[test]
    fn test_per_slot_capacity_policy() {
        let mut config = test_config();
        config.capacity_policy = CapacityPolicy::PerSlot; // seats_per_slot = 20
        let slots = scenario_slots();
        let today = d(2025, 6, 1);
        let result = check_booking(&config, &slots, today, d(2025, 6, 10), t(19, 0), 5, 16);
        assert_eq!(result, Err(UnavailableReason::CapacityExceeded));
        let ok = check_booking(&config, &slots, today, d(2025, 6, 10), t(19, 0), 4, 16);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_reason_codes_are_distinct() {
        let codes = [
            UnavailableReason::BookingDisabled.code(),
            UnavailableReason::DateOutOfRange.code(),
            UnavailableReason::DateClosed.code(),
            UnavailableReason::SlotNotOffered.code(),
            UnavailableReason::PartySizeInvalid.code(),
            UnavailableReason::CapacityExceeded.code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }
}
