//! Slot generation from service periods.
//!
//! Translates enabled service periods into the finite set of bookable
//! `HH:MM` slots. Pure and deterministic: the same period set always yields
//! the same slot sequence, so the cached `available_times` projection can be
//! rebuilt at any time.

use std::collections::BTreeSet;

use chrono::NaiveTime;

use crate::models::service_period::ServicePeriod;

/// Generates the ordered, de-duplicated slot sequence for a set of periods.
///
/// For each enabled period, emits a slot at `start_time` and every
/// `interval_minutes` after it while the running time is `<= last_order_time`
/// (inclusive: an order placed exactly at last-order time is valid).
/// Overlapping periods union without duplicates. Disabled periods and
/// periods failing their time invariants contribute nothing.
pub fn generate_slots(periods: &[ServicePeriod]) -> Vec<NaiveTime> {
    let mut slots = BTreeSet::new();

    let mut ordered: Vec<&ServicePeriod> = periods.iter().filter(|p| p.enabled).collect();
    ordered.sort_by_key(|p| p.sort_order);

    for period in ordered {
        if period.validate_times().is_err() {
            continue;
        }
        let start = minutes_of_day(period.start_time);
        let last_order = minutes_of_day(period.last_order_time);
        let interval = period.interval_minutes as u32;

        let mut cursor = start;
        while cursor <= last_order {
            slots.insert(cursor);
            cursor += interval;
        }
    }

    slots.into_iter().filter_map(time_from_minutes).collect()
}

/// Formats generated slots as canonical `HH:MM` strings.
pub fn generate_slot_strings(periods: &[ServicePeriod]) -> Vec<String> {
    generate_slots(periods)
        .into_iter()
        .map(shared::validation::format_slot)
        .collect()
}

fn minutes_of_day(time: NaiveTime) -> u32 {
    use chrono::Timelike;
    time.hour() * 60 + time.minute()
}

fn time_from_minutes(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}
