//! Global booking configuration.
//!
//! A singleton record mutated by staff; read by the availability engine and
//! the booking lifecycle. Capacity allocation is an explicit policy choice,
//! never a hard-coded formula.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// How seats are allocated across time slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityPolicy {
    /// All slots draw from the restaurant-wide pool of `total_seats`.
    SharedPool,
    /// Each slot has its own sub-allocation of `seats_per_slot`.
    PerSlot,
}

impl CapacityPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapacityPolicy::SharedPool => "shared_pool",
            CapacityPolicy::PerSlot => "per_slot",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "shared_pool" => Some(CapacityPolicy::SharedPool),
            "per_slot" => Some(CapacityPolicy::PerSlot),
            _ => None,
        }
    }
}

/// Global booking settings (singleton).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BookingConfig {
    pub booking_enabled: bool,
    pub max_advance_days: i32,
    pub max_party_size: i32,
    pub total_seats: i32,
    pub capacity_policy: CapacityPolicy,
    /// Per-slot allocation; only consulted under `CapacityPolicy::PerSlot`.
    pub seats_per_slot: i32,
    pub closed_dates: Vec<NaiveDate>,
    /// Days of week the restaurant is closed, 0 = Sunday .. 6 = Saturday.
    pub closed_days_of_week: Vec<i32>,
    pub suspension_message: Option<String>,
    /// When true, new bookings start in `pending` and need staff review.
    pub require_review: bool,
    pub reconfirmation_min_party_size: i32,
    pub reconfirmation_days_before: i32,
    pub reconfirmation_deadline_hours: i32,
    /// Parties at or above this size require a deposit authorization.
    pub deposit_min_party_size: i32,
    pub deposit_amount_cents: i64,
}

impl BookingConfig {
    /// The seat budget for a single `(date, time)` slot under the
    /// configured allocation policy.
    pub fn slot_capacity(&self) -> i32 {
        match self.capacity_policy {
            CapacityPolicy::SharedPool => self.total_seats,
            CapacityPolicy::PerSlot => self.seats_per_slot,
        }
    }

    /// Whether a party of this size requires a deposit authorization.
    pub fn requires_deposit(&self, party_size: i32) -> bool {
        self.deposit_min_party_size > 0 && party_size >= self.deposit_min_party_size
    }

    /// Whether a party of this size qualifies for the pre-arrival
    /// reconfirmation flow.
    pub fn requires_reconfirmation(&self, party_size: i32) -> bool {
        self.reconfirmation_min_party_size > 0 && party_size >= self.reconfirmation_min_party_size
    }
}

/// Request payload for updating the booking configuration (staff only).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateBookingConfigRequest {
    pub booking_enabled: Option<bool>,
    #[validate(range(min = 0, max = 365, message = "max_advance_days must be 0-365"))]
    pub max_advance_days: Option<i32>,
    #[validate(range(min = 1, max = 100, message = "max_party_size must be 1-100"))]
    pub max_party_size: Option<i32>,
    #[validate(range(min = 1, max = 1000, message = "total_seats must be 1-1000"))]
    pub total_seats: Option<i32>,
    pub capacity_policy: Option<CapacityPolicy>,
    #[validate(range(min = 1, max = 1000, message = "seats_per_slot must be 1-1000"))]
    pub seats_per_slot: Option<i32>,
    pub closed_dates: Option<Vec<NaiveDate>>,
    pub closed_days_of_week: Option<Vec<i32>>,
    pub suspension_message: Option<String>,
    pub require_review: Option<bool>,
    #[validate(range(min = 0, max = 100))]
    pub reconfirmation_min_party_size: Option<i32>,
    #[validate(range(min = 0, max = 30))]
    pub reconfirmation_days_before: Option<i32>,
    #[validate(range(min = 1, max = 168))]
    pub reconfirmation_deadline_hours: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub deposit_min_party_size: Option<i32>,
    #[validate(range(min = 0))]
    pub deposit_amount_cents: Option<i64>,
}

impl UpdateBookingConfigRequest {
    /// Days of week must be 0..=6 when provided.
    pub fn validate_days_of_week(&self) -> Result<(), String> {
        if let Some(ref days) = self.closed_days_of_week {
            if days.iter().any(|d| !(0..=6).contains(d)) {
                return Err("closed_days_of_week entries must be 0-6".to_string());
            }
        }
        Ok(())
    }
}

/// A representative configuration for unit tests across the crate.
#[cfg(test)]
pub fn test_config() -> BookingConfig {
    BookingConfig {
        booking_enabled: true,
        max_advance_days: 60,
        max_party_size: 8,
        total_seats: 40,
        capacity_policy: CapacityPolicy::SharedPool,
        seats_per_slot: 20,
        closed_dates: vec![],
        closed_days_of_week: vec![],
        suspension_message: None,
        require_review: false,
        reconfirmation_min_party_size: 6,
        reconfirmation_days_before: 2,
        reconfirmation_deadline_hours: 24,
        deposit_min_party_size: 6,
        deposit_amount_cents: 5000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_capacity_shared_pool() {
        let config = test_config();
        assert_eq!(config.slot_capacity(), 40);
    }

    #[test]
    fn test_slot_capacity_per_slot() {
        let mut config = test_config();
        config.capacity_policy = CapacityPolicy::PerSlot;
        assert_eq!(config.slot_capacity(), 20);
    }

    #[test]
    fn test_requires_deposit_threshold() {
        let config = test_config();
        assert!(!config.requires_deposit(5));
        assert!(config.requires_deposit(6));
        assert!(config.requires_deposit(8));
    }

    #[test]
    fn test_deposit_disabled_when_threshold_zero() {
        let mut config = test_config();
        config.deposit_min_party_size = 0;
        assert!(!config.requires_deposit(10));
    }

    #[test]
    fn test_requires_reconfirmation_threshold() {
        let config = test_config();
        assert!(!config.requires_reconfirmation(5));
        assert!(config.requires_reconfirmation(6));
    }

    #[test]
    fn test_capacity_policy_round_trip() {
        for policy in [CapacityPolicy::SharedPool, CapacityPolicy::PerSlot] {
            assert_eq!(CapacityPolicy::parse(policy.as_str()), Some(policy));
        }
        assert_eq!(CapacityPolicy::parse("overbook"), None);
    }

    #[test]
    fn test_update_request_rejects_bad_day_of_week() {
        let request = UpdateBookingConfigRequest {
            booking_enabled: None,
            max_advance_days: None,
            max_party_size: None,
            total_seats: None,
            capacity_policy: None,
            seats_per_slot: None,
            closed_dates: None,
            closed_days_of_week: Some(vec![0, 7]),
            suspension_message: None,
            require_review: None,
            reconfirmation_min_party_size: None,
            reconfirmation_days_before: None,
            reconfirmation_deadline_hours: None,
            deposit_min_party_size: None,
            deposit_amount_cents: None,
        };
        assert!(request.validate_days_of_week().is_err());
    }
}
