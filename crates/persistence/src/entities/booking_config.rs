//! Booking configuration entity (singleton row mapping).

use chrono::NaiveDate;
use sqlx::FromRow;

use domain::models::booking_config::{BookingConfig, CapacityPolicy};

/// Database row mapping for the booking_config table (single row, id = 1).
#[derive(Debug, Clone, FromRow)]
pub struct BookingConfigEntity {
    pub id: i32,
    pub booking_enabled: bool,
    pub max_advance_days: i32,
    pub max_party_size: i32,
    pub total_seats: i32,
    pub capacity_policy: String,
    pub seats_per_slot: i32,
    pub closed_dates: Vec<NaiveDate>,
    pub closed_days_of_week: Vec<i32>,
    pub suspension_message: Option<String>,
    pub require_review: bool,
    pub reconfirmation_min_party_size: i32,
    pub reconfirmation_days_before: i32,
    pub reconfirmation_deadline_hours: i32,
    pub deposit_min_party_size: i32,
    pub deposit_amount_cents: i64,
}

impl From<BookingConfigEntity> for BookingConfig {
    fn from(entity: BookingConfigEntity) -> Self {
        Self {
            booking_enabled: entity.booking_enabled,
            max_advance_days: entity.max_advance_days,
            max_party_size: entity.max_party_size,
            total_seats: entity.total_seats,
            capacity_policy: CapacityPolicy::parse(&entity.capacity_policy)
                .unwrap_or(CapacityPolicy::SharedPool),
            seats_per_slot: entity.seats_per_slot,
            closed_dates: entity.closed_dates,
            closed_days_of_week: entity.closed_days_of_week,
            suspension_message: entity.suspension_message,
            require_review: entity.require_review,
            reconfirmation_min_party_size: entity.reconfirmation_min_party_size,
            reconfirmation_days_before: entity.reconfirmation_days_before,
            reconfirmation_deadline_hours: entity.reconfirmation_deadline_hours,
            deposit_min_party_size: entity.deposit_min_party_size,
            deposit_amount_cents: entity.deposit_amount_cents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_domain() {
        let entity = BookingConfigEntity {
            id: 1,
            booking_enabled: true,
            max_advance_days: 60,
            max_party_size: 8,
            total_seats: 40,
            capacity_policy: "per_slot".to_string(),
            seats_per_slot: 20,
            closed_dates: vec![],
            closed_days_of_week: vec![1],
            suspension_message: None,
            require_review: false,
            reconfirmation_min_party_size: 6,
            reconfirmation_days_before: 2,
            reconfirmation_deadline_hours: 24,
            deposit_min_party_size: 6,
            deposit_amount_cents: 5000,
        };
        let config: BookingConfig = entity.into();
        assert_eq!(config.capacity_policy, CapacityPolicy::PerSlot);
        assert_eq!(config.slot_capacity(), 20);
    }
}
