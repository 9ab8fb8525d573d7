//! Service period entity (database row mapping).

use chrono::NaiveTime;
use sqlx::FromRow;

use domain::models::service_period::{PeriodType, ServicePeriod};

/// Database row mapping for the service_periods table.
#[derive(Debug, Clone, FromRow)]
pub struct ServicePeriodEntity {
    pub id: i64,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub last_order_time: NaiveTime,
    pub kitchen_closing_time: NaiveTime,
    pub interval_minutes: i32,
    pub enabled: bool,
    pub period_type: String,
    pub sort_order: i32,
}

impl From<ServicePeriodEntity> for ServicePeriod {
    fn from(entity: ServicePeriodEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            start_time: entity.start_time,
            end_time: entity.end_time,
            last_order_time: entity.last_order_time,
            kitchen_closing_time: entity.kitchen_closing_time,
            interval_minutes: entity.interval_minutes,
            enabled: entity.enabled,
            period_type: PeriodType::parse(&entity.period_type).unwrap_or(PeriodType::Other),
            sort_order: entity.sort_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_domain() {
        let entity = ServicePeriodEntity {
            id: 1,
            name: "Lunch".to_string(),
            start_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            last_order_time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
            kitchen_closing_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            interval_minutes: 30,
            enabled: true,
            period_type: "lunch".to_string(),
            sort_order: 0,
        };
        let period: ServicePeriod = entity.into();
        assert_eq!(period.period_type, PeriodType::Lunch);
        assert!(period.validate_times().is_ok());
    }
}
