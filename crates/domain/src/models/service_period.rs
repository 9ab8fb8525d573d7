//! Service period domain model.
//!
//! A service period is a named window of time (e.g. "Lunch") with its own
//! booking interval and order cutoff. Periods drive slot generation; the
//! generator itself lives in `services::slots`.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Kind of service a period represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    Lunch,
    Dinner,
    Break,
    Other,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Lunch => "lunch",
            PeriodType::Dinner => "dinner",
            PeriodType::Break => "break",
            PeriodType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lunch" => Some(PeriodType::Lunch),
            "dinner" => Some(PeriodType::Dinner),
            "break" => Some(PeriodType::Break),
            "other" => Some(PeriodType::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for PeriodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a configurable service window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServicePeriod {
    pub id: i64,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub last_order_time: NaiveTime,
    pub kitchen_closing_time: NaiveTime,
    pub interval_minutes: i32,
    pub enabled: bool,
    pub period_type: PeriodType,
    pub sort_order: i32,
}

/// Why a period configuration was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodConfigError {
    #[error("interval_minutes must be greater than zero")]
    NonPositiveInterval,

    #[error("period times must satisfy start <= last_order <= kitchen_closing <= end")]
    TimeOrderViolation,

    #[error("periods spanning midnight are not supported")]
    SpansMidnight,
}

/// Validates the time invariants of a period configuration.
///
/// Invariant: `start_time <= last_order_time <= kitchen_closing_time <= end_time`.
/// Midnight-spanning periods (`end_time < start_time`) are a configuration
/// error, not a supported layout.
pub fn validate_period_times(
    start_time: NaiveTime,
    end_time: NaiveTime,
    last_order_time: NaiveTime,
    kitchen_closing_time: NaiveTime,
    interval_minutes: i32,
) -> Result<(), PeriodConfigError> {
    if interval_minutes <= 0 {
        return Err(PeriodConfigError::NonPositiveInterval);
    }
    if end_time < start_time {
        return Err(PeriodConfigError::SpansMidnight);
    }
    if !(start_time <= last_order_time
        && last_order_time <= kitchen_closing_time
        && kitchen_closing_time <= end_time)
    {
        return Err(PeriodConfigError::TimeOrderViolation);
    }
    Ok(())
}

impl ServicePeriod {
    /// Checks this period's configuration invariants.
    pub fn validate_times(&self) -> Result<(), PeriodConfigError> {
        validate_period_times(
            self.start_time,
            self.end_time,
            self.last_order_time,
            self.kitchen_closing_time,
            self.interval_minutes,
        )
    }
}

/// Request payload for creating a service period (staff configuration).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateServicePeriodRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,

    /// `HH:MM`, 24h clock.
    pub start_time: String,
    pub end_time: String,
    pub last_order_time: String,
    pub kitchen_closing_time: String,

    #[validate(range(min = 1, max = 240, message = "Interval must be 1-240 minutes"))]
    pub interval_minutes: i32,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    pub period_type: PeriodType,

    #[serde(default)]
    pub sort_order: i32,
}

fn default_enabled() -> bool {
    true
}

/// Request payload for updating a service period (partial update).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateServicePeriodRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub last_order_time: Option<String>,
    pub kitchen_closing_time: Option<String>,
    #[validate(range(min = 1, max = 240, message = "Interval must be 1-240 minutes"))]
    pub interval_minutes: Option<i32>,
    pub enabled: Option<bool>,
    pub period_type: Option<PeriodType>,
    pub sort_order: Option<i32>,
}

/// Response payload for a service period.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ServicePeriodResponse {
    pub id: i64,
    pub name: String,
    pub start_time: String,
    pub end_time: String,
    pub last_order_time: String,
    pub kitchen_closing_time: String,
    pub interval_minutes: i32,
    pub enabled: bool,
    pub period_type: PeriodType,
    pub sort_order: i32,
}

impl From<ServicePeriod> for ServicePeriodResponse {
    fn from(p: ServicePeriod) -> Self {
        Self {
            id: p.id,
            name: p.name,
            start_time: shared::validation::format_slot(p.start_time),
            end_time: shared::validation::format_slot(p.end_time),
            last_order_time: shared::validation::format_slot(p.last_order_time),
            kitchen_closing_time: shared::validation::format_slot(p.kitchen_closing_time),
            interval_minutes: p.interval_minutes,
            enabled: p.enabled,
            period_type: p.period_type,
            sort_order: p.sort_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn lunch() -> ServicePeriod {
        ServicePeriod {
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
        }
    }

    #[test]
    fn test_valid_period() {
        assert!(lunch().validate_times().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_interval() {
        let mut p = lunch();
        p.interval_minutes = 0;
        assert_eq!(
            p.validate_times(),
            Err(PeriodConfigError::NonPositiveInterval)
        );
    }

    #[test]
    fn test_rejects_midnight_spanning_period() {
        let mut p = lunch();
        p.start_time = t(22, 0);
        p.end_time = t(2, 0);
        p.last_order_time = t(23, 0);
        p.kitchen_closing_time = t(23, 30);
        assert_eq!(p.validate_times(), Err(PeriodConfigError::SpansMidnight));
    }

    #[test]
    fn test_rejects_last_order_after_kitchen_close() {
        let mut p = lunch();
        p.last_order_time = t(15, 0);
        p.kitchen_closing_time = t(14, 30);
        assert_eq!(
            p.validate_times(),
            Err(PeriodConfigError::TimeOrderViolation)
        );
    }

    #[test]
    fn test_rejects_last_order_before_start() {
        let mut p = lunch();
        p.last_order_time = t(11, 0);
        assert_eq!(
            p.validate_times(),
            Err(PeriodConfigError::TimeOrderViolation)
        );
    }

    #[test]
    fn test_boundary_times_are_allowed() {
        // A period where all four times coincide offers exactly one slot.
        let p = ServicePeriod {
            start_time: t(18, 0),
            end_time: t(18, 0),
            last_order_time: t(18, 0),
            kitchen_closing_time: t(18, 0),
            ..lunch()
        };
        assert!(p.validate_times().is_ok());
    }

    #[test]
    fn test_period_type_round_trip() {
        for pt in [
            PeriodType::Lunch,
            PeriodType::Dinner,
            PeriodType::Break,
            PeriodType::Other,
        ] {
            assert_eq!(PeriodType::parse(pt.as_str()), Some(pt));
        }
        assert_eq!(PeriodType::parse("brunch"), None);
    }

    #[test]
    fn test_create_request_defaults() {
        let json = r#"{
            "name": "Dinner",
            "start_time": "18:00",
            "end_time": "22:00",
            "last_order_time": "21:30",
            "kitchen_closing_time": "22:00",
            "interval_minutes": 30,
            "period_type": "dinner"
        }"#;
        let request: CreateServicePeriodRequest = serde_json::from_str(json).unwrap();
        assert!(request.enabled);
        assert_eq!(request.sort_order, 0);
        assert!(request.validate().is_ok());
    }
}
