//! Common validation utilities for booking requests.

use chrono::{NaiveDate, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Loose international phone format: optional +, digits, spaces, dashes, parens.
    /// The first character after the optional + may open a parenthesized area code.
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9(][0-9 \-().]{5,19}$").unwrap();
}

/// Validates an optional phone number if present.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE_RE.is_match(phone) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_format");
        err.message = Some("Phone number format is invalid".into());
        Err(err)
    }
}

/// Validates a guest name: non-blank after trimming.
pub fn validate_guest_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("name_blank");
        err.message = Some("Name must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Parses a `YYYY-MM-DD` booking date.
pub fn parse_booking_date(input: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        let mut err = ValidationError::new("date_format");
        err.message = Some("Date must be in YYYY-MM-DD format".into());
        err
    })
}

/// Parses a `HH:MM` booking time on a 24h clock.
pub fn parse_booking_time(input: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(input, "%H:%M").map_err(|_| {
        let mut err = ValidationError::new("time_format");
        err.message = Some("Time must be in HH:MM format".into());
        err
    })
}

/// Formats a time-of-day as the canonical `HH:MM` slot string.
pub fn format_slot(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_validate_phone_accepts_common_formats() {
        assert!(validate_phone("+44 20 7946 0958").is_ok());
        assert!(validate_phone("020-7946-0958").is_ok());
        assert!(validate_phone("(212) 555-0188").is_ok());
        assert!(validate_phone("+1 (212) 555-0188").is_ok());
    }

    #[test]
    fn test_validate_phone_rejects_garbage() {
        assert!(validate_phone("not a phone").is_err());
        assert!(validate_phone("123").is_err());
        assert!(validate_phone("").is_err());
    }

    #[test]
    fn test_validate_guest_name() {
        assert!(validate_guest_name("Ada Lovelace").is_ok());
        assert!(validate_guest_name("  ").is_err());
        assert!(validate_guest_name("").is_err());
    }

    #[test]
    fn test_parse_booking_date() {
        let date = parse_booking_date("2025-06-15").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());
        assert!(parse_booking_date("15/06/2025").is_err());
        assert!(parse_booking_date("2025-13-01").is_err());
    }

    #[test]
    fn test_parse_booking_time() {
        let time = parse_booking_time("18:30").unwrap();
        assert_eq!(time.hour(), 18);
        assert_eq!(time.minute(), 30);
        assert!(parse_booking_time("6:30 PM").is_err());
        assert!(parse_booking_time("25:00").is_err());
    }

    #[test]
    fn test_format_slot_round_trip() {
        let time = parse_booking_time("09:05").unwrap();
        assert_eq!(format_slot(time), "09:05");
    }
}
