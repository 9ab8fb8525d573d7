//! Email payload and template keys.
//!
//! The rendered payload is persisted alongside the outbox entry so retries
//! resend exactly what the original attempt would have sent, without
//! re-reading booking state.

use serde::{Deserialize, Serialize};

/// Which transactional email a log entry corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailTemplate {
    BookingReceived,
    BookingConfirmed,
    BookingCancelled,
    ReconfirmationRequest,
    ReconfirmationExpiredCancellation,
}

impl EmailTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailTemplate::BookingReceived => "booking_received",
            EmailTemplate::BookingConfirmed => "booking_confirmed",
            EmailTemplate::BookingCancelled => "booking_cancelled",
            EmailTemplate::ReconfirmationRequest => "reconfirmation_request",
            EmailTemplate::ReconfirmationExpiredCancellation => {
                "reconfirmation_expired_cancellation"
            }
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "booking_received" => Some(EmailTemplate::BookingReceived),
            "booking_confirmed" => Some(EmailTemplate::BookingConfirmed),
            "booking_cancelled" => Some(EmailTemplate::BookingCancelled),
            "reconfirmation_request" => Some(EmailTemplate::ReconfirmationRequest),
            "reconfirmation_expired_cancellation" => {
                Some(EmailTemplate::ReconfirmationExpiredCancellation)
            }
            _ => None,
        }
    }
}

/// A fully rendered email, ready for transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmailPayload {
    pub subject: String,
    pub body_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_round_trip() {
        for t in [
            EmailTemplate::BookingReceived,
            EmailTemplate::BookingConfirmed,
            EmailTemplate::BookingCancelled,
            EmailTemplate::ReconfirmationRequest,
            EmailTemplate::ReconfirmationExpiredCancellation,
        ] {
            assert_eq!(EmailTemplate::parse(t.as_str()), Some(t));
        }
        assert_eq!(EmailTemplate::parse("newsletter"), None);
    }

    #[test]
    fn test_payload_serialization_omits_missing_html() {
        let payload = EmailPayload {
            subject: "Your booking".to_string(),
            body_text: "See you soon".to_string(),
            body_html: None,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("body_html"));
    }
}
