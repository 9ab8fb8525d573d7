//! Notification and email dispatcher.
//!
//! Consumes booking lifecycle events after the primary transaction has
//! committed. Each event produces a staff notification row and zero or more
//! customer emails through the outbox path: the rendered payload is logged
//! as `pending` before the transport is called, then marked `sent` or
//! `failed`. The retry sweep replays failed and stuck entries through the
//! same delivery function. Dispatcher failures are logged and never
//! propagate to the booking operation's caller.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{error, info, warn};

use domain::models::email::{EmailPayload, EmailTemplate};
use domain::models::notification::{NotificationPriority, NotificationType};
use domain::models::{Booking, Customer};
use domain::services::events::{BookingEvent, CancellationOrigin};
use persistence::entities::EmailLogEntity;
use persistence::repositories::{EmailLogRepository, NotificationRepository};

use crate::config::EmailConfig;
use crate::middleware::metrics::record_email_outcome;
use crate::services::email::EmailService;

/// Result of an email sweep pass.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct SweepStats {
    pub processed: usize,
    pub success: usize,
    pub failed: usize,
}

pub struct DispatcherService {
    notifications: NotificationRepository,
    email_log: EmailLogRepository,
    email: EmailService,
}

impl DispatcherService {
    pub fn new(pool: PgPool, email_config: EmailConfig) -> Self {
        Self {
            notifications: NotificationRepository::new(pool.clone()),
            email_log: EmailLogRepository::new(pool),
            email: EmailService::new(email_config),
        }
    }

    /// Handles one event. Never returns an error; every failure is logged
    /// and the booking operation that emitted the event is unaffected.
    pub async fn dispatch(&self, event: &BookingEvent) {
        if let Err(e) = self.create_notification(event).await {
            error!(event = event.name(), error = %e, "Failed to create staff notification");
        }

        for (template, payload) in self.emails_for(event) {
            self.send_via_outbox(template, event.customer(), Some(event.booking().id), payload)
                .await;
        }
    }

    /// Outbox path shared by inline dispatch and the retry sweep: log as
    /// pending, attempt transport, record the outcome.
    async fn send_via_outbox(
        &self,
        template: EmailTemplate,
        customer: &Customer,
        booking_id: Option<i64>,
        payload: EmailPayload,
    ) {
        let payload_json = match serde_json::to_value(&payload) {
            Ok(v) => v,
            Err(e) => {
                error!(template = template.as_str(), error = %e, "Failed to serialize email payload");
                return;
            }
        };

        let entry = match self
            .email_log
            .create_pending(template.as_str(), &customer.email, &payload_json, booking_id)
            .await
        {
            Ok(entry) => entry,
            Err(e) => {
                error!(template = template.as_str(), error = %e, "Failed to log outgoing email");
                return;
            }
        };

        self.attempt_delivery(&entry).await;
    }

    /// One delivery attempt for a logged entry. Used inline and by the
    /// sweep, so the retry path cannot drift from the first-send path.
    pub async fn attempt_delivery(&self, entry: &EmailLogEntity) -> bool {
        let payload: EmailPayload = match serde_json::from_value(entry.payload.clone()) {
            Ok(p) => p,
            Err(e) => {
                error!(email_id = %entry.email_id, error = %e, "Stored email payload is unreadable");
                let _ = self
                    .email_log
                    .mark_failed(entry.email_id, &format!("unreadable payload: {}", e))
                    .await;
                return false;
            }
        };

        match self.email.send(&entry.recipient, &payload).await {
            Ok(()) => {
                record_email_outcome("sent");
                if let Err(e) = self.email_log.mark_sent(entry.email_id, Utc::now()).await {
                    error!(email_id = %entry.email_id, error = %e, "Failed to mark email sent");
                }
                true
            }
            Err(e) => {
                record_email_outcome("failed");
                warn!(
                    email_id = %entry.email_id,
                    recipient = %entry.recipient,
                    error = %e,
                    "Email delivery failed"
                );
                if let Err(e) = self
                    .email_log
                    .mark_failed(entry.email_id, &e.to_string())
                    .await
                {
                    error!(email_id = %entry.email_id, error = %e, "Failed to mark email failed");
                }
                false
            }
        }
    }

    /// Retry sweep: replays failed entries under the attempt cap and
    /// reclaims pending entries old enough to be crash leftovers.
    pub async fn process_retries(&self, limit: i64) -> Result<SweepStats, sqlx::Error> {
        let entries = self.email_log.find_retryable(Utc::now(), limit).await?;
        let mut stats = SweepStats::default();

        for entry in &entries {
            stats.processed += 1;
            if self.attempt_delivery(entry).await {
                stats.success += 1;
            } else {
                stats.failed += 1;
            }
        }

        if stats.processed > 0 {
            info!(
                processed = stats.processed,
                success = stats.success,
                failed = stats.failed,
                "Email retry sweep completed"
            );
        }

        Ok(stats)
    }

    async fn create_notification(&self, event: &BookingEvent) -> Result<(), sqlx::Error> {
        let booking = event.booking();
        let customer = event.customer();
        let slot = format!(
            "{} at {}",
            booking.booking_date.format("%Y-%m-%d"),
            shared::validation::format_slot(booking.booking_time)
        );

        let (notification_type, priority, title, message) = match event {
            BookingEvent::BookingCreated { auto_confirmed, .. } => (
                NotificationType::BookingCreated,
                if booking.party_size >= 6 {
                    NotificationPriority::High
                } else {
                    NotificationPriority::Normal
                },
                "New booking".to_string(),
                format!(
                    "{} booked a table for {} on {} ({}){}",
                    customer.name,
                    booking.party_size,
                    slot,
                    booking.booking_reference,
                    if *auto_confirmed {
                        ""
                    } else {
                        " - awaiting review"
                    }
                ),
            ),
            BookingEvent::BookingConfirmed { .. } => (
                NotificationType::BookingConfirmed,
                NotificationPriority::Normal,
                "Booking confirmed".to_string(),
                format!("{} was confirmed for {}", booking.booking_reference, slot),
            ),
            BookingEvent::BookingCancelled { origin, .. } => (
                NotificationType::BookingCancelled,
                NotificationPriority::High,
                "Booking cancelled".to_string(),
                format!(
                    "{} for {} was cancelled ({})",
                    booking.booking_reference,
                    slot,
                    match origin {
                        CancellationOrigin::Customer => "by the customer",
                        CancellationOrigin::Staff => "by staff",
                        CancellationOrigin::DeadlineExpired => "reconfirmation deadline expired",
                    }
                ),
            ),
            BookingEvent::ReconfirmationRequested { deadline, .. } => (
                NotificationType::ReconfirmationRequested,
                NotificationPriority::Low,
                "Reconfirmation requested".to_string(),
                format!(
                    "{} (party of {}) was asked to reconfirm before {}",
                    booking.booking_reference,
                    booking.party_size,
                    deadline.format("%Y-%m-%d %H:%M UTC")
                ),
            ),
            BookingEvent::BookingReconfirmed { .. } => (
                NotificationType::BookingReconfirmed,
                NotificationPriority::Normal,
                "Booking reconfirmed".to_string(),
                format!("{} reconfirmed for {}", booking.booking_reference, slot),
            ),
            BookingEvent::NoShowRecorded { .. } => (
                NotificationType::NoShowRecorded,
                NotificationPriority::Normal,
                "No-show recorded".to_string(),
                format!(
                    "{} (party of {}) did not show for {}",
                    booking.booking_reference, booking.party_size, slot
                ),
            ),
        };

        self.notifications
            .create(
                notification_type.as_str(),
                &title,
                &message,
                priority.as_str(),
                Some(booking.id),
                Some(&format!("/dashboard/bookings/{}", booking.id)),
            )
            .await?;
        Ok(())
    }

    /// Which customer emails an event produces.
    fn emails_for(&self, event: &BookingEvent) -> Vec<(EmailTemplate, EmailPayload)> {
        let base_url = self.email.base_url();
        let booking = event.booking();
        let customer = event.customer();

        match event {
            BookingEvent::BookingCreated { auto_confirmed, .. } => {
                let template = if *auto_confirmed {
                    EmailTemplate::BookingConfirmed
                } else {
                    EmailTemplate::BookingReceived
                };
                vec![(template, render_email(template, booking, customer, base_url, None))]
            }
            BookingEvent::BookingConfirmed { .. } => {
                let template = EmailTemplate::BookingConfirmed;
                vec![(template, render_email(template, booking, customer, base_url, None))]
            }
            BookingEvent::BookingCancelled { origin, .. } => {
                let template = match origin {
                    CancellationOrigin::DeadlineExpired => {
                        EmailTemplate::ReconfirmationExpiredCancellation
                    }
                    _ => EmailTemplate::BookingCancelled,
                };
                vec![(template, render_email(template, booking, customer, base_url, None))]
            }
            BookingEvent::ReconfirmationRequested { deadline, .. } => {
                let template = EmailTemplate::ReconfirmationRequest;
                vec![(
                    template,
                    render_email(template, booking, customer, base_url, Some(*deadline)),
                )]
            }
            // Reconfirmed and no-show are staff-facing only.
            BookingEvent::BookingReconfirmed { .. } | BookingEvent::NoShowRecorded { .. } => {
                vec![]
            }
        }
    }
}

/// Renders a template into a payload. Pure, so templates are unit-testable.
pub fn render_email(
    template: EmailTemplate,
    booking: &Booking,
    customer: &Customer,
    base_url: &str,
    deadline: Option<DateTime<Utc>>,
) -> EmailPayload {
    let date = booking.booking_date.format("%Y-%m-%d").to_string();
    let time = shared::validation::format_slot(booking.booking_time);
    let cancel_url = format!(
        "{}/bookings/cancel/{}",
        base_url, booking.cancellation_token
    );

    match template {
        EmailTemplate::BookingReceived => EmailPayload {
            subject: format!("We received your booking {}", booking.booking_reference),
            body_text: format!(
                "Hi {name},\n\n\
                 We received your booking request for {party} on {date} at {time}.\n\
                 Your reference is {reference}. We will confirm it shortly.\n\n\
                 Need to cancel? Use this link:\n{cancel_url}\n",
                name = customer.name,
                party = party_phrase(booking.party_size),
                date = date,
                time = time,
                reference = booking.booking_reference,
                cancel_url = cancel_url,
            ),
            body_html: None,
        },
        EmailTemplate::BookingConfirmed => EmailPayload {
            subject: format!("Booking confirmed: {}", booking.booking_reference),
            body_text: format!(
                "Hi {name},\n\n\
                 Your table for {party} on {date} at {time} is confirmed.\n\
                 Your reference is {reference}.\n\n\
                 Need to cancel? Use this link:\n{cancel_url}\n",
                name = customer.name,
                party = party_phrase(booking.party_size),
                date = date,
                time = time,
                reference = booking.booking_reference,
                cancel_url = cancel_url,
            ),
            body_html: None,
        },
        EmailTemplate::BookingCancelled => EmailPayload {
            subject: format!("Booking cancelled: {}", booking.booking_reference),
            body_text: format!(
                "Hi {name},\n\n\
                 Your booking {reference} for {date} at {time} has been cancelled.\n\
                 We hope to see you another time.\n",
                name = customer.name,
                reference = booking.booking_reference,
                date = date,
                time = time,
            ),
            body_html: None,
        },
        EmailTemplate::ReconfirmationRequest => {
            let token = booking
                .reconfirmation_token
                .map(|t| t.to_string())
                .unwrap_or_default();
            let deadline_text = deadline
                .map(|d| d.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "the deadline".to_string());
            EmailPayload {
                subject: format!(
                    "Please reconfirm your booking {}",
                    booking.booking_reference
                ),
                body_text: format!(
                    "Hi {name},\n\n\
                     You have a table for {party} on {date} at {time}.\n\
                     Please confirm you are still coming before {deadline}:\n\
                     {base_url}/bookings/reconfirm/{token}\n\n\
                     If we do not hear from you, the booking will be released.\n",
                    name = customer.name,
                    party = party_phrase(booking.party_size),
                    date = date,
                    time = time,
                    deadline = deadline_text,
                    base_url = base_url,
                    token = token,
                ),
                body_html: None,
            }
        }
        EmailTemplate::ReconfirmationExpiredCancellation => EmailPayload {
            subject: format!("Booking released: {}", booking.booking_reference),
            body_text: format!(
                "Hi {name},\n\n\
                 We did not receive a reconfirmation for your booking {reference}\n\
                 ({date} at {time}), so the table has been released.\n\
                 We would love to host you another time.\n",
                name = customer.name,
                reference = booking.booking_reference,
                date = date,
                time = time,
            ),
            body_html: None,
        },
    }
}

fn party_phrase(party_size: i32) -> String {
    if party_size == 1 {
        "1 guest".to_string()
    } else {
        format!("{} guests", party_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use domain::models::booking::{BookingSource, BookingStatus};
    use domain::models::customer::CustomerSegment;
    use domain::models::deposit::DepositStatus;
    use uuid::Uuid;

    fn booking() -> Booking {
        Booking {
            id: 1,
            customer_id: 2,
            booking_date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            booking_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            party_size: 6,
            status: BookingStatus::Confirmed,
            source: BookingSource::Website,
            special_requests: None,
            booking_reference: "TB-K7M2QX".to_string(),
            cancellation_token: Uuid::nil(),
            reconfirmation_token: Some(Uuid::nil()),
            reconfirmation_sent_at: None,
            reconfirmation_deadline: None,
            reconfirmation_pending: false,
            payment_intent_id: None,
            deposit_amount_cents: 0,
            deposit_status: DepositStatus::None,
            deposit_refund_cents: 0,
            created_at: Utc::now(),
        }
    }

    fn customer() -> Customer {
        Customer {
            id: 2,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            customer_segment: CustomerSegment::Regular,
            total_bookings: 4,
            recent_bookings: 2,
            average_party_size: 3.5,
            last_booking_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_confirmed_email_contains_reference_and_cancel_link() {
        let payload = render_email(
            EmailTemplate::BookingConfirmed,
            &booking(),
            &customer(),
            "https://book.example.com",
            None,
        );
        assert!(payload.subject.contains("TB-K7M2QX"));
        assert!(payload.body_text.contains("2025-06-10"));
        assert!(payload.body_text.contains("19:00"));
        assert!(payload
            .body_text
            .contains("https://book.example.com/bookings/cancel/"));
    }

    #[test]
    fn test_reconfirmation_email_contains_token_link_and_deadline() {
        let deadline = Utc::now();
        let payload = render_email(
            EmailTemplate::ReconfirmationRequest,
            &booking(),
            &customer(),
            "https://book.example.com",
            Some(deadline),
        );
        assert!(payload
            .body_text
            .contains("https://book.example.com/bookings/reconfirm/"));
        assert!(payload.body_text.contains("UTC"));
    }

    #[test]
    fn test_party_phrase_singular() {
        assert_eq!(party_phrase(1), "1 guest");
        assert_eq!(party_phrase(4), "4 guests");
    }

    #[test]
    fn test_rendered_payload_round_trips_through_json() {
        // The outbox stores payloads as JSONB; the sweep must read them back.
        let payload = render_email(
            EmailTemplate::BookingCancelled,
            &booking(),
            &customer(),
            "",
            None,
        );
        let value = serde_json::to_value(&payload).unwrap();
        let restored: EmailPayload = serde_json::from_value(value).unwrap();
        assert_eq!(restored.subject, payload.subject);
        assert_eq!(restored.body_text, payload.body_text);
    }
}
