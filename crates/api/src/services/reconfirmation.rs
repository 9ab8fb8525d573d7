//! Reconfirmation sweep.
//!
//! Two phases, both idempotent:
//! 1. Send: large-party bookings inside the reminder window that have not
//!    been asked yet get a token and a reconfirmation email.
//! 2. Expire: unanswered requests past their deadline are cancelled.
//!
//! Claiming uses the conditional `mark_reconfirmation_sent` update, so a
//! sweep racing another sweep (or a manual trigger) sends at most one email
//! per booking.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};

use domain::models::{Booking, Customer};
use domain::services::events::{BookingEvent, CancellationOrigin};
use persistence::repositories::{
    BookingConfigRepository, BookingRepository, CustomerRepository,
};

use crate::config::Config;
use crate::error::ApiError;
use crate::middleware::metrics::record_booking_operation;
use crate::services::dispatcher::DispatcherService;

/// Outcome of one sweep run, also the response of the manual trigger route.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepOutcome {
    pub sent: u64,
    pub cancelled: u64,
    pub failed: u64,
    pub errors: Vec<String>,
}

pub struct ReconfirmationService {
    bookings: BookingRepository,
    customers: CustomerRepository,
    booking_config: BookingConfigRepository,
    dispatcher: DispatcherService,
}

impl ReconfirmationService {
    pub fn new(pool: PgPool, config: Arc<Config>) -> Self {
        Self {
            bookings: BookingRepository::new(pool.clone()),
            customers: CustomerRepository::new(pool.clone()),
            booking_config: BookingConfigRepository::new(pool.clone()),
            dispatcher: DispatcherService::new(pool, config.email.clone()),
        }
    }

    /// Runs both sweep phases. Per-booking failures are collected rather
    /// than aborting the run.
    pub async fn run_sweep(&self) -> Result<SweepOutcome, ApiError> {
        let config: domain::models::BookingConfig = self.booking_config.get().await?.into();
        let mut outcome = SweepOutcome::default();

        if config.reconfirmation_min_party_size <= 0 {
            info!("Reconfirmation disabled by configuration, skipping send phase");
        } else {
            self.send_phase(&config, &mut outcome).await?;
        }
        self.expire_phase(&mut outcome).await?;

        info!(
            sent = outcome.sent,
            cancelled = outcome.cancelled,
            failed = outcome.failed,
            "Reconfirmation sweep finished"
        );
        Ok(outcome)
    }

    async fn send_phase(
        &self,
        config: &domain::models::BookingConfig,
        outcome: &mut SweepOutcome,
    ) -> Result<(), ApiError> {
        let now = Utc::now();
        let today = now.date_naive();
        let window_end = today + Duration::days(config.reconfirmation_days_before as i64);

        let due = self
            .bookings
            .find_due_reconfirmations(config.reconfirmation_min_party_size, today, window_end)
            .await?;

        for entity in due {
            let booking: Booking = entity.into();
            let token = shared::tokens::generate_action_token();
            let deadline = now + Duration::hours(config.reconfirmation_deadline_hours as i64);

            match self
                .bookings
                .mark_reconfirmation_sent(booking.id, token, now, deadline)
                .await
            {
                Ok(Some(updated)) => {
                    let updated: Booking = updated.into();
                    match self.customer_for(&updated).await {
                        Ok(customer) => {
                            self.dispatcher
                                .dispatch(&BookingEvent::ReconfirmationRequested {
                                    booking: updated,
                                    customer,
                                    token,
                                    deadline,
                                })
                                .await;
                            outcome.sent += 1;
                        }
                        Err(e) => record_failure(outcome, &booking, "send", &e.to_string()),
                    }
                }
                // Another sweep claimed this booking first.
                Ok(None) => {}
                Err(e) => record_failure(outcome, &booking, "send", &e.to_string()),
            }
        }
        Ok(())
    }

    async fn expire_phase(&self, outcome: &mut SweepOutcome) -> Result<(), ApiError> {
        let now = Utc::now();
        let expired = self.bookings.find_expired_reconfirmations(now).await?;

        for entity in expired {
            let booking: Booking = entity.into();
            match self.bookings.cancel_expired_reconfirmation(booking.id, now).await {
                Ok(Some(updated)) => {
                    let updated: Booking = updated.into();
                    info!(
                        reference = %updated.booking_reference,
                        "Booking cancelled: reconfirmation deadline passed"
                    );
                    record_booking_operation("expire_cancel");
                    match self.customer_for(&updated).await {
                        Ok(customer) => {
                            self.dispatcher
                                .dispatch(&BookingEvent::BookingCancelled {
                                    booking: updated,
                                    customer,
                                    origin: CancellationOrigin::DeadlineExpired,
                                })
                                .await;
                            outcome.cancelled += 1;
                        }
                        Err(e) => {
                            // The cancellation itself stands.
                            outcome.cancelled += 1;
                            record_failure(outcome, &booking, "expire_notify", &e.to_string());
                        }
                    }
                }
                // Answered between the select and the update.
                Ok(None) => {}
                Err(e) => record_failure(outcome, &booking, "expire", &e.to_string()),
            }
        }
        Ok(())
    }

    async fn customer_for(&self, booking: &Booking) -> Result<Customer, ApiError> {
        let entity = self
            .customers
            .find_by_id(booking.customer_id)
            .await?
            .ok_or_else(|| {
                ApiError::Internal(format!(
                    "Booking {} references missing customer {}",
                    booking.id, booking.customer_id
                ))
            })?;
        Ok(entity.into())
    }
}

fn record_failure(outcome: &mut SweepOutcome, booking: &Booking, phase: &str, error: &str) {
    warn!(
        reference = %booking.booking_reference,
        phase,
        error,
        "Reconfirmation sweep step failed"
    );
    outcome.failed += 1;
    outcome
        .errors
        .push(format!("{} ({}): {}", booking.booking_reference, phase, error));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use domain::models::booking::{BookingSource, BookingStatus};
    use domain::models::deposit::DepositStatus;
    use uuid::Uuid;

    fn booking() -> Booking {
        Booking {
            id: 1,
            customer_id: 1,
            booking_date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            booking_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            party_size: 8,
            status: BookingStatus::Confirmed,
            source: BookingSource::Website,
            special_requests: None,
            booking_reference: "TB-SWEEP1".to_string(),
            cancellation_token: Uuid::new_v4(),
            reconfirmation_token: None,
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

    #[test]
    fn test_record_failure_counts_and_describes() {
        let mut outcome = SweepOutcome::default();
        record_failure(&mut outcome, &booking(), "send", "connection reset");
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("TB-SWEEP1"));
        assert!(outcome.errors[0].contains("send"));
    }

    #[test]
    fn test_outcome_serializes_camel_case() {
        let outcome = SweepOutcome {
            sent: 2,
            cancelled: 1,
            failed: 0,
            errors: vec![],
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["sent"], 2);
        assert_eq!(json["cancelled"], 1);
        assert!(json["errors"].as_array().unwrap().is_empty());
    }
}
