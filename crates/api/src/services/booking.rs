//! Booking lifecycle service.
//!
//! Owns the state machine around bookings: creation (with the serialized
//! capacity check), token-based cancellation and reconfirmation answers,
//! and the staff review transitions. Emits `BookingEvent`s to the
//! dispatcher after the primary transaction has committed.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use domain::models::booking::{
    BookingDetailResponse, BookingStatus, CreateBookingRequest, CreateBookingResponse,
    ReconfirmAction,
};
use domain::models::deposit::DepositStatus;
use domain::models::{Booking, BookingConfig, Customer};
use domain::services::availability::{self, UnavailableReason};
use domain::services::events::{BookingEvent, CancellationOrigin};
use persistence::repositories::{
    BookingConfigRepository, BookingRepository, CustomerRepository, CustomerUpsert, NewBooking,
    ServicePeriodRepository,
};

use crate::config::Config;
use crate::error::ApiError;
use crate::middleware::metrics::record_booking_operation;
use crate::services::deposits::DepositService;
use crate::services::dispatcher::DispatcherService;
use crate::services::payments::PaymentGateway;

/// Availability listing for one date.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub date: String,
    pub enabled: bool,
    pub slots: Vec<SlotAvailability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    pub time: String,
    pub available_seats: i64,
}

pub struct BookingService {
    bookings: BookingRepository,
    customers: CustomerRepository,
    periods: ServicePeriodRepository,
    booking_config: BookingConfigRepository,
    dispatcher: DispatcherService,
    deposits: DepositService,
}

impl BookingService {
    pub fn new(pool: PgPool, config: Arc<Config>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            bookings: BookingRepository::new(pool.clone()),
            customers: CustomerRepository::new(pool.clone()),
            periods: ServicePeriodRepository::new(pool.clone()),
            booking_config: BookingConfigRepository::new(pool.clone()),
            dispatcher: DispatcherService::new(pool.clone(), config.email.clone()),
            deposits: DepositService::new(pool, gateway, config.payments.currency.clone()),
        }
    }

    async fn load_config(&self) -> Result<BookingConfig, ApiError> {
        Ok(self.booking_config.get().await?.into())
    }

    /// Availability listing for the public booking form.
    pub async fn availability(&self, date_input: &str) -> Result<AvailabilityResponse, ApiError> {
        let date = parse_date(date_input)?;
        let config = self.load_config().await?;
        let today = Utc::now().date_naive();

        if let Err(reason) = availability::check_date(&config, today, date) {
            let message = match reason {
                UnavailableReason::BookingDisabled => config
                    .suspension_message
                    .clone()
                    .unwrap_or_else(|| reason.to_string()),
                _ => reason.to_string(),
            };
            return Ok(AvailabilityResponse {
                date: date_input.to_string(),
                enabled: false,
                slots: vec![],
                message: Some(message),
            });
        }

        let slot_times = self.periods.available_times().await?;
        let booked = self.bookings.booked_seats_for_date(date).await?;
        let capacity = config.slot_capacity() as i64;

        let slots = slot_times
            .into_iter()
            .map(|time| {
                let taken = booked
                    .iter()
                    .find(|(t, _)| *t == time)
                    .map(|(_, seats)| *seats)
                    .unwrap_or(0);
                SlotAvailability {
                    time: shared::validation::format_slot(time),
                    available_seats: (capacity - taken).max(0),
                }
            })
            .collect();

        Ok(AvailabilityResponse {
            date: date_input.to_string(),
            enabled: true,
            slots,
            message: None,
        })
    }

    /// Creates a booking from the public form.
    pub async fn create(
        &self,
        request: CreateBookingRequest,
    ) -> Result<CreateBookingResponse, ApiError> {
        request.validate()?;

        let date = parse_date(&request.date)?;
        let time = shared::validation::parse_booking_time(&request.time)
            .map_err(|e| ApiError::Validation(e.to_string()))?;

        let config = self.load_config().await?;
        let slots = self.periods.available_times().await?;
        let today = Utc::now().date_naive();

        // Optimistic check first so most rejections never open a
        // transaction. The authoritative check re-runs under the slot lock.
        let booked = self.bookings.booked_seats(date, time).await?;
        availability::check_booking(
            &config,
            &slots,
            today,
            date,
            time,
            request.party_size,
            booked,
        )
        .map_err(ApiError::Unavailable)?;

        let reference = self.generate_unique_reference().await?;
        let status = if config.require_review {
            BookingStatus::Pending
        } else {
            BookingStatus::Confirmed
        };
        let auto_confirmed = !config.require_review;
        let deposit_amount = if config.requires_deposit(request.party_size) {
            config.deposit_amount_cents
        } else {
            0
        };

        let new = NewBooking {
            booking_date: date,
            booking_time: time,
            party_size: request.party_size,
            status: status.as_str().to_string(),
            source: "website".to_string(),
            special_requests: request.special_requests.clone(),
            booking_reference: reference,
            cancellation_token: shared::tokens::generate_action_token(),
            deposit_amount_cents: deposit_amount,
            deposit_status: DepositStatus::None.as_str().to_string(),
        };
        let customer = CustomerUpsert {
            name: request.name.clone(),
            email: request.email.to_lowercase(),
            phone: request.phone.clone(),
        };

        let created = self
            .bookings
            .create_checked(customer, new, today, |booked_under_lock| {
                availability::check_booking(
                    &config,
                    &slots,
                    today,
                    date,
                    time,
                    request.party_size,
                    booked_under_lock,
                )
                .is_ok()
            })
            .await?;

        let Some((booking_entity, customer_entity)) = created else {
            // A concurrent create claimed the remaining seats first.
            return Err(ApiError::Unavailable(UnavailableReason::CapacityExceeded));
        };

        let booking: Booking = booking_entity.into();
        let customer: Customer = customer_entity.into();

        info!(
            reference = %booking.booking_reference,
            date = %booking.booking_date,
            time = %shared::validation::format_slot(booking.booking_time),
            party_size = booking.party_size,
            status = %booking.status,
            "Booking created"
        );
        record_booking_operation("create");

        let response = CreateBookingResponse {
            success: true,
            booking_id: booking.id,
            booking_reference: booking.booking_reference.clone(),
            status: booking.status,
        };

        self.dispatcher
            .dispatch(&BookingEvent::BookingCreated {
                booking,
                customer,
                auto_confirmed,
            })
            .await;

        Ok(response)
    }

    async fn generate_unique_reference(&self) -> Result<String, ApiError> {
        // Collisions are astronomically unlikely; the retry loop is bounded
        // so a broken RNG cannot spin forever.
        for _ in 0..5 {
            let reference = shared::tokens::generate_booking_reference();
            if !self.bookings.reference_exists(&reference).await? {
                return Ok(reference);
            }
        }
        Err(ApiError::Internal(
            "Could not generate a unique booking reference".to_string(),
        ))
    }

    /// Detail view for the customer-facing cancel page.
    pub async fn detail_by_cancellation_token(
        &self,
        token: &str,
    ) -> Result<BookingDetailResponse, ApiError> {
        let token = parse_token(token)?;
        let entity = self
            .bookings
            .find_by_cancellation_token(token)
            .await?
            .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;
        let booking: Booking = entity.into();
        Ok(BookingDetailResponse::from_booking(&booking))
    }

    /// Customer cancellation via token. Idempotent under replay: the second
    /// call reports the already-cancelled state without side effects.
    pub async fn cancel_by_token(&self, token: &str) -> Result<BookingDetailResponse, ApiError> {
        let token = parse_token(token)?;

        match self.bookings.cancel_by_cancellation_token(token).await? {
            Some(entity) => {
                let booking: Booking = entity.into();
                let customer = self.customer_for(&booking).await?;
                info!(reference = %booking.booking_reference, "Booking cancelled by customer");
                record_booking_operation("cancel");

                let detail = BookingDetailResponse::from_booking(&booking);
                self.dispatcher
                    .dispatch(&BookingEvent::BookingCancelled {
                        booking,
                        customer,
                        origin: CancellationOrigin::Customer,
                    })
                    .await;
                Ok(detail)
            }
            None => match self.bookings.find_by_cancellation_token(token).await? {
                Some(entity) => {
                    let booking: Booking = entity.into();
                    match booking.status {
                        BookingStatus::Cancelled => Err(ApiError::Conflict(
                            "This booking has already been cancelled".to_string(),
                        )),
                        _ => Err(ApiError::Conflict(
                            "This booking can no longer be cancelled".to_string(),
                        )),
                    }
                }
                None => Err(ApiError::NotFound("Booking not found".to_string())),
            },
        }
    }

    /// Detail view for the reconfirmation page.
    pub async fn detail_by_reconfirmation_token(
        &self,
        token: &str,
    ) -> Result<BookingDetailResponse, ApiError> {
        let token = parse_token(token)?;
        let entity = self
            .bookings
            .find_by_reconfirmation_token(token)
            .await?
            .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;
        let booking: Booking = entity.into();
        Ok(BookingDetailResponse::from_booking(&booking))
    }

    /// Customer answer to a reconfirmation request.
    pub async fn respond_to_reconfirmation(
        &self,
        token: &str,
        action: ReconfirmAction,
    ) -> Result<BookingDetailResponse, ApiError> {
        let token = parse_token(token)?;
        let now = Utc::now();

        let entity = self
            .bookings
            .find_by_reconfirmation_token(token)
            .await?
            .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;
        let current: Booking = entity.into();

        if !current.reconfirmation_pending {
            return Err(ApiError::Conflict(
                "This reconfirmation request has already been answered".to_string(),
            ));
        }
        if current.reconfirmation_expired(now) {
            // Expired tokens change nothing; the sweep owns the cancellation.
            return Err(ApiError::Conflict(
                "The reconfirmation window has expired".to_string(),
            ));
        }

        let updated = match action {
            ReconfirmAction::Confirm => self.bookings.reconfirm_by_token(token, now).await?,
            ReconfirmAction::Cancel => {
                self.bookings.cancel_by_reconfirmation_token(token, now).await?
            }
        };

        let Some(entity) = updated else {
            // Lost a race with the sweep or a concurrent answer.
            return Err(ApiError::Conflict(
                "This reconfirmation request has already been resolved".to_string(),
            ));
        };

        let booking: Booking = entity.into();
        let customer = self.customer_for(&booking).await?;
        let detail = BookingDetailResponse::from_booking(&booking);

        let event = match action {
            ReconfirmAction::Confirm => {
                info!(reference = %booking.booking_reference, "Booking reconfirmed");
                record_booking_operation("reconfirm");
                BookingEvent::BookingReconfirmed { booking, customer }
            }
            ReconfirmAction::Cancel => {
                info!(reference = %booking.booking_reference, "Booking cancelled via reconfirmation");
                record_booking_operation("cancel");
                BookingEvent::BookingCancelled {
                    booking,
                    customer,
                    origin: CancellationOrigin::Customer,
                }
            }
        };
        self.dispatcher.dispatch(&event).await;

        Ok(detail)
    }

    /// Staff review: pending -> confirmed.
    pub async fn confirm(&self, id: i64) -> Result<BookingDetailResponse, ApiError> {
        match self.bookings.confirm_pending(id).await? {
            Some(entity) => {
                let booking: Booking = entity.into();
                let customer = self.customer_for(&booking).await?;
                info!(reference = %booking.booking_reference, "Booking confirmed by staff");
                record_booking_operation("confirm");

                let detail = BookingDetailResponse::from_booking(&booking);
                self.dispatcher
                    .dispatch(&BookingEvent::BookingConfirmed { booking, customer })
                    .await;
                Ok(detail)
            }
            None => match self.bookings.find_by_id(id).await? {
                Some(entity) => {
                    let booking: Booking = entity.into();
                    Err(transition_conflict(&booking, BookingStatus::Confirmed))
                }
                None => Err(ApiError::NotFound("Booking not found".to_string())),
            },
        }
    }

    /// Staff: confirmed -> no_show. Captures a pending deposit hold when one
    /// exists; a capture failure is logged but does not undo the no-show.
    pub async fn mark_no_show(&self, id: i64) -> Result<BookingDetailResponse, ApiError> {
        match self.bookings.mark_no_show(id).await? {
            Some(entity) => {
                let booking: Booking = entity.into();
                let customer = self.customer_for(&booking).await?;
                info!(reference = %booking.booking_reference, "No-show recorded");
                record_booking_operation("no_show");

                if booking.deposit_status == DepositStatus::Pending {
                    if let Err(e) = self.deposits.capture(booking.id, "system:no_show").await {
                        warn!(
                            reference = %booking.booking_reference,
                            error = %e,
                            "Deposit capture after no-show failed; capture manually"
                        );
                    }
                }

                let detail = BookingDetailResponse::from_booking(&booking);
                self.dispatcher
                    .dispatch(&BookingEvent::NoShowRecorded { booking, customer })
                    .await;
                Ok(detail)
            }
            None => match self.bookings.find_by_id(id).await? {
                Some(entity) => {
                    let booking: Booking = entity.into();
                    Err(transition_conflict(&booking, BookingStatus::NoShow))
                }
                None => Err(ApiError::NotFound("Booking not found".to_string())),
            },
        }
    }

    /// Staff: confirmed -> completed, recorded after the party attended.
    /// An unused deposit hold is released; a release failure is logged but
    /// does not undo the completion.
    pub async fn complete(&self, id: i64) -> Result<BookingDetailResponse, ApiError> {
        match self.bookings.mark_completed(id).await? {
            Some(entity) => {
                let booking: Booking = entity.into();
                info!(reference = %booking.booking_reference, "Booking completed");
                record_booking_operation("complete");

                if booking.deposit_status == DepositStatus::Pending {
                    if let Err(e) = self.deposits.cancel(booking.id, "system:complete").await {
                        warn!(
                            reference = %booking.booking_reference,
                            error = %e,
                            "Deposit release after completion failed; release manually"
                        );
                    }
                }

                Ok(BookingDetailResponse::from_booking(&booking))
            }
            None => match self.bookings.find_by_id(id).await? {
                Some(entity) => {
                    let booking: Booking = entity.into();
                    Err(transition_conflict(&booking, BookingStatus::Completed))
                }
                None => Err(ApiError::NotFound("Booking not found".to_string())),
            },
        }
    }

    /// Staff listing over a date range.
    pub async fn list(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        status: Option<&str>,
    ) -> Result<Vec<BookingDetailResponse>, ApiError> {
        let entities = self.bookings.list_for_date_range(from, to, status).await?;
        Ok(entities
            .into_iter()
            .map(|e| {
                let booking: Booking = e.into();
                BookingDetailResponse::from_booking(&booking)
            })
            .collect())
    }

    /// Staff detail by human-readable reference.
    pub async fn detail_by_reference(
        &self,
        reference: &str,
    ) -> Result<BookingDetailResponse, ApiError> {
        let entity = self
            .bookings
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;
        let booking: Booking = entity.into();
        Ok(BookingDetailResponse::from_booking(&booking))
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

/// Maps a refused conditional update to a conflict derived from the
/// lifecycle guard. The update and the re-read are separate statements, so
/// a row that still permits the transition on re-read means a concurrent
/// writer got there first.
fn transition_conflict(booking: &Booking, target: BookingStatus) -> ApiError {
    if booking.status.can_transition_to(target) {
        return ApiError::Conflict(format!(
            "Booking {} changed concurrently, please retry",
            booking.booking_reference
        ));
    }
    if booking.status.is_terminal() {
        ApiError::Conflict(format!(
            "Booking {} is already {}",
            booking.booking_reference, booking.status
        ))
    } else {
        ApiError::Conflict(format!(
            "Booking {} is {}, cannot become {}",
            booking.booking_reference, booking.status, target
        ))
    }
}

fn parse_date(input: &str) -> Result<NaiveDate, ApiError> {
    shared::validation::parse_booking_date(input).map_err(|e| ApiError::Validation(e.to_string()))
}

fn parse_token(input: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(input).map_err(|_| ApiError::NotFound("Booking not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_rejects_garbage_as_not_found() {
        // Malformed tokens are indistinguishable from unknown ones.
        assert!(matches!(
            parse_token("not-a-uuid"),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_parse_token_accepts_uuid() {
        let token = Uuid::new_v4();
        assert_eq!(parse_token(&token.to_string()).unwrap(), token);
    }

    #[test]
    fn test_parse_date_rejects_bad_format() {
        assert!(matches!(
            parse_date("10/06/2025"),
            Err(ApiError::Validation(_))
        ));
        assert!(parse_date("2025-06-10").is_ok());
    }

    fn booking_in(status: BookingStatus) -> Booking {
        use domain::models::booking::BookingSource;
        Booking {
            id: 7,
            customer_id: 3,
            booking_date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
            booking_time: chrono::NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            party_size: 4,
            status,
            source: BookingSource::Website,
            special_requests: None,
            booking_reference: "TB-XY7K2M".to_string(),
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
    fn test_transition_conflict_terminal_state() {
        let booking = booking_in(BookingStatus::Cancelled);
        let err = transition_conflict(&booking, BookingStatus::Completed);
        match err {
            ApiError::Conflict(msg) => assert!(msg.contains("already cancelled")),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_transition_conflict_unreachable_target() {
        let booking = booking_in(BookingStatus::Pending);
        let err = transition_conflict(&booking, BookingStatus::NoShow);
        match err {
            ApiError::Conflict(msg) => assert!(msg.contains("cannot become no_show")),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_transition_conflict_concurrent_change() {
        // The re-read still permits the transition, so the refusal must
        // have come from a concurrent writer.
        let booking = booking_in(BookingStatus::Confirmed);
        let err = transition_conflict(&booking, BookingStatus::Completed);
        match err {
            ApiError::Conflict(msg) => assert!(msg.contains("changed concurrently")),
            other => panic!("expected conflict, got {other:?}"),
        }
    }
}
