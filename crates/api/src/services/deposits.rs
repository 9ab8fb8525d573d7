//! Deposit coordinator.
//!
//! Sequencing invariant: the gateway call happens first, and the booking
//! pointer plus the ledger row are written only after it succeeds. A
//! gateway failure therefore leaves the deposit state untouched, and the
//! ledger never records a money movement that did not happen.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

use domain::models::deposit::{
    self, DepositAction, DepositGuardError, DepositStatus,
};
use domain::models::notification::{NotificationPriority, NotificationType};
use domain::models::Booking;
use persistence::entities::{BookingEntity, DepositTransactionEntity};
use persistence::repositories::{BookingRepository, DepositTransactionRepository, NotificationRepository};

use crate::error::ApiError;
use crate::middleware::metrics::record_deposit_operation;
use crate::services::payments::{GatewayError, PaymentGateway};

/// Deposit state of a booking, as returned by the staff endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositResponse {
    pub booking_reference: String,
    pub deposit_status: DepositStatus,
    pub deposit_amount_cents: i64,
    pub deposit_refund_cents: i64,
    pub payment_intent_id: Option<String>,
}

impl DepositResponse {
    fn from_booking(b: &Booking) -> Self {
        Self {
            booking_reference: b.booking_reference.clone(),
            deposit_status: b.deposit_status,
            deposit_amount_cents: b.deposit_amount_cents,
            deposit_refund_cents: b.deposit_refund_cents,
            payment_intent_id: b.payment_intent_id.clone(),
        }
    }
}

/// One row of the deposit audit trail.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositLedgerEntry {
    pub action: String,
    pub amount_cents: i64,
    pub reason: Option<String>,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

impl From<DepositTransactionEntity> for DepositLedgerEntry {
    fn from(e: DepositTransactionEntity) -> Self {
        Self {
            action: e.action,
            amount_cents: e.amount_cents,
            reason: e.reason,
            actor: e.actor,
            created_at: e.created_at,
        }
    }
}

pub struct DepositService {
    bookings: BookingRepository,
    ledger: DepositTransactionRepository,
    notifications: NotificationRepository,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl DepositService {
    pub fn new(pool: PgPool, gateway: Arc<dyn PaymentGateway>, currency: String) -> Self {
        Self {
            bookings: BookingRepository::new(pool.clone()),
            ledger: DepositTransactionRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool),
            gateway,
            currency,
        }
    }

    async fn load(&self, booking_id: i64) -> Result<Booking, ApiError> {
        let entity = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;
        Ok(entity.into())
    }

    /// Authorizes a deposit hold for a booking that does not have one yet.
    pub async fn create_intent(
        &self,
        booking_id: i64,
        actor: &str,
    ) -> Result<DepositResponse, ApiError> {
        let booking = self.load(booking_id).await?;
        deposit::check_authorize(booking.deposit_status).map_err(guard_to_conflict)?;

        if booking.deposit_amount_cents <= 0 {
            return Err(ApiError::Conflict(format!(
                "Booking {} has no deposit amount set",
                booking.booking_reference
            )));
        }

        let intent = self
            .gateway
            .create_intent(
                booking.deposit_amount_cents,
                &self.currency,
                &booking.booking_reference,
            )
            .await
            .map_err(|e| gateway_failure("create", e))?;

        let updated = self
            .bookings
            .attach_payment_intent(booking.id, &intent.id, booking.deposit_amount_cents)
            .await?
            .ok_or_else(|| stale_state(&booking))?;
        self.ledger
            .append(
                booking.id,
                DepositAction::Created.as_str(),
                booking.deposit_amount_cents,
                None,
                actor,
            )
            .await?;

        info!(
            reference = %booking.booking_reference,
            intent_id = %intent.id,
            amount_cents = booking.deposit_amount_cents,
            "Deposit authorized"
        );
        record_deposit_operation("create", true);
        Ok(self.response(updated))
    }

    /// Captures a pending deposit hold.
    pub async fn capture(&self, booking_id: i64, actor: &str) -> Result<DepositResponse, ApiError> {
        let booking = self.load(booking_id).await?;
        deposit::check_capture(booking.deposit_status).map_err(guard_to_conflict)?;
        let intent_id = self.intent_id(&booking)?;

        self.gateway
            .capture(&intent_id)
            .await
            .map_err(|e| gateway_failure("capture", e))?;

        let updated = self
            .bookings
            .transition_deposit(booking.id, DepositStatus::Pending, DepositStatus::Captured)
            .await?
            .ok_or_else(|| stale_state(&booking))?;
        self.ledger
            .append(
                booking.id,
                DepositAction::Captured.as_str(),
                booking.deposit_amount_cents,
                None,
                actor,
            )
            .await?;

        // Dashboard alert; email is intentionally not sent for captures.
        if let Err(e) = self
            .notifications
            .create(
                NotificationType::DepositCaptured.as_str(),
                "Deposit captured",
                &format!(
                    "Deposit of {} cents captured for booking {}",
                    booking.deposit_amount_cents, booking.booking_reference
                ),
                NotificationPriority::Normal.as_str(),
                Some(booking.id),
                Some(&format!("/dashboard/bookings/{}", booking.id)),
            )
            .await
        {
            tracing::warn!(error = %e, "Failed to record deposit capture notification");
        }

        info!(reference = %booking.booking_reference, "Deposit captured");
        record_deposit_operation("capture", true);
        Ok(self.response(updated))
    }

    /// Releases a pending deposit hold without charging.
    pub async fn cancel(&self, booking_id: i64, actor: &str) -> Result<DepositResponse, ApiError> {
        let booking = self.load(booking_id).await?;
        deposit::check_cancel(booking.deposit_status).map_err(guard_to_conflict)?;
        let intent_id = self.intent_id(&booking)?;

        self.gateway
            .cancel(&intent_id)
            .await
            .map_err(|e| gateway_failure("cancel", e))?;

        let updated = self
            .bookings
            .transition_deposit(booking.id, DepositStatus::Pending, DepositStatus::Cancelled)
            .await?
            .ok_or_else(|| stale_state(&booking))?;
        self.ledger
            .append(
                booking.id,
                DepositAction::Cancelled.as_str(),
                booking.deposit_amount_cents,
                None,
                actor,
            )
            .await?;

        info!(reference = %booking.booking_reference, "Deposit hold released");
        record_deposit_operation("cancel", true);
        Ok(self.response(updated))
    }

    /// Refunds part or all of a captured deposit. `requested_cents = None`
    /// refunds the remainder.
    pub async fn refund(
        &self,
        booking_id: i64,
        requested_cents: Option<i64>,
        reason: Option<&str>,
        actor: &str,
    ) -> Result<DepositResponse, ApiError> {
        let booking = self.load(booking_id).await?;
        let plan = deposit::plan_refund(
            booking.deposit_status,
            booking.deposit_amount_cents,
            booking.deposit_refund_cents,
            requested_cents,
        )
        .map_err(guard_to_conflict)?;
        let intent_id = self.intent_id(&booking)?;

        self.gateway
            .refund(&intent_id, plan.amount_cents)
            .await
            .map_err(|e| gateway_failure("refund", e))?;

        let updated = self
            .bookings
            .apply_refund(booking.id, plan.refunded_after_cents, plan.new_status)
            .await?
            .ok_or_else(|| stale_state(&booking))?;
        self.ledger
            .append(
                booking.id,
                plan.action.as_str(),
                plan.amount_cents,
                reason,
                actor,
            )
            .await?;

        info!(
            reference = %booking.booking_reference,
            amount_cents = plan.amount_cents,
            new_status = %plan.new_status,
            "Deposit refunded"
        );
        record_deposit_operation("refund", true);
        Ok(self.response(updated))
    }

    /// Audit trail for a booking's deposit.
    pub async fn ledger(&self, booking_id: i64) -> Result<Vec<DepositLedgerEntry>, ApiError> {
        // 404 on unknown booking rather than an empty ledger.
        self.load(booking_id).await?;
        let rows = self.ledger.list_for_booking(booking_id).await?;
        Ok(rows.into_iter().map(DepositLedgerEntry::from).collect())
    }

    fn intent_id(&self, booking: &Booking) -> Result<String, ApiError> {
        booking.payment_intent_id.clone().ok_or_else(|| {
            ApiError::Internal(format!(
                "Booking {} has deposit status {} but no payment intent",
                booking.booking_reference, booking.deposit_status
            ))
        })
    }

    fn response(&self, entity: BookingEntity) -> DepositResponse {
        let booking: Booking = entity.into();
        DepositResponse::from_booking(&booking)
    }
}

fn guard_to_conflict(e: DepositGuardError) -> ApiError {
    ApiError::Conflict(e.to_string())
}

fn gateway_failure(operation: &'static str, e: GatewayError) -> ApiError {
    record_deposit_operation(operation, false);
    ApiError::ExternalService(e.to_string())
}

/// The booking changed underneath us between the guard check and the
/// conditional update. Treated as a conflict so the caller retries.
fn stale_state(booking: &Booking) -> ApiError {
    ApiError::Conflict(format!(
        "Deposit state for booking {} changed concurrently",
        booking.booking_reference
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_errors_map_to_conflict() {
        let err = guard_to_conflict(DepositGuardError::NotCapturable(DepositStatus::None));
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn test_ledger_entry_from_entity() {
        let entity = DepositTransactionEntity {
            id: 1,
            booking_id: 7,
            action: "captured".to_string(),
            amount_cents: 5000,
            reason: None,
            actor: "staff".to_string(),
            created_at: Utc::now(),
        };
        let entry = DepositLedgerEntry::from(entity);
        assert_eq!(entry.action, "captured");
        assert_eq!(entry.amount_cents, 5000);
    }
}
