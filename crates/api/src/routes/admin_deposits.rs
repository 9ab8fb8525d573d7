//! Staff deposit endpoints.
//!
//! All operations are keyed by booking id and delegate the gateway
//! sequencing to `DepositService`.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::deposits::{DepositLedgerEntry, DepositResponse};

const STAFF_ACTOR: &str = "staff";

/// POST /api/v1/admin/bookings/{id}/create-payment-intent
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DepositResponse>, ApiError> {
    let response = state.deposit_service().create_intent(id, STAFF_ACTOR).await?;
    Ok(Json(response))
}

/// POST /api/v1/admin/bookings/{id}/capture-deposit
pub async fn capture_deposit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DepositResponse>, ApiError> {
    let response = state.deposit_service().capture(id, STAFF_ACTOR).await?;
    Ok(Json(response))
}

/// POST /api/v1/admin/bookings/{id}/cancel-deposit
pub async fn cancel_deposit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DepositResponse>, ApiError> {
    let response = state.deposit_service().cancel(id, STAFF_ACTOR).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundDepositRequest {
    /// Cents; omitted means "refund the remainder".
    pub amount_cents: Option<i64>,
    pub reason: Option<String>,
}

/// POST /api/v1/admin/bookings/{id}/refund-deposit
pub async fn refund_deposit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<RefundDepositRequest>,
) -> Result<Json<DepositResponse>, ApiError> {
    let response = state
        .deposit_service()
        .refund(id, request.amount_cents, request.reason.as_deref(), STAFF_ACTOR)
        .await?;
    Ok(Json(response))
}

/// GET /api/v1/admin/bookings/{id}/deposit-ledger
pub async fn deposit_ledger(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<DepositLedgerEntry>>, ApiError> {
    let entries = state.deposit_service().ledger(id).await?;
    Ok(Json(entries))
}
