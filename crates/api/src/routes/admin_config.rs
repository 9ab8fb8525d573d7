//! Staff booking configuration endpoints.

use axum::{extract::State, Json};
use validator::Validate;

use domain::models::{BookingConfig, UpdateBookingConfigRequest};
use persistence::repositories::{BookingConfigPatch, BookingConfigRepository};

use crate::app::AppState;
use crate::error::ApiError;

/// GET /api/v1/admin/config
pub async fn get_config(State(state): State<AppState>) -> Result<Json<BookingConfig>, ApiError> {
    let repo = BookingConfigRepository::new(state.pool.clone());
    Ok(Json(repo.get().await?.into()))
}

/// PUT /api/v1/admin/config
pub async fn update_config(
    State(state): State<AppState>,
    Json(request): Json<UpdateBookingConfigRequest>,
) -> Result<Json<BookingConfig>, ApiError> {
    request.validate()?;
    request
        .validate_days_of_week()
        .map_err(ApiError::Validation)?;

    let patch = BookingConfigPatch {
        booking_enabled: request.booking_enabled,
        max_advance_days: request.max_advance_days,
        max_party_size: request.max_party_size,
        total_seats: request.total_seats,
        capacity_policy: request.capacity_policy.map(|p| p.as_str().to_string()),
        seats_per_slot: request.seats_per_slot,
        closed_dates: request.closed_dates,
        closed_days_of_week: request.closed_days_of_week,
        // An empty string clears the stored message; absent leaves it alone.
        suspension_message: request.suspension_message.map(|m| {
            if m.trim().is_empty() {
                None
            } else {
                Some(m)
            }
        }),
        require_review: request.require_review,
        reconfirmation_min_party_size: request.reconfirmation_min_party_size,
        reconfirmation_days_before: request.reconfirmation_days_before,
        reconfirmation_deadline_hours: request.reconfirmation_deadline_hours,
        deposit_min_party_size: request.deposit_min_party_size,
        deposit_amount_cents: request.deposit_amount_cents,
    };

    let repo = BookingConfigRepository::new(state.pool.clone());
    Ok(Json(repo.update(&patch).await?.into()))
}
