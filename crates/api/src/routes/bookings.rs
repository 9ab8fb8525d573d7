//! Public booking endpoints: creation and token-based self service.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use domain::models::booking::{
    BookingDetailResponse, CreateBookingRequest, CreateBookingResponse, ReconfirmRequest,
};

use crate::app::AppState;
use crate::error::ApiError;

/// POST /api/v1/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), ApiError> {
    let response = state.booking_service().create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/bookings/cancel/{token}
pub async fn get_cancel_details(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<BookingDetailResponse>, ApiError> {
    let detail = state
        .booking_service()
        .detail_by_cancellation_token(&token)
        .await?;
    Ok(Json(detail))
}

/// POST /api/v1/bookings/cancel/{token}
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<BookingDetailResponse>, ApiError> {
    let detail = state.booking_service().cancel_by_token(&token).await?;
    Ok(Json(detail))
}

/// GET /api/v1/bookings/reconfirm/{token}
pub async fn get_reconfirm_details(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<BookingDetailResponse>, ApiError> {
    let detail = state
        .booking_service()
        .detail_by_reconfirmation_token(&token)
        .await?;
    Ok(Json(detail))
}

/// POST /api/v1/bookings/reconfirm/{token}
pub async fn respond_to_reconfirmation(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(request): Json<ReconfirmRequest>,
) -> Result<Json<BookingDetailResponse>, ApiError> {
    let detail = state
        .booking_service()
        .respond_to_reconfirmation(&token, request.action)
        .await?;
    Ok(Json(detail))
}
