//! Staff booking management endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;

use domain::models::booking::{BookingDetailResponse, BookingStatus};

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    /// `YYYY-MM-DD`, defaults to today.
    pub from: Option<String>,
    /// `YYYY-MM-DD`, defaults to `from` + 30 days.
    pub to: Option<String>,
    pub status: Option<String>,
}

/// GET /api/v1/admin/bookings
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<BookingDetailResponse>>, ApiError> {
    let from = match &query.from {
        Some(s) => parse_date(s)?,
        None => Utc::now().date_naive(),
    };
    let to = match &query.to {
        Some(s) => parse_date(s)?,
        None => from + Duration::days(30),
    };
    if to < from {
        return Err(ApiError::Validation(
            "'to' must not be before 'from'".to_string(),
        ));
    }

    let status = match &query.status {
        Some(s) => Some(
            BookingStatus::parse(s)
                .ok_or_else(|| ApiError::Validation(format!("Unknown status '{}'", s)))?,
        ),
        None => None,
    };

    let bookings = state
        .booking_service()
        .list(from, to, status.map(|s| s.as_str()))
        .await?;
    Ok(Json(bookings))
}

/// GET /api/v1/admin/bookings/{reference}
pub async fn get_booking(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<BookingDetailResponse>, ApiError> {
    let detail = state
        .booking_service()
        .detail_by_reference(&reference)
        .await?;
    Ok(Json(detail))
}

/// POST /api/v1/admin/bookings/{id}/confirm
pub async fn confirm_booking(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BookingDetailResponse>, ApiError> {
    let detail = state.booking_service().confirm(id).await?;
    Ok(Json(detail))
}

/// POST /api/v1/admin/bookings/{id}/no-show
pub async fn mark_no_show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BookingDetailResponse>, ApiError> {
    let detail = state.booking_service().mark_no_show(id).await?;
    Ok(Json(detail))
}

/// POST /api/v1/admin/bookings/{id}/complete
pub async fn complete_booking(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BookingDetailResponse>, ApiError> {
    let detail = state.booking_service().complete(id).await?;
    Ok(Json(detail))
}

fn parse_date(input: &str) -> Result<NaiveDate, ApiError> {
    shared::validation::parse_booking_date(input).map_err(|e| ApiError::Validation(e.to_string()))
}
