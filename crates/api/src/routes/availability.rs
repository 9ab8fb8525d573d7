//! Public availability endpoint.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::booking::AvailabilityResponse;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    /// `YYYY-MM-DD`.
    pub date: String,
}

/// GET /api/v1/availability?date=YYYY-MM-DD
pub async fn get_availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let service = state.booking_service();
    Ok(Json(service.availability(&query.date).await?))
}
