//! Staff service period configuration endpoints.
//!
//! Every mutation revalidates the period time invariants against the merged
//! configuration before it reaches the repository, which then rebuilds the
//! slot projection in the same transaction.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveTime;
use validator::Validate;

use domain::models::service_period::{
    validate_period_times, CreateServicePeriodRequest, ServicePeriod, ServicePeriodResponse,
    UpdateServicePeriodRequest,
};
use persistence::repositories::{NewServicePeriod, ServicePeriodPatch, ServicePeriodRepository};

use crate::app::AppState;
use crate::error::ApiError;

/// GET /api/v1/admin/service-periods
pub async fn list_periods(
    State(state): State<AppState>,
) -> Result<Json<Vec<ServicePeriodResponse>>, ApiError> {
    let repo = ServicePeriodRepository::new(state.pool.clone());
    let periods = repo.list_all().await?;
    Ok(Json(
        periods
            .into_iter()
            .map(|e| ServicePeriodResponse::from(ServicePeriod::from(e)))
            .collect(),
    ))
}

/// POST /api/v1/admin/service-periods
pub async fn create_period(
    State(state): State<AppState>,
    Json(request): Json<CreateServicePeriodRequest>,
) -> Result<(StatusCode, Json<ServicePeriodResponse>), ApiError> {
    request.validate()?;

    let start_time = parse_time(&request.start_time)?;
    let end_time = parse_time(&request.end_time)?;
    let last_order_time = parse_time(&request.last_order_time)?;
    let kitchen_closing_time = parse_time(&request.kitchen_closing_time)?;

    validate_period_times(
        start_time,
        end_time,
        last_order_time,
        kitchen_closing_time,
        request.interval_minutes,
    )
    .map_err(|e| ApiError::Validation(e.to_string()))?;

    let new = NewServicePeriod {
        name: request.name,
        start_time,
        end_time,
        last_order_time,
        kitchen_closing_time,
        interval_minutes: request.interval_minutes,
        enabled: request.enabled,
        period_type: request.period_type.as_str().to_string(),
        sort_order: request.sort_order,
    };

    let repo = ServicePeriodRepository::new(state.pool.clone());
    let entity = repo.create(&new).await?;
    Ok((
        StatusCode::CREATED,
        Json(ServicePeriodResponse::from(ServicePeriod::from(entity))),
    ))
}

/// PUT /api/v1/admin/service-periods/{id}
pub async fn update_period(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateServicePeriodRequest>,
) -> Result<Json<ServicePeriodResponse>, ApiError> {
    request.validate()?;

    let repo = ServicePeriodRepository::new(state.pool.clone());
    let existing: ServicePeriod = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Service period not found".to_string()))?
        .into();

    let patch = ServicePeriodPatch {
        name: request.name,
        start_time: parse_opt_time(&request.start_time)?,
        end_time: parse_opt_time(&request.end_time)?,
        last_order_time: parse_opt_time(&request.last_order_time)?,
        kitchen_closing_time: parse_opt_time(&request.kitchen_closing_time)?,
        interval_minutes: request.interval_minutes,
        enabled: request.enabled,
        period_type: request.period_type.map(|t| t.as_str().to_string()),
        sort_order: request.sort_order,
    };

    // The invariants hold for the merged configuration, not the patch alone.
    validate_period_times(
        patch.start_time.unwrap_or(existing.start_time),
        patch.end_time.unwrap_or(existing.end_time),
        patch.last_order_time.unwrap_or(existing.last_order_time),
        patch
            .kitchen_closing_time
            .unwrap_or(existing.kitchen_closing_time),
        patch.interval_minutes.unwrap_or(existing.interval_minutes),
    )
    .map_err(|e| ApiError::Validation(e.to_string()))?;

    let entity = repo
        .update(id, &patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Service period not found".to_string()))?;
    Ok(Json(ServicePeriodResponse::from(ServicePeriod::from(
        entity,
    ))))
}

/// DELETE /api/v1/admin/service-periods/{id}
pub async fn delete_period(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let repo = ServicePeriodRepository::new(state.pool.clone());
    if repo.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Service period not found".to_string()))
    }
}

fn parse_time(input: &str) -> Result<NaiveTime, ApiError> {
    shared::validation::parse_booking_time(input).map_err(|e| ApiError::Validation(e.to_string()))
}

fn parse_opt_time(input: &Option<String>) -> Result<Option<NaiveTime>, ApiError> {
    input.as_deref().map(parse_time).transpose()
}
