//! Staff customer directory endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use domain::models::Customer;
use persistence::repositories::CustomerRepository;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListCustomersQuery {
    pub limit: Option<i64>,
}

/// GET /api/v1/admin/customers
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<ListCustomersQuery>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let limit = query.limit.unwrap_or(100).clamp(1, 500);
    let repo = CustomerRepository::new(state.pool.clone());
    let customers = repo.list(limit).await?;
    Ok(Json(customers.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/admin/customers/{email}
pub async fn get_customer(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    let repo = CustomerRepository::new(state.pool.clone());
    let customer = repo
        .find_by_email(&email.to_lowercase())
        .await?
        .ok_or_else(|| ApiError::NotFound("Customer not found".to_string()))?;
    Ok(Json(customer.into()))
}
