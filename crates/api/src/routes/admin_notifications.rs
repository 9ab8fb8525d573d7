//! Staff notification feed endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use domain::models::Notification;
use persistence::repositories::NotificationRepository;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

/// GET /api/v1/admin/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let repo = NotificationRepository::new(state.pool.clone());
    let notifications = repo.list(query.unread_only, limit).await?;
    Ok(Json(notifications.into_iter().map(Into::into).collect()))
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

/// GET /api/v1/admin/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let repo = NotificationRepository::new(state.pool.clone());
    Ok(Json(UnreadCountResponse {
        unread: repo.unread_count().await?,
    }))
}

/// POST /api/v1/admin/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Notification>, ApiError> {
    let repo = NotificationRepository::new(state.pool.clone());
    let notification = repo
        .mark_read(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;
    Ok(Json(notification.into()))
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// POST /api/v1/admin/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let repo = NotificationRepository::new(state.pool.clone());
    Ok(Json(MarkAllReadResponse {
        updated: repo.mark_all_read().await?,
    }))
}

/// POST /api/v1/admin/notifications/{id}/dismiss
pub async fn dismiss(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Notification>, ApiError> {
    let repo = NotificationRepository::new(state.pool.clone());
    let notification = repo
        .dismiss(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;
    Ok(Json(notification.into()))
}
