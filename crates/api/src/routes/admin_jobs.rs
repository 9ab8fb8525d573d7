//! Manual triggers for the background jobs. The routes call the same
//! services as the scheduler, so running them by hand is always safe.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use persistence::entities::EmailLogEntity;
use persistence::repositories::EmailLogRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::dispatcher::SweepStats;
use crate::services::reconfirmation::SweepOutcome;

const EMAIL_SWEEP_BATCH: i64 = 50;

/// POST /api/v1/admin/jobs/send-reconfirmations
pub async fn send_reconfirmations(
    State(state): State<AppState>,
) -> Result<Json<SweepOutcome>, ApiError> {
    let outcome = state.reconfirmation_service().run_sweep().await?;
    Ok(Json(outcome))
}

/// POST /api/v1/admin/jobs/process-emails
pub async fn process_emails(State(state): State<AppState>) -> Result<Json<SweepStats>, ApiError> {
    let stats = state
        .dispatcher_service()
        .process_retries(EMAIL_SWEEP_BATCH)
        .await?;
    Ok(Json(stats))
}

#[derive(Debug, Deserialize)]
pub struct ListEmailsQuery {
    pub limit: Option<i64>,
}

/// One outbox row as shown in the dashboard. The rendered payload stays
/// internal; only delivery metadata is exposed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailLogResponse {
    pub email_id: String,
    pub template_key: String,
    pub recipient: String,
    pub status: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub booking_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl From<EmailLogEntity> for EmailLogResponse {
    fn from(e: EmailLogEntity) -> Self {
        Self {
            email_id: e.email_id.to_string(),
            template_key: e.template_key,
            recipient: e.recipient,
            status: e.status,
            attempts: e.attempts,
            last_error: e.last_error,
            booking_id: e.booking_id,
            created_at: e.created_at,
            sent_at: e.sent_at,
        }
    }
}

/// GET /api/v1/admin/emails
pub async fn list_emails(
    State(state): State<AppState>,
    Query(query): Query<ListEmailsQuery>,
) -> Result<Json<Vec<EmailLogResponse>>, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let repo = EmailLogRepository::new(state.pool.clone());
    let entries = repo.list_recent(limit).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
