//! Booking configuration repository (singleton row, id = 1).

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::entities::BookingConfigEntity;

/// Partial update for the booking configuration. `None` keeps the stored
/// value.
#[derive(Debug, Clone, Default)]
pub struct BookingConfigPatch {
    pub booking_enabled: Option<bool>,
    pub max_advance_days: Option<i32>,
    pub max_party_size: Option<i32>,
    pub total_seats: Option<i32>,
    pub capacity_policy: Option<String>,
    pub seats_per_slot: Option<i32>,
    pub closed_dates: Option<Vec<NaiveDate>>,
    pub closed_days_of_week: Option<Vec<i32>>,
    pub suspension_message: Option<Option<String>>,
    pub require_review: Option<bool>,
    pub reconfirmation_min_party_size: Option<i32>,
    pub reconfirmation_days_before: Option<i32>,
    pub reconfirmation_deadline_hours: Option<i32>,
    pub deposit_min_party_size: Option<i32>,
    pub deposit_amount_cents: Option<i64>,
}

#[derive(Clone)]
pub struct BookingConfigRepository {
    pool: PgPool,
}

impl BookingConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self) -> Result<BookingConfigEntity, sqlx::Error> {
        sqlx::query_as("SELECT * FROM booking_config WHERE id = 1")
            .fetch_one(&self.pool)
            .await
    }

    pub async fn update(
        &self,
        patch: &BookingConfigPatch,
    ) -> Result<BookingConfigEntity, sqlx::Error> {
        // suspension_message distinguishes "leave alone" (outer None) from
        // "clear" (inner None), so it cannot ride the COALESCE pattern.
        let set_suspension = patch.suspension_message.is_some();
        let suspension = patch.suspension_message.clone().flatten();
        sqlx::query_as(
            r#"
            UPDATE booking_config
            SET booking_enabled = COALESCE($1, booking_enabled),
                max_advance_days = COALESCE($2, max_advance_days),
                max_party_size = COALESCE($3, max_party_size),
                total_seats = COALESCE($4, total_seats),
                capacity_policy = COALESCE($5, capacity_policy),
                seats_per_slot = COALESCE($6, seats_per_slot),
                closed_dates = COALESCE($7, closed_dates),
                closed_days_of_week = COALESCE($8, closed_days_of_week),
                suspension_message = CASE WHEN $9 THEN $10 ELSE suspension_message END,
                require_review = COALESCE($11, require_review),
                reconfirmation_min_party_size = COALESCE($12, reconfirmation_min_party_size),
                reconfirmation_days_before = COALESCE($13, reconfirmation_days_before),
                reconfirmation_deadline_hours = COALESCE($14, reconfirmation_deadline_hours),
                deposit_min_party_size = COALESCE($15, deposit_min_party_size),
                deposit_amount_cents = COALESCE($16, deposit_amount_cents)
            WHERE id = 1
            RETURNING *
            "#,
        )
        .bind(patch.booking_enabled)
        .bind(patch.max_advance_days)
        .bind(patch.max_party_size)
        .bind(patch.total_seats)
        .bind(&patch.capacity_policy)
        .bind(patch.seats_per_slot)
        .bind(&patch.closed_dates)
        .bind(&patch.closed_days_of_week)
        .bind(set_suspension)
        .bind(suspension)
        .bind(patch.require_review)
        .bind(patch.reconfirmation_min_party_size)
        .bind(patch.reconfirmation_days_before)
        .bind(patch.reconfirmation_deadline_hours)
        .bind(patch.deposit_min_party_size)
        .bind(patch.deposit_amount_cents)
        .fetch_one(&self.pool)
        .await
    }
}
