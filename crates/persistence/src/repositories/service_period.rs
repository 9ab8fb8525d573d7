//! Service period repository.
//!
//! Mutations rebuild the available_times projection inside the same
//! transaction, so readers never see slots that disagree with the periods.

use chrono::NaiveTime;
use sqlx::PgPool;

use domain::models::ServicePeriod;
use domain::services::slots;

use crate::entities::ServicePeriodEntity;

/// Parsed fields for a new service period. Time strings from the request
/// payload are parsed and validated before they reach the repository.
#[derive(Debug, Clone)]
pub struct NewServicePeriod {
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub last_order_time: NaiveTime,
    pub kitchen_closing_time: NaiveTime,
    pub interval_minutes: i32,
    pub enabled: bool,
    pub period_type: String,
    pub sort_order: i32,
}

/// Partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ServicePeriodPatch {
    pub name: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub last_order_time: Option<NaiveTime>,
    pub kitchen_closing_time: Option<NaiveTime>,
    pub interval_minutes: Option<i32>,
    pub enabled: Option<bool>,
    pub period_type: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Clone)]
pub struct ServicePeriodRepository {
    pool: PgPool,
}

impl ServicePeriodRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> Result<Vec<ServicePeriodEntity>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM service_periods ORDER BY sort_order, start_time")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn find_by_id(
        &self,
        id: i64,
    ) -> Result<Option<ServicePeriodEntity>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM service_periods WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// The generated slot projection, in ascending time order.
    pub async fn available_times(&self) -> Result<Vec<NaiveTime>, sqlx::Error> {
        let rows: Vec<(NaiveTime,)> =
            sqlx::query_as("SELECT slot_time FROM available_times ORDER BY slot_time")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    pub async fn create(
        &self,
        new: &NewServicePeriod,
    ) -> Result<ServicePeriodEntity, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let entity: ServicePeriodEntity = sqlx::query_as(
            r#"
            INSERT INTO service_periods (
                name, start_time, end_time, last_order_time,
                kitchen_closing_time, interval_minutes, enabled,
                period_type, sort_order
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(new.start_time)
        .bind(new.end_time)
        .bind(new.last_order_time)
        .bind(new.kitchen_closing_time)
        .bind(new.interval_minutes)
        .bind(new.enabled)
        .bind(&new.period_type)
        .bind(new.sort_order)
        .fetch_one(&mut *tx)
        .await?;
        rebuild_available_times(&mut tx).await?;
        tx.commit().await?;
        Ok(entity)
    }

    pub async fn update(
        &self,
        id: i64,
        patch: &ServicePeriodPatch,
    ) -> Result<Option<ServicePeriodEntity>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let entity: Option<ServicePeriodEntity> = sqlx::query_as(
            r#"
            UPDATE service_periods
            SET name = COALESCE($2, name),
                start_time = COALESCE($3, start_time),
                end_time = COALESCE($4, end_time),
                last_order_time = COALESCE($5, last_order_time),
                kitchen_closing_time = COALESCE($6, kitchen_closing_time),
                interval_minutes = COALESCE($7, interval_minutes),
                enabled = COALESCE($8, enabled),
                period_type = COALESCE($9, period_type),
                sort_order = COALESCE($10, sort_order)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(patch.start_time)
        .bind(patch.end_time)
        .bind(patch.last_order_time)
        .bind(patch.kitchen_closing_time)
        .bind(patch.interval_minutes)
        .bind(patch.enabled)
        .bind(&patch.period_type)
        .bind(patch.sort_order)
        .fetch_optional(&mut *tx)
        .await?;
        if entity.is_some() {
            rebuild_available_times(&mut tx).await?;
        }
        tx.commit().await?;
        Ok(entity)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM service_periods WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = result.rows_affected() > 0;
        if deleted {
            rebuild_available_times(&mut tx).await?;
        }
        tx.commit().await?;
        Ok(deleted)
    }
}

/// Regenerates the slot projection from the periods currently visible to
/// the transaction.
async fn rebuild_available_times(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
) -> Result<(), sqlx::Error> {
    let entities: Vec<ServicePeriodEntity> =
        sqlx::query_as("SELECT * FROM service_periods ORDER BY sort_order, start_time")
            .fetch_all(&mut **tx)
            .await?;
    let periods: Vec<ServicePeriod> = entities.into_iter().map(Into::into).collect();
    let slot_times = slots::generate_slots(&periods);

    sqlx::query("DELETE FROM available_times")
        .execute(&mut **tx)
        .await?;
    for slot in slot_times {
        sqlx::query("INSERT INTO available_times (slot_time) VALUES ($1)")
            .bind(slot)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}
