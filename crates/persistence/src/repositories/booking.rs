//! Booking repository.
//!
//! The create path takes a per-slot advisory lock inside its transaction so
//! two concurrent requests for the same slot serialize on the capacity check.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::deposit::DepositStatus;
use domain::services::segments;

use crate::entities::{BookingEntity, CustomerEntity};

/// Customer fields captured on the public booking form. The row is upserted
/// by email inside the booking transaction.
#[derive(Debug, Clone)]
pub struct CustomerUpsert {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Fields for a new booking row. Tokens and reference are generated by the
/// caller so the service layer owns their format.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub party_size: i32,
    pub status: String,
    pub source: String,
    pub special_requests: Option<String>,
    pub booking_reference: String,
    pub cancellation_token: Uuid,
    pub deposit_amount_cents: i64,
    pub deposit_status: String,
}

#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Seats already booked for a slot, counting every non-cancelled booking.
    pub async fn booked_seats(
        &self,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<i64, sqlx::Error> {
        let seats: (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(party_size), 0)::BIGINT
            FROM bookings
            WHERE booking_date = $1 AND booking_time = $2 AND status != 'cancelled'
            "#,
        )
        .bind(date)
        .bind(time)
        .fetch_one(&self.pool)
        .await?;
        Ok(seats.0)
    }

    /// Seats booked per slot across a whole day, for availability listings.
    pub async fn booked_seats_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<(NaiveTime, i64)>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT booking_time, COALESCE(SUM(party_size), 0)::BIGINT
            FROM bookings
            WHERE booking_date = $1 AND status != 'cancelled'
            GROUP BY booking_time
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
    }

    /// Creates a booking after re-checking capacity under a per-slot advisory
    /// lock. Upserts the customer and refreshes their stats in the same
    /// transaction. Returns `Ok(None)` when the capacity check rejects the
    /// slot under the lock.
    pub async fn create_checked<F>(
        &self,
        customer: CustomerUpsert,
        new: NewBooking,
        today: NaiveDate,
        capacity_ok: F,
    ) -> Result<Option<(BookingEntity, CustomerEntity)>, sqlx::Error>
    where
        F: FnOnce(i64) -> bool + Send,
    {
        let mut tx = self.pool.begin().await?;

        // Serialize concurrent creates for the same slot. hashtextextended
        // folds the slot key into the bigint the lock call expects.
        let slot_key = format!("{}|{}", new.booking_date, new.booking_time);
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(&slot_key)
            .execute(&mut *tx)
            .await?;

        let booked: (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(party_size), 0)::BIGINT
            FROM bookings
            WHERE booking_date = $1 AND booking_time = $2 AND status != 'cancelled'
            "#,
        )
        .bind(new.booking_date)
        .bind(new.booking_time)
        .fetch_one(&mut *tx)
        .await?;

        if !capacity_ok(booked.0) {
            tx.rollback().await?;
            return Ok(None);
        }

        let customer_row: CustomerEntity = sqlx::query_as(
            r#"
            INSERT INTO customers (name, email, phone)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE
            SET name = EXCLUDED.name,
                phone = COALESCE(EXCLUDED.phone, customers.phone)
            RETURNING *
            "#,
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .fetch_one(&mut *tx)
        .await?;

        let booking: BookingEntity = sqlx::query_as(
            r#"
            INSERT INTO bookings (
                customer_id, booking_date, booking_time, party_size,
                status, source, special_requests, booking_reference,
                cancellation_token, deposit_amount_cents, deposit_status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(customer_row.id)
        .bind(new.booking_date)
        .bind(new.booking_time)
        .bind(new.party_size)
        .bind(&new.status)
        .bind(&new.source)
        .bind(&new.special_requests)
        .bind(&new.booking_reference)
        .bind(new.cancellation_token)
        .bind(new.deposit_amount_cents)
        .bind(&new.deposit_status)
        .fetch_one(&mut *tx)
        .await?;

        let customer_row =
            refresh_customer_stats(&mut tx, customer_row.id, today).await?;

        tx.commit().await?;
        Ok(Some((booking, customer_row)))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<BookingEntity>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<BookingEntity>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM bookings WHERE booking_reference = $1")
            .bind(reference)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn reference_exists(&self, reference: &str) -> Result<bool, sqlx::Error> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM bookings WHERE booking_reference = $1)")
                .bind(reference)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }

    pub async fn find_by_cancellation_token(
        &self,
        token: Uuid,
    ) -> Result<Option<BookingEntity>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM bookings WHERE cancellation_token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
    }

    /// Cancels via the customer-facing token. The status predicate makes the
    /// update a no-op for already-cancelled or completed bookings, so the
    /// caller can tell "cancelled now" from "token known but not cancellable"
    /// by re-fetching on `None`.
    pub async fn cancel_by_cancellation_token(
        &self,
        token: Uuid,
    ) -> Result<Option<BookingEntity>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE bookings
            SET status = 'cancelled', reconfirmation_pending = FALSE
            WHERE cancellation_token = $1 AND status IN ('pending', 'confirmed')
            RETURNING *
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_by_reconfirmation_token(
        &self,
        token: Uuid,
    ) -> Result<Option<BookingEntity>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM bookings WHERE reconfirmation_token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
    }

    /// Resolves a pending reconfirmation as "still coming".
    pub async fn reconfirm_by_token(
        &self,
        token: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<BookingEntity>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE bookings
            SET reconfirmation_pending = FALSE
            WHERE reconfirmation_token = $1
              AND reconfirmation_pending
              AND status = 'confirmed'
              AND reconfirmation_deadline > $2
            RETURNING *
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
    }

    /// Resolves a pending reconfirmation as a cancellation.
    pub async fn cancel_by_reconfirmation_token(
        &self,
        token: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<BookingEntity>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE bookings
            SET status = 'cancelled', reconfirmation_pending = FALSE
            WHERE reconfirmation_token = $1
              AND reconfirmation_pending
              AND status = 'confirmed'
              AND reconfirmation_deadline > $2
            RETURNING *
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
    }

    /// Staff confirmation of a pending booking. The status predicate makes
    /// repeated calls and races idempotent.
    pub async fn confirm_pending(&self, id: i64) -> Result<Option<BookingEntity>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE bookings
            SET status = 'confirmed'
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn mark_no_show(&self, id: i64) -> Result<Option<BookingEntity>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE bookings
            SET status = 'no_show'
            WHERE id = $1 AND status = 'confirmed'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn mark_completed(&self, id: i64) -> Result<Option<BookingEntity>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE bookings
            SET status = 'completed'
            WHERE id = $1 AND status = 'confirmed'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Confirmed large-party bookings inside the reconfirmation window that
    /// have not been asked yet.
    pub async fn find_due_reconfirmations(
        &self,
        min_party_size: i32,
        today: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<Vec<BookingEntity>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM bookings
            WHERE status = 'confirmed'
              AND party_size >= $1
              AND booking_date >= $2
              AND booking_date <= $3
              AND reconfirmation_sent_at IS NULL
            ORDER BY booking_date, booking_time
            "#,
        )
        .bind(min_party_size)
        .bind(today)
        .bind(window_end)
        .fetch_all(&self.pool)
        .await
    }

    /// Records that the reconfirmation request went out. The NULL predicate
    /// makes a second sweep pass skip rows already claimed, so each booking
    /// gets at most one request.
    pub async fn mark_reconfirmation_sent(
        &self,
        id: i64,
        token: Uuid,
        sent_at: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> Result<Option<BookingEntity>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE bookings
            SET reconfirmation_token = $2,
                reconfirmation_sent_at = $3,
                reconfirmation_deadline = $4,
                reconfirmation_pending = TRUE
            WHERE id = $1 AND reconfirmation_sent_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(sent_at)
        .bind(deadline)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_expired_reconfirmations(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<BookingEntity>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM bookings
            WHERE status = 'confirmed'
              AND reconfirmation_pending
              AND reconfirmation_deadline <= $1
            ORDER BY reconfirmation_deadline
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
    }

    /// Auto-cancels a booking whose reconfirmation deadline passed. The
    /// predicate repeats the expiry condition so a customer response racing
    /// the sweep wins.
    pub async fn cancel_expired_reconfirmation(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<BookingEntity>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE bookings
            SET status = 'cancelled', reconfirmation_pending = FALSE
            WHERE id = $1
              AND status = 'confirmed'
              AND reconfirmation_pending
              AND reconfirmation_deadline <= $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
    }

    /// Attaches the gateway payment intent once the deposit is authorized.
    pub async fn attach_payment_intent(
        &self,
        id: i64,
        payment_intent_id: &str,
        amount_cents: i64,
    ) -> Result<Option<BookingEntity>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE bookings
            SET payment_intent_id = $2,
                deposit_amount_cents = $3,
                deposit_status = 'pending'
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payment_intent_id)
        .bind(amount_cents)
        .fetch_optional(&self.pool)
        .await
    }

    /// Moves the deposit between statuses, guarded by the expected current
    /// status so a concurrent transition cannot regress it.
    pub async fn transition_deposit(
        &self,
        id: i64,
        from: DepositStatus,
        to: DepositStatus,
    ) -> Result<Option<BookingEntity>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE bookings
            SET deposit_status = $3
            WHERE id = $1 AND deposit_status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await
    }

    /// Applies a refund outcome: cumulative refunded amount plus the status
    /// the refund plan decided on.
    pub async fn apply_refund(
        &self,
        id: i64,
        refunded_after_cents: i64,
        new_status: DepositStatus,
    ) -> Result<Option<BookingEntity>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE bookings
            SET deposit_refund_cents = $2, deposit_status = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(refunded_after_cents)
        .bind(new_status.as_str())
        .fetch_optional(&self.pool)
        .await
    }

    /// Dashboard listing, newest service first.
    pub async fn list_for_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        status: Option<&str>,
    ) -> Result<Vec<BookingEntity>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM bookings
            WHERE booking_date >= $1
              AND booking_date <= $2
              AND ($3::TEXT IS NULL OR status = $3)
            ORDER BY booking_date DESC, booking_time DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(status)
        .fetch_all(&self.pool)
        .await
    }
}

/// Recomputes a customer's aggregate stats and segment from their booking
/// history. Runs inside the caller's transaction.
async fn refresh_customer_stats(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    customer_id: i64,
    today: NaiveDate,
) -> Result<CustomerEntity, sqlx::Error> {
    let stats: (i64, i64, Option<f64>, Option<NaiveDate>) = sqlx::query_as(
        r#"
        SELECT COUNT(*)::BIGINT,
               COUNT(*) FILTER (WHERE booking_date >= $2 - INTERVAL '90 days')::BIGINT,
               AVG(party_size)::FLOAT8,
               MAX(booking_date)
        FROM bookings
        WHERE customer_id = $1 AND status != 'cancelled'
        "#,
    )
    .bind(customer_id)
    .bind(today)
    .fetch_one(&mut **tx)
    .await?;

    let segment = segments::classify(stats.0 as i32, stats.3, today);

    sqlx::query_as(
        r#"
        UPDATE customers
        SET total_bookings = $2,
            recent_bookings = $3,
            average_party_size = $4,
            last_booking_date = $5,
            customer_segment = $6
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(customer_id)
    .bind(stats.0 as i32)
    .bind(stats.1 as i32)
    .bind(stats.2.unwrap_or(0.0))
    .bind(stats.3)
    .bind(segment.as_str())
    .fetch_one(&mut **tx)
    .await
}
