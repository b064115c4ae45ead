//! Database queries for the availability engine.
//!
//! Queries return raw `sqlx::Error`s; callers decide how to surface them.
//! Read queries accept any Postgres executor so booking creation can run
//! them inside its transaction.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::models::{Booking, Field, MaintenanceSchedule, OpeningHours, SubField};

/// Get a field (venue) by id
pub async fn get_field<'e, E>(executor: E, field_id: Uuid) -> Result<Option<Field>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let field = sqlx::query_as::<_, Field>(
        r#"
        SELECT id, owner_id, name, location
        FROM fields
        WHERE id = $1
        "#,
    )
    .bind(field_id)
    .fetch_optional(executor)
    .await?;

    Ok(field)
}

/// Get a sub-field by id
pub async fn get_subfield<'e, E>(
    executor: E,
    subfield_id: Uuid,
) -> Result<Option<SubField>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let subfield = sqlx::query_as::<_, SubField>(
        r#"
        SELECT id, field_id, name, status, price, unit_of_time
        FROM sub_fields
        WHERE id = $1
        "#,
    )
    .bind(subfield_id)
    .fetch_optional(executor)
    .await?;

    Ok(subfield)
}

/// Get a sub-field by id and lock its row until the transaction ends
pub async fn lock_subfield<'e, E>(
    executor: E,
    subfield_id: Uuid,
) -> Result<Option<SubField>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let subfield = sqlx::query_as::<_, SubField>(
        r#"
        SELECT id, field_id, name, status, price, unit_of_time
        FROM sub_fields
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(subfield_id)
    .fetch_optional(executor)
    .await?;

    Ok(subfield)
}

/// Get all opening hour rows for a field
pub async fn get_opening_hours<'e, E>(
    executor: E,
    field_id: Uuid,
) -> Result<Vec<OpeningHours>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let hours = sqlx::query_as::<_, OpeningHours>(
        r#"
        SELECT field_id, day_of_week, open_time, close_time, is_open
        FROM opening_hours
        WHERE field_id = $1
        "#,
    )
    .bind(field_id)
    .fetch_all(executor)
    .await?;

    Ok(hours)
}

/// Get opening hours of every field (for cache warming)
pub async fn get_all_opening_hours(pool: &PgPool) -> Result<Vec<OpeningHours>, sqlx::Error> {
    let hours = sqlx::query_as::<_, OpeningHours>(
        r#"
        SELECT field_id, day_of_week, open_time, close_time, is_open
        FROM opening_hours
        ORDER BY field_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(hours)
}

/// Find non-cancelled bookings of a sub-field on a date
pub async fn find_bookings_for_date<'e, E>(
    executor: E,
    subfield_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<Booking>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let bookings = sqlx::query_as::<_, Booking>(
        r#"
        SELECT
            id, subfield_id, customer_id, date,
            begin_time, end_time, total_price, status, created_at
        FROM bookings
        WHERE subfield_id = $1
          AND date = $2
          AND status <> 'cancel'
        ORDER BY begin_time
        "#,
    )
    .bind(subfield_id)
    .bind(date)
    .fetch_all(executor)
    .await?;

    Ok(bookings)
}

/// Find active maintenance schedules of a sub-field overlapping a window
pub async fn find_maintenance_overlapping<'e, E>(
    executor: E,
    subfield_id: Uuid,
    window_start: NaiveDateTime,
    window_end: NaiveDateTime,
) -> Result<Vec<MaintenanceSchedule>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let schedules = sqlx::query_as::<_, MaintenanceSchedule>(
        r#"
        SELECT id, subfield_id, start_date, end_date, reason, status
        FROM maintenance_schedules
        WHERE subfield_id = $1
          AND start_date < $3
          AND end_date > $2
          AND status IN ('SCHEDULED', 'IN_PROGRESS')
        "#,
    )
    .bind(subfield_id)
    .bind(window_start)
    .bind(window_end)
    .fetch_all(executor)
    .await?;

    Ok(schedules)
}

/// Values for a new booking row
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub subfield_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub date: NaiveDate,
    pub begin_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub total_price: Decimal,
}

/// Insert a pending booking
pub async fn insert_booking<'e, E>(
    executor: E,
    booking: &NewBooking,
) -> Result<Booking, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, Booking>(
        r#"
        INSERT INTO bookings
            (id, subfield_id, customer_id, date, begin_time, end_time, total_price, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending')
        RETURNING
            id, subfield_id, customer_id, date,
            begin_time, end_time, total_price, status, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(booking.subfield_id)
    .bind(booking.customer_id)
    .bind(booking.date)
    .bind(booking.begin_time)
    .bind(booking.end_time)
    .bind(booking.total_price)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// Get a booking by id and lock its row until the transaction ends
pub async fn lock_booking<'e, E>(
    executor: E,
    booking_id: Uuid,
) -> Result<Option<Booking>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let booking = sqlx::query_as::<_, Booking>(
        r#"
        SELECT
            id, subfield_id, customer_id, date,
            begin_time, end_time, total_price, status, created_at
        FROM bookings
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(booking_id)
    .fetch_optional(executor)
    .await?;

    Ok(booking)
}

/// Set a booking's status
pub async fn update_booking_status<'e, E>(
    executor: E,
    booking_id: Uuid,
    status: &str,
) -> Result<Booking, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, Booking>(
        r#"
        UPDATE bookings
        SET status = $2
        WHERE id = $1
        RETURNING
            id, subfield_id, customer_id, date,
            begin_time, end_time, total_price, status, created_at
        "#,
    )
    .bind(booking_id)
    .bind(status)
    .fetch_one(executor)
    .await?;

    Ok(row)
}
