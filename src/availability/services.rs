//! Availability service functions with database access.
//!
//! These functions query the database and cache, build engine inputs, and
//! hand the decision to [`super::engine`].

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::AppCache;

use super::calculators::{self, QuoteResult};
use super::engine::{
    self, Availability, ClockTime, ExistingBooking, SlotCandidate, TimeRange, UnavailableReason,
};
use super::models::{
    Booking, BookingStatus, Field, MaintenanceSchedule, OpeningHours, SubField, SubFieldStatus,
};
use super::queries::{self, NewBooking};

/// Booking and availability error types
#[derive(Debug)]
pub enum BookingError {
    FieldNotFound(Uuid),
    SubFieldNotFound(Uuid),
    BookingNotFound(Uuid),
    Unavailable {
        reason: UnavailableReason,
    },
    InvalidTransition {
        from: String,
        to: BookingStatus,
    },
    Database(sqlx::Error),
}

impl std::fmt::Display for BookingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingError::FieldNotFound(id) => write!(f, "Field {} not found", id),
            BookingError::SubFieldNotFound(id) => write!(f, "Sub-field {} not found", id),
            BookingError::BookingNotFound(id) => write!(f, "Booking {} not found", id),
            BookingError::Unavailable { reason } => write!(f, "Slot unavailable: {}", reason),
            BookingError::InvalidTransition { from, to } => {
                write!(f, "Cannot move booking from '{}' to '{}'", from, to)
            }
            BookingError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for BookingError {}

impl From<sqlx::Error> for BookingError {
    fn from(e: sqlx::Error) -> Self {
        BookingError::Database(e)
    }
}

/// Result of slot enumeration
#[derive(Debug, Clone)]
pub struct SlotListing {
    pub opening_window: Option<TimeRange>,
    pub slots: Vec<TimeRange>,
}

/// Load a sub-field, cache first
pub async fn load_subfield(
    pool: &PgPool,
    cache: &AppCache,
    subfield_id: Uuid,
) -> Result<Arc<SubField>, BookingError> {
    if let Some(cached) = cache.subfields.get(&subfield_id).await {
        debug!("Cache HIT for sub-field: {}", subfield_id);
        return Ok(cached);
    }
    debug!("Cache MISS for sub-field: {}", subfield_id);

    let subfield = queries::get_subfield(pool, subfield_id)
        .await?
        .ok_or(BookingError::SubFieldNotFound(subfield_id))?;
    let subfield = Arc::new(subfield);
    cache.subfields.insert(subfield_id, subfield.clone()).await;
    Ok(subfield)
}

/// Load a field's opening hours, cache first
pub async fn load_opening_hours(
    pool: &PgPool,
    cache: &AppCache,
    field_id: Uuid,
) -> Result<Arc<Vec<OpeningHours>>, BookingError> {
    if let Some(cached) = cache.opening_hours.get(&field_id).await {
        debug!("Cache HIT for opening hours: {}", field_id);
        return Ok(cached);
    }
    debug!("Cache MISS for opening hours: {}", field_id);

    let hours = Arc::new(queries::get_opening_hours(pool, field_id).await?);
    cache.opening_hours.insert(field_id, hours.clone()).await;
    Ok(hours)
}

/// A field together with its weekly opening hours
pub async fn field_schedule(
    pool: &PgPool,
    cache: &AppCache,
    field_id: Uuid,
) -> Result<(Field, Arc<Vec<OpeningHours>>), BookingError> {
    let field = queries::get_field(pool, field_id)
        .await?
        .ok_or(BookingError::FieldNotFound(field_id))?;
    let hours = load_opening_hours(pool, cache, field_id).await?;
    Ok((field, hours))
}

/// Fetch bookings and maintenance for the candidate, then run the engine.
///
/// Returns the verdict and, when the candidate parsed, its range.
async fn decide(
    conn: &mut PgConnection,
    subfield: &SubField,
    hours: &[OpeningHours],
    candidate: &SlotCandidate,
) -> Result<(Availability, Option<TimeRange>), sqlx::Error> {
    let bookings =
        queries::find_bookings_for_date(&mut *conn, subfield.id, candidate.date).await?;
    let existing: Vec<ExistingBooking> = bookings.iter().map(ExistingBooking::from).collect();

    let range = engine::candidate_range(candidate).ok();
    let schedules = match range {
        Some(range) => {
            queries::find_maintenance_overlapping(
                &mut *conn,
                subfield.id,
                range.start.on(candidate.date),
                range.end.on(candidate.date),
            )
            .await?
        }
        None => Vec::new(),
    };

    let verdict = engine::evaluate_slot_with_maintenance(
        subfield.status(),
        hours,
        &existing,
        &schedules,
        candidate,
    );
    Ok((verdict, range))
}

/// Check whether a candidate range on a sub-field can be booked.
pub async fn check_availability(
    pool: &PgPool,
    cache: &AppCache,
    subfield_id: Uuid,
    candidate: &SlotCandidate,
) -> Result<Availability, BookingError> {
    let subfield = load_subfield(pool, cache, subfield_id).await?;
    let hours = load_opening_hours(pool, cache, subfield.field_id).await?;

    let mut conn = pool.acquire().await?;
    let (verdict, _) = decide(&mut conn, &subfield, &hours, candidate).await?;

    debug!(
        "Availability for {} on {} {}-{}: {:?}",
        subfield_id, candidate.date, candidate.start, candidate.end, verdict
    );
    Ok(verdict)
}

/// Remove slots that overlap active maintenance
pub fn drop_maintenance_slots(
    slots: Vec<TimeRange>,
    status: SubFieldStatus,
    schedules: &[MaintenanceSchedule],
    date: NaiveDate,
) -> Vec<TimeRange> {
    slots
        .into_iter()
        .filter(|slot| {
            engine::effective_status(status, schedules, date, slot) != SubFieldStatus::Maintenance
        })
        .collect()
}

/// List bookable slots of `duration_minutes` on `date`, stepping by `step_minutes`.
pub async fn list_available_slots(
    pool: &PgPool,
    cache: &AppCache,
    subfield_id: Uuid,
    date: NaiveDate,
    duration_minutes: u16,
    step_minutes: u16,
) -> Result<SlotListing, BookingError> {
    let subfield = load_subfield(pool, cache, subfield_id).await?;
    let hours = load_opening_hours(pool, cache, subfield.field_id).await?;
    let opening_window = engine::opening_window_for_day(&hours, date);

    let bookings = queries::find_bookings_for_date(pool, subfield_id, date).await?;
    let existing: Vec<ExistingBooking> = bookings.iter().map(ExistingBooking::from).collect();

    let status = subfield.status();
    let slots = engine::available_slots(
        status,
        &hours,
        &existing,
        date,
        duration_minutes,
        step_minutes,
    );

    let schedules = queries::find_maintenance_overlapping(
        pool,
        subfield_id,
        ClockTime::MIDNIGHT.on(date),
        ClockTime::END_OF_DAY.on(date),
    )
    .await?;
    let slots = drop_maintenance_slots(slots, status, &schedules, date);

    Ok(SlotListing {
        opening_window,
        slots,
    })
}

/// Price a range on a sub-field at its hourly rate.
///
/// `Ok(None)` when the range is malformed or empty.
pub async fn quote_for_subfield(
    pool: &PgPool,
    cache: &AppCache,
    subfield_id: Uuid,
    start: &str,
    end: &str,
    currency: &str,
) -> Result<Option<QuoteResult>, BookingError> {
    let subfield = load_subfield(pool, cache, subfield_id).await?;
    Ok(calculators::quote(subfield.price, start, end, currency))
}

/// Create a pending booking after re-checking availability.
///
/// The sub-field row stays locked for the whole transaction, so concurrent
/// submissions for the same court are serialized and the later one sees the
/// earlier booking.
pub async fn create_booking(
    pool: &PgPool,
    subfield_id: Uuid,
    customer_id: Option<Uuid>,
    candidate: &SlotCandidate,
) -> Result<Booking, BookingError> {
    let mut tx = pool.begin().await?;

    let subfield = queries::lock_subfield(&mut *tx, subfield_id)
        .await?
        .ok_or(BookingError::SubFieldNotFound(subfield_id))?;
    // Read through the transaction rather than the cache
    let hours = queries::get_opening_hours(&mut *tx, subfield.field_id).await?;

    let (verdict, range) = decide(&mut tx, &subfield, &hours, candidate).await?;
    let range = match (verdict, range) {
        (Availability::Available, Some(range)) => range,
        (Availability::Unavailable(reason), _) => return Err(BookingError::Unavailable { reason }),
        (Availability::Available, None) => {
            return Err(BookingError::Unavailable {
                reason: UnavailableReason::MalformedTime,
            })
        }
    };

    let new_booking = NewBooking {
        subfield_id,
        customer_id,
        date: candidate.date,
        begin_time: range.start.on(candidate.date),
        end_time: range.end.on(candidate.date),
        total_price: calculators::calculate_booking_price(subfield.price, &range),
    };
    let booking = queries::insert_booking(&mut *tx, &new_booking).await?;
    tx.commit().await?;

    info!(
        "Booking {} created for sub-field {} on {} {}-{} (total {})",
        booking.id, subfield_id, candidate.date, range.start, range.end, booking.total_price
    );
    Ok(booking)
}

/// Move a booking along pending -> paid / pending -> cancel.
pub async fn update_booking_status(
    pool: &PgPool,
    booking_id: Uuid,
    next: BookingStatus,
) -> Result<Booking, BookingError> {
    let mut tx = pool.begin().await?;

    let booking = queries::lock_booking(&mut *tx, booking_id)
        .await?
        .ok_or(BookingError::BookingNotFound(booking_id))?;

    let allowed = booking
        .status()
        .map(|current| current.can_transition_to(next))
        .unwrap_or(false);
    if !allowed {
        return Err(BookingError::InvalidTransition {
            from: booking.status,
            to: next,
        });
    }

    let updated = queries::update_booking_status(&mut *tx, booking_id, next.as_str()).await?;
    tx.commit().await?;

    info!("Booking {} moved from {} to {}", booking_id, booking.status, next);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use rust_decimal::Decimal;

    fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        date.and_hms_opt(h, m, 0).unwrap()
    }

    fn range(start: &str, end: &str) -> TimeRange {
        TimeRange::new(ClockTime::parse(start).unwrap(), ClockTime::parse(end).unwrap()).unwrap()
    }

    #[test]
    fn test_booking_error_display() {
        let id = Uuid::nil();
        let err = BookingError::SubFieldNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));

        let err = BookingError::Unavailable {
            reason: UnavailableReason::Conflict,
        };
        assert!(err.to_string().contains("overlaps an existing booking"));

        let err = BookingError::InvalidTransition {
            from: "paid".to_string(),
            to: BookingStatus::Cancel,
        };
        assert_eq!(err.to_string(), "Cannot move booking from 'paid' to 'cancel'");
    }

    #[test]
    fn test_drop_maintenance_slots() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let schedules = vec![MaintenanceSchedule {
            id: Uuid::nil(),
            subfield_id: Uuid::nil(),
            start_date: at(date, 10, 0),
            end_date: at(date, 11, 0),
            reason: "net replacement".to_string(),
            status: "SCHEDULED".to_string(),
        }];
        let slots = vec![
            range("09:00", "10:00"),
            range("10:00", "11:00"),
            range("10:30", "11:30"),
            range("11:00", "12:00"),
        ];

        let kept = drop_maintenance_slots(slots, SubFieldStatus::Available, &schedules, date);
        assert_eq!(kept, vec![range("09:00", "10:00"), range("11:00", "12:00")]);
    }

    // Database-backed tests. Each gets a fresh database with migrations applied.

    fn saturday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn slot(start: &str, end: &str) -> SlotCandidate {
        SlotCandidate::new(saturday(), start.to_string(), end.to_string())
    }

    /// Insert a field with one AVAILABLE court priced at 100000 per hour
    async fn seed_court(pool: &PgPool) -> anyhow::Result<(Uuid, Uuid)> {
        let field_id = Uuid::new_v4();
        let subfield_id = Uuid::new_v4();
        sqlx::query("INSERT INTO fields (id, owner_id, name, location) VALUES ($1, $2, $3, $4)")
            .bind(field_id)
            .bind(Uuid::new_v4())
            .bind("Riverside Club")
            .bind("District 7")
            .execute(pool)
            .await?;
        sqlx::query(
            "INSERT INTO sub_fields (id, field_id, name, status, price) VALUES ($1, $2, $3, 'AVAILABLE', 100000)",
        )
        .bind(subfield_id)
        .bind(field_id)
        .bind("Court 1")
        .execute(pool)
        .await?;
        Ok((field_id, subfield_id))
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_booking_prices_and_stores_pending(pool: PgPool) -> anyhow::Result<()> {
        let (_, subfield_id) = seed_court(&pool).await?;
        let customer = Uuid::new_v4();

        let booking = create_booking(&pool, subfield_id, Some(customer), &slot("09:00", "11:30")).await?;
        assert_eq!(booking.status, "pending");
        assert_eq!(booking.customer_id, Some(customer));
        assert_eq!(booking.total_price, Decimal::from(250_000));
        assert_eq!(booking.begin_time, at(saturday(), 9, 0));
        assert_eq!(booking.end_time, at(saturday(), 11, 30));

        let stored = queries::find_bookings_for_date(&pool, subfield_id, saturday()).await?;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, booking.id);
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_concurrent_overlapping_bookings_admit_one(pool: PgPool) -> anyhow::Result<()> {
        let (_, subfield_id) = seed_court(&pool).await?;
        let first = slot("10:00", "11:00");
        let second = slot("10:30", "11:30");

        let (a, b) = tokio::join!(
            create_booking(&pool, subfield_id, None, &first),
            create_booking(&pool, subfield_id, None, &second),
        );

        let created = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(created, 1);
        let rejected = if a.is_ok() { b } else { a };
        assert!(matches!(
            rejected,
            Err(BookingError::Unavailable {
                reason: UnavailableReason::Conflict
            })
        ));

        let stored = queries::find_bookings_for_date(&pool, subfield_id, saturday()).await?;
        assert_eq!(stored.len(), 1);
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_adjacent_booking_is_accepted(pool: PgPool) -> anyhow::Result<()> {
        let (_, subfield_id) = seed_court(&pool).await?;
        create_booking(&pool, subfield_id, None, &slot("10:00", "12:00")).await?;
        create_booking(&pool, subfield_id, None, &slot("12:00", "13:00")).await?;

        let stored = queries::find_bookings_for_date(&pool, subfield_id, saturday()).await?;
        assert_eq!(stored.len(), 2);
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_booking_rejects_closed_court(pool: PgPool) -> anyhow::Result<()> {
        let (_, subfield_id) = seed_court(&pool).await?;
        sqlx::query("UPDATE sub_fields SET status = 'CLOSED' WHERE id = $1")
            .bind(subfield_id)
            .execute(&pool)
            .await?;

        let result = create_booking(&pool, subfield_id, None, &slot("09:00", "10:00")).await;
        assert!(matches!(
            result,
            Err(BookingError::Unavailable {
                reason: UnavailableReason::SubFieldNotBookable
            })
        ));
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_booking_unknown_subfield(pool: PgPool) -> anyhow::Result<()> {
        let missing = Uuid::new_v4();
        let result = create_booking(&pool, missing, None, &slot("09:00", "10:00")).await;
        assert!(matches!(result, Err(BookingError::SubFieldNotFound(id)) if id == missing));
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_status_transitions(pool: PgPool) -> anyhow::Result<()> {
        let (_, subfield_id) = seed_court(&pool).await?;
        let booking = create_booking(&pool, subfield_id, None, &slot("09:00", "10:00")).await?;

        let paid = update_booking_status(&pool, booking.id, BookingStatus::Paid).await?;
        assert_eq!(paid.status, "paid");

        let result = update_booking_status(&pool, booking.id, BookingStatus::Cancel).await;
        assert!(matches!(
            result,
            Err(BookingError::InvalidTransition { ref from, to: BookingStatus::Cancel }) if from == "paid"
        ));

        let missing = Uuid::new_v4();
        let result = update_booking_status(&pool, missing, BookingStatus::Paid).await;
        assert!(matches!(result, Err(BookingError::BookingNotFound(id)) if id == missing));
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_cancelled_booking_frees_the_range(pool: PgPool) -> anyhow::Result<()> {
        let (_, subfield_id) = seed_court(&pool).await?;
        let candidate = slot("18:00", "19:00");
        let booking = create_booking(&pool, subfield_id, None, &candidate).await?;

        let cancelled = update_booking_status(&pool, booking.id, BookingStatus::Cancel).await?;
        assert_eq!(cancelled.status, "cancel");
        assert!(queries::find_bookings_for_date(&pool, subfield_id, saturday())
            .await?
            .is_empty());

        let cache = AppCache::new();
        let verdict = check_availability(&pool, &cache, subfield_id, &candidate).await?;
        assert_eq!(verdict, Availability::Available);

        let rebooked = create_booking(&pool, subfield_id, None, &candidate).await?;
        assert_ne!(rebooked.id, booking.id);
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_field_schedule(pool: PgPool) -> anyhow::Result<()> {
        let (field_id, _) = seed_court(&pool).await?;
        let cache = AppCache::new();

        let (field, hours) = field_schedule(&pool, &cache, field_id).await?;
        assert_eq!(field.name, "Riverside Club");
        assert!(hours.is_empty());

        sqlx::query(
            "INSERT INTO opening_hours (field_id, day_of_week, open_time, close_time) VALUES ($1, 'SATURDAY', '08:00', '22:00')",
        )
        .bind(field_id)
        .execute(&pool)
        .await?;

        // Still served from cache until the field is invalidated
        let (_, hours) = field_schedule(&pool, &cache, field_id).await?;
        assert!(hours.is_empty());
        cache.invalidate_field(field_id).await;
        let (_, hours) = field_schedule(&pool, &cache, field_id).await?;
        assert_eq!(hours.len(), 1);

        let missing = Uuid::new_v4();
        let result = field_schedule(&pool, &cache, missing).await;
        assert!(matches!(result, Err(BookingError::FieldNotFound(id)) if id == missing));
        Ok(())
    }
}
