//! Response DTOs for availability API endpoints.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::engine::{Availability, ClockTime, TimeRange, UnavailableReason};
use super::models::{Booking, Field, OpeningHours};

/// Money value for JSON responses
#[derive(Debug, Clone, Serialize)]
pub struct MoneyResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
}

/// Response for a single range check
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnavailableReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<Availability> for AvailabilityResponse {
    fn from(availability: Availability) -> Self {
        let reason = availability.reason();
        AvailabilityResponse {
            available: availability.is_available(),
            reason,
            message: reason.map(|r| r.to_string()),
        }
    }
}

/// Response listing open slots for a day
#[derive(Debug, Serialize)]
pub struct SlotListResponse {
    pub subfield_id: Uuid,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_window: Option<TimeRange>,
    pub duration_minutes: u16,
    pub step_minutes: u16,
    pub slots: Vec<TimeRange>,
}

/// Response for a price quote
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub start: ClockTime,
    pub end: ClockTime,
    pub duration_minutes: u16,
    #[serde(with = "rust_decimal::serde::str")]
    pub hours: Decimal,
    pub price_per_hour: MoneyResponse,
    pub total: MoneyResponse,
}

/// Booking as returned by the API
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub subfield_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub date: NaiveDate,
    pub begin_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        BookingResponse {
            id: b.id,
            subfield_id: b.subfield_id,
            customer_id: b.customer_id,
            date: b.date,
            begin_time: b.begin_time,
            end_time: b.end_time,
            total_price: b.total_price,
            status: b.status,
            created_at: b.created_at,
        }
    }
}

/// A field with its weekly opening hours
#[derive(Debug, Serialize)]
pub struct FieldScheduleResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub location: String,
    /// True when no rows are configured and the 06:00-22:00 fallback applies
    pub default_hours: bool,
    pub opening_hours: Vec<OpeningHours>,
}

impl FieldScheduleResponse {
    pub fn new(field: Field, opening_hours: Vec<OpeningHours>) -> Self {
        FieldScheduleResponse {
            id: field.id,
            owner_id: field.owner_id,
            name: field.name,
            location: field.location,
            default_hours: opening_hours.is_empty(),
            opening_hours,
        }
    }
}
