//! Request DTOs for availability API endpoints.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::engine::{ExistingBooking, SlotCandidate};
use super::models::{BookingStatus, MaintenanceSchedule, OpeningHours, SubFieldStatus};

/// Request to run the engine over inline data
#[derive(Debug, Deserialize)]
pub struct EvaluateSlotRequest {
    pub subfield_status: SubFieldStatus,
    #[serde(default)]
    pub opening_hours: Vec<OpeningHours>,
    #[serde(default)]
    pub existing_bookings: Vec<ExistingBooking>,
    #[serde(default)]
    pub maintenance: Vec<MaintenanceSchedule>,
    pub candidate: SlotCandidate,
}

/// Query string for a single range check on a sub-field
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub start: String,
    pub end: String,
}

impl AvailabilityQuery {
    pub fn into_candidate(self) -> SlotCandidate {
        SlotCandidate::new(self.date, self.start, self.end)
    }
}

/// Query string for slot enumeration
#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
    #[serde(default)]
    pub duration_minutes: Option<u16>,
    #[serde(default)]
    pub step_minutes: Option<u16>,
}

/// Request to price a range at an explicit hourly rate
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    #[serde(with = "rust_decimal::serde::str")]
    pub price_per_hour: Decimal,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Query string to price a range on a sub-field
#[derive(Debug, Deserialize)]
pub struct SubFieldQuoteQuery {
    pub start: String,
    pub end: String,
}

/// Request to create a booking
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub subfield_id: Uuid,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    pub date: NaiveDate,
    pub start: String,
    pub end: String,
}

impl CreateBookingRequest {
    pub fn candidate(&self) -> SlotCandidate {
        SlotCandidate::new(self.date, self.start.clone(), self.end.clone())
    }
}

/// Request to move a booking along its lifecycle
#[derive(Debug, Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatus,
}
