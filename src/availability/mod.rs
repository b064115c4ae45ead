//! Availability engine module for court bookings.
//!
//! Decides whether a time range on a court can be booked, prices it, and
//! exposes both over HTTP/JSON together with booking creation.

pub mod calculators;
pub mod engine;
pub mod models;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

// Re-export commonly used items
pub use calculators::{calculate_booking_price, round_total};
pub use engine::{is_slot_available, Availability, ClockTime, SlotCandidate, UnavailableReason};
pub use routes::router;
pub use services::BookingError;
