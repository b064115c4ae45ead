//! Slot availability decisions.
//!
//! Pure functions - no database access. Single range checks, slot listings
//! and booking creation all decide availability with [`evaluate_range`].

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize, Serializer};

use super::models::{
    Booking, BookingStatus, DayOfWeek, MaintenanceSchedule, OpeningHours, SubFieldStatus,
};

/// Minutes since midnight, `0..=1440`. `24:00` is representable as end of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);
    pub const END_OF_DAY: ClockTime = ClockTime(24 * 60);

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes <= Self::END_OF_DAY.0).then_some(ClockTime(minutes))
    }

    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if minute >= 60 {
            return None;
        }
        Self::from_minutes(hour * 60 + minute)
    }

    /// Parse `HH:MM` (or `HH:MM:00`). Returns `None` for anything malformed.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split(':');
        let hour = parse_two_digits(parts.next()?)?;
        let minute = parse_two_digits(parts.next()?)?;
        if let Some(seconds) = parts.next() {
            if parse_two_digits(seconds)? != 0 {
                return None;
            }
        }
        if parts.next().is_some() {
            return None;
        }
        Self::from_hm(hour, minute)
    }

    pub fn minutes(&self) -> u16 {
        self.0
    }

    pub fn hour(&self) -> u16 {
        self.0 / 60
    }

    pub fn minute(&self) -> u16 {
        self.0 % 60
    }

    fn from_naive_time(time: NaiveTime) -> Self {
        ClockTime((time.hour() * 60 + time.minute()) as u16)
    }

    /// Wall-clock instant of this time on `date`
    pub fn on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(NaiveTime::MIN) + chrono::Duration::minutes(i64::from(self.0))
    }
}

fn parse_two_digits(s: &str) -> Option<u16> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Window used when a field has no opening hours configured at all
pub const DEFAULT_OPEN: ClockTime = ClockTime(6 * 60);
pub const DEFAULT_CLOSE: ClockTime = ClockTime(22 * 60);

/// Half-open `[start, end)` range of clock time on a single day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeRange {
    /// `None` unless `end > start`
    pub fn new(start: ClockTime, end: ClockTime) -> Option<Self> {
        (end > start).then_some(TimeRange { start, end })
    }

    pub fn duration_minutes(&self) -> u16 {
        self.end.0 - self.start.0
    }

    pub fn contains(&self, other: &TimeRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        intervals_overlap(self.start, self.end, other.start, other.end)
    }
}

/// Half-open interval overlap: touching endpoints do not overlap.
pub fn intervals_overlap<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && a_end > b_start
}

/// A booking as seen by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistingBooking {
    pub date: NaiveDate,
    pub begin_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    #[serde(default)]
    pub status: BookingStatus,
}

impl ExistingBooking {
    /// Time-of-day span this booking occupies on `date`.
    ///
    /// Only bookings filed under `date` count. A booking running past midnight
    /// occupies the rest of the day.
    pub fn span_on(&self, date: NaiveDate) -> Option<TimeRange> {
        if self.date != date {
            return None;
        }
        let start = match self.begin_time.date() {
            d if d == date => ClockTime::from_naive_time(self.begin_time.time()),
            d if d < date => ClockTime::MIDNIGHT,
            _ => return None,
        };
        let end = match self.end_time.date() {
            d if d == date => ClockTime::from_naive_time(self.end_time.time()),
            d if d > date => ClockTime::END_OF_DAY,
            _ => return None,
        };
        TimeRange::new(start, end)
    }
}

impl From<&Booking> for ExistingBooking {
    fn from(booking: &Booking) -> Self {
        ExistingBooking {
            date: booking.date,
            begin_time: booking.begin_time,
            end_time: booking.end_time,
            // Unknown status must still block the slot
            status: booking.status().unwrap_or(BookingStatus::Pending),
        }
    }
}

/// A range a customer wants to book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotCandidate {
    pub date: NaiveDate,
    pub start: String,
    pub end: String,
}

impl SlotCandidate {
    pub fn new(date: NaiveDate, start: impl Into<String>, end: impl Into<String>) -> Self {
        SlotCandidate {
            date,
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Why a range cannot be booked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    SubFieldNotBookable,
    UnderMaintenance,
    MalformedTime,
    InvalidRange,
    ClosedDay,
    OutsideOpeningHours,
    Conflict,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            UnavailableReason::SubFieldNotBookable => "court is not accepting bookings",
            UnavailableReason::UnderMaintenance => "court is under maintenance",
            UnavailableReason::MalformedTime => "time must be formatted as HH:MM",
            UnavailableReason::InvalidRange => "end time must be after start time",
            UnavailableReason::ClosedDay => "venue is closed on this day",
            UnavailableReason::OutsideOpeningHours => "range is outside opening hours",
            UnavailableReason::Conflict => "range overlaps an existing booking",
        };
        f.write_str(msg)
    }
}

/// Engine verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable(UnavailableReason),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }

    pub fn reason(&self) -> Option<UnavailableReason> {
        match self {
            Availability::Available => None,
            Availability::Unavailable(reason) => Some(*reason),
        }
    }
}

/// Opening window of a field on `date`.
///
/// `None` means closed all day: no row for that weekday, `is_open = false`, or
/// a row whose times are malformed or reversed. A field with no rows at all
/// gets the default 06:00-22:00 window.
pub fn opening_window_for_day(hours: &[OpeningHours], date: NaiveDate) -> Option<TimeRange> {
    if hours.is_empty() {
        return TimeRange::new(DEFAULT_OPEN, DEFAULT_CLOSE);
    }
    let day = DayOfWeek::of(date);
    let row = hours.iter().find(|h| h.day() == Some(day))?;
    if !row.is_open {
        return None;
    }
    TimeRange::new(
        ClockTime::parse(&row.open_time)?,
        ClockTime::parse(&row.close_time)?,
    )
}

/// Demote `status` to MAINTENANCE when an active schedule overlaps `range` on `date`.
pub fn effective_status(
    status: SubFieldStatus,
    schedules: &[MaintenanceSchedule],
    date: NaiveDate,
    range: &TimeRange,
) -> SubFieldStatus {
    let window_start = range.start.on(date);
    let window_end = range.end.on(date);
    let under_maintenance = schedules.iter().any(|s| {
        s.is_active() && intervals_overlap(s.start_date, s.end_date, window_start, window_end)
    });
    if under_maintenance {
        SubFieldStatus::Maintenance
    } else {
        status
    }
}

/// Parse a candidate into a range, or explain why it cannot be one
pub fn candidate_range(candidate: &SlotCandidate) -> Result<TimeRange, UnavailableReason> {
    let start = ClockTime::parse(&candidate.start).ok_or(UnavailableReason::MalformedTime)?;
    let end = ClockTime::parse(&candidate.end).ok_or(UnavailableReason::MalformedTime)?;
    TimeRange::new(start, end).ok_or(UnavailableReason::InvalidRange)
}

fn status_block(status: SubFieldStatus) -> Option<UnavailableReason> {
    match status {
        SubFieldStatus::Maintenance => Some(UnavailableReason::UnderMaintenance),
        SubFieldStatus::Closed => Some(UnavailableReason::SubFieldNotBookable),
        SubFieldStatus::Available | SubFieldStatus::Reserved => None,
    }
}

/// Decide whether `range` on `date` can be booked.
pub fn evaluate_range(
    status: SubFieldStatus,
    hours: &[OpeningHours],
    bookings: &[ExistingBooking],
    date: NaiveDate,
    range: &TimeRange,
) -> Availability {
    if let Some(reason) = status_block(status) {
        return Availability::Unavailable(reason);
    }

    let window = match opening_window_for_day(hours, date) {
        Some(w) => w,
        None => return Availability::Unavailable(UnavailableReason::ClosedDay),
    };
    if !window.contains(range) {
        return Availability::Unavailable(UnavailableReason::OutsideOpeningHours);
    }

    let conflict = bookings
        .iter()
        .filter(|b| b.status != BookingStatus::Cancel)
        .filter_map(|b| b.span_on(date))
        .any(|span| span.overlaps(range));
    if conflict {
        return Availability::Unavailable(UnavailableReason::Conflict);
    }

    Availability::Available
}

/// Decide whether a candidate can be booked, keeping the reason when it cannot.
pub fn evaluate_slot(
    status: SubFieldStatus,
    hours: &[OpeningHours],
    bookings: &[ExistingBooking],
    candidate: &SlotCandidate,
) -> Availability {
    if let Some(reason) = status_block(status) {
        return Availability::Unavailable(reason);
    }
    match candidate_range(candidate) {
        Ok(range) => evaluate_range(status, hours, bookings, candidate.date, &range),
        Err(reason) => Availability::Unavailable(reason),
    }
}

/// [`evaluate_slot`] after demoting the status for overlapping maintenance.
pub fn evaluate_slot_with_maintenance(
    status: SubFieldStatus,
    hours: &[OpeningHours],
    bookings: &[ExistingBooking],
    schedules: &[MaintenanceSchedule],
    candidate: &SlotCandidate,
) -> Availability {
    let status = match candidate_range(candidate) {
        Ok(range) => effective_status(status, schedules, candidate.date, &range),
        Err(_) => status,
    };
    evaluate_slot(status, hours, bookings, candidate)
}

/// Boolean form of [`evaluate_slot`].
pub fn is_slot_available(
    status: SubFieldStatus,
    hours: &[OpeningHours],
    bookings: &[ExistingBooking],
    candidate: &SlotCandidate,
) -> bool {
    evaluate_slot(status, hours, bookings, candidate).is_available()
}

/// Enumerate bookable ranges of `duration_minutes` on `date`.
///
/// Starts at the opening time and steps by `step_minutes`. A closed day, a
/// zero duration or a zero step yields no slots.
pub fn available_slots(
    status: SubFieldStatus,
    hours: &[OpeningHours],
    bookings: &[ExistingBooking],
    date: NaiveDate,
    duration_minutes: u16,
    step_minutes: u16,
) -> Vec<TimeRange> {
    let window = match opening_window_for_day(hours, date) {
        Some(w) if status.is_bookable() && duration_minutes > 0 && step_minutes > 0 => w,
        _ => return Vec::new(),
    };

    let close = u32::from(window.end.minutes());
    let duration = u32::from(duration_minutes);
    let mut slots = Vec::new();
    let mut start = u32::from(window.start.minutes());
    while start + duration <= close {
        // Both ends are bounded by `close`, which fits in a ClockTime
        let range = TimeRange {
            start: ClockTime(start as u16),
            end: ClockTime((start + duration) as u16),
        };
        if evaluate_range(status, hours, bookings, date, &range).is_available() {
            slots.push(range);
        }
        start += u32::from(step_minutes);
    }
    slots
}
