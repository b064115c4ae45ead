//! Database models for availability queries.
//!
//! These models use sqlx's FromRow derive for direct database deserialization.
//! Enumerated columns are stored as text and parsed on demand, so an unknown
//! value coming from the database never fails a whole query.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Day of week as stored in `opening_hours.day_of_week`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl FromStr for DayOfWeek {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MONDAY" => Ok(DayOfWeek::Monday),
            "TUESDAY" => Ok(DayOfWeek::Tuesday),
            "WEDNESDAY" => Ok(DayOfWeek::Wednesday),
            "THURSDAY" => Ok(DayOfWeek::Thursday),
            "FRIDAY" => Ok(DayOfWeek::Friday),
            "SATURDAY" => Ok(DayOfWeek::Saturday),
            "SUNDAY" => Ok(DayOfWeek::Sunday),
            _ => Err(()),
        }
    }
}

/// Operational status of a sub-field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubFieldStatus {
    Available,
    Reserved,
    Maintenance,
    Closed,
}

impl SubFieldStatus {
    /// Bookings may only be created against AVAILABLE or RESERVED sub-fields
    pub fn is_bookable(&self) -> bool {
        matches!(self, SubFieldStatus::Available | SubFieldStatus::Reserved)
    }
}

impl FromStr for SubFieldStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AVAILABLE" => Ok(SubFieldStatus::Available),
            "RESERVED" => Ok(SubFieldStatus::Reserved),
            "MAINTENANCE" => Ok(SubFieldStatus::Maintenance),
            "CLOSED" => Ok(SubFieldStatus::Closed),
            _ => Err(()),
        }
    }
}

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Paid,
    Cancel,
}

impl BookingStatus {
    /// pending -> paid and pending -> cancel; paid and cancel are terminal.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Paid)
                | (BookingStatus::Pending, BookingStatus::Cancel)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Paid => "paid",
            BookingStatus::Cancel => "cancel",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "paid" => Ok(BookingStatus::Paid),
            "cancel" => Ok(BookingStatus::Cancel),
            _ => Err(()),
        }
    }
}

/// Maintenance schedule status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl MaintenanceStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, MaintenanceStatus::Scheduled | MaintenanceStatus::InProgress)
    }
}

impl FromStr for MaintenanceStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SCHEDULED" => Ok(MaintenanceStatus::Scheduled),
            "IN_PROGRESS" => Ok(MaintenanceStatus::InProgress),
            "COMPLETED" => Ok(MaintenanceStatus::Completed),
            "CANCELLED" => Ok(MaintenanceStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// Field (venue) from fields
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Field {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub location: String,
}

/// OpeningHours from opening_hours (one row per weekday per field)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OpeningHours {
    #[serde(default)]
    pub field_id: Uuid,
    pub day_of_week: String,
    pub open_time: String,
    pub close_time: String,
    pub is_open: bool,
}

impl OpeningHours {
    pub fn day(&self) -> Option<DayOfWeek> {
        self.day_of_week.parse().ok()
    }
}

/// SubField from sub_fields
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubField {
    pub id: Uuid,
    pub field_id: Uuid,
    pub name: String,
    pub status: String,
    pub price: Decimal,
    pub unit_of_time: String,
}

impl SubField {
    /// Unknown status values are treated as CLOSED
    pub fn status(&self) -> SubFieldStatus {
        self.status.parse().unwrap_or(SubFieldStatus::Closed)
    }
}

/// Booking from bookings
#[derive(Debug, Clone, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub subfield_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub date: NaiveDate,
    pub begin_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub total_price: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn status(&self) -> Option<BookingStatus> {
        self.status.parse().ok()
    }
}

/// MaintenanceSchedule from maintenance_schedules
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MaintenanceSchedule {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub subfield_id: Uuid,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    #[serde(default)]
    pub reason: String,
    pub status: String,
}

impl MaintenanceSchedule {
    /// Unknown status values are treated as active
    pub fn is_active(&self) -> bool {
        self.status
            .parse::<MaintenanceStatus>()
            .map(|s| s.is_active())
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_of_week_from_date() {
        // 2024-06-01 was a Saturday
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(DayOfWeek::of(date), DayOfWeek::Saturday);
        assert_eq!(DayOfWeek::of(date.succ_opt().unwrap()), DayOfWeek::Sunday);
    }

    #[test]
    fn test_day_of_week_parse_is_case_insensitive() {
        assert_eq!("monday".parse::<DayOfWeek>(), Ok(DayOfWeek::Monday));
        assert_eq!(" SUNDAY ".parse::<DayOfWeek>(), Ok(DayOfWeek::Sunday));
        assert!("funday".parse::<DayOfWeek>().is_err());
    }

    #[test]
    fn test_subfield_status_bookable() {
        assert!(SubFieldStatus::Available.is_bookable());
        assert!(SubFieldStatus::Reserved.is_bookable());
        assert!(!SubFieldStatus::Maintenance.is_bookable());
        assert!(!SubFieldStatus::Closed.is_bookable());
    }

    #[test]
    fn test_booking_status_transitions() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Cancel));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Paid.can_transition_to(Cancel));
        assert!(!Paid.can_transition_to(Pending));
        assert!(!Cancel.can_transition_to(Paid));
        assert!(!Cancel.can_transition_to(Pending));
    }

    #[test]
    fn test_maintenance_activity() {
        assert!(MaintenanceStatus::Scheduled.is_active());
        assert!(MaintenanceStatus::InProgress.is_active());
        assert!(!MaintenanceStatus::Completed.is_active());
        assert!(!MaintenanceStatus::Cancelled.is_active());
    }

    #[test]
    fn test_unknown_subfield_status_is_closed() {
        let subfield = SubField {
            id: Uuid::nil(),
            field_id: Uuid::nil(),
            name: "Court 1".to_string(),
            status: "DEMOLISHED".to_string(),
            price: Decimal::ZERO,
            unit_of_time: "hour".to_string(),
        };
        assert_eq!(subfield.status(), SubFieldStatus::Closed);
    }
}
