//! Booking price calculation functions.
//!
//! Pure functions for pricing math - no database access.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use super::engine::{ClockTime, TimeRange};
use crate::availability::responses::MoneyResponse;

/// Round a total to whole currency units, halves away from zero.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use courtbook::availability::round_total;
///
/// assert_eq!(round_total(dec!(2.5)), dec!(3));
/// assert_eq!(round_total(dec!(2.49)), dec!(2));
/// ```
pub fn round_total(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Duration of `range` in hours, exact to the minute.
pub fn duration_hours(range: &TimeRange) -> Decimal {
    Decimal::from(range.duration_minutes()) / Decimal::from(60)
}

/// Total price for `range` at `price_per_hour`, rounded to a whole unit.
///
/// Multiplies before dividing so that odd minute counts (e.g. 10 minutes)
/// never go through a repeating fraction.
pub fn calculate_booking_price(price_per_hour: Decimal, range: &TimeRange) -> Decimal {
    let raw = price_per_hour * Decimal::from(range.duration_minutes()) / Decimal::from(60);
    round_total(raw)
}

/// Price a `start`/`end` pair given as `HH:MM` strings.
///
/// Returns `None` when either time is malformed or the range is empty.
pub fn quote(
    price_per_hour: Decimal,
    start: &str,
    end: &str,
    currency: &str,
) -> Option<QuoteResult> {
    let range = TimeRange::new(ClockTime::parse(start)?, ClockTime::parse(end)?)?;
    Some(QuoteResult {
        range,
        hours: duration_hours(&range),
        price_per_hour: MoneyResponse {
            amount: price_per_hour,
            currency: currency.to_string(),
        },
        total: MoneyResponse {
            amount: calculate_booking_price(price_per_hour, &range),
            currency: currency.to_string(),
        },
    })
}

/// Result of a price quote
#[derive(Debug, Clone)]
pub struct QuoteResult {
    pub range: TimeRange,
    pub hours: Decimal,
    pub price_per_hour: MoneyResponse,
    pub total: MoneyResponse,
}
