// src/domain/numbering.rs

use crate::domain::offer::parse_calendar_date;
use chrono::{Datelike, NaiveDate};

/// Builds an offer number of the form `ORD.M.YY`.
///
/// `ordinal` is the number of offers that precede this one, so the first
/// offer gets `001`. ORD is padded to three digits but never truncated
/// (`1000` follows `999`). The month and year come from the reception date,
/// or from `today` when the reception date is missing or unreadable.
///
/// Nothing checks the result against existing numbers.
pub fn generate_offer_number(received_on: &str, ordinal: usize, today: NaiveDate) -> String {
    let date = parse_calendar_date(received_on).unwrap_or(today);
    let order = ordinal + 1;
    let month = date.month();
    let year = date.year().rem_euclid(100);
    format!("{order:03}.{month}.{year:02}")
}
