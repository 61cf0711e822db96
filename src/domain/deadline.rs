// src/domain/deadline.rs

use crate::domain::offer::{parse_calendar_date, Offer, OfferFields, RESULT_NO_GO, STATUS_IN_PROGRESS};
use chrono::{DateTime, Utc};
use serde::Serialize;

const DAY_SECONDS: i64 = 24 * 60 * 60;
const DUE_SOON_DAYS: i64 = 3;

/// How the days-remaining indicator should be shown for an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeadlineStatus {
    /// Delivered or rejected: the deadline no longer matters.
    Suppressed,
    /// One of the two dates is missing, so there is nothing to count.
    NoDeadline,
    Overdue,
    DueSoon,
    OnTrack,
}

/// Whole days until the delivery date, rounded up. Negative once the date
/// has passed. `None` when either the delivery or the reception date is
/// missing or unreadable.
pub fn days_remaining(fields: &OfferFields, now: DateTime<Utc>) -> Option<i64> {
    let due = parse_calendar_date(&fields.due_on)?;
    parse_calendar_date(&fields.received_on)?;

    // Delivery dates are calendar days, counted from UTC midnight.
    let due_at = due.and_hms_opt(0, 0, 0)?.and_utc();
    let diff = (due_at - now).num_seconds();
    Some(div_ceil(diff, DAY_SECONDS))
}

/// Determines the indicator category. The order of checks is the precedence:
/// a delivered offer is never reported overdue.
pub fn deadline_status(fields: &OfferFields, now: DateTime<Utc>) -> DeadlineStatus {
    let status = fields.status.to_uppercase();
    let result = fields.result.to_uppercase();
    if status.starts_with("ENTREGAD") || result == RESULT_NO_GO {
        return DeadlineStatus::Suppressed;
    }
    match days_remaining(fields, now) {
        None => DeadlineStatus::NoDeadline,
        Some(d) if d < 0 => DeadlineStatus::Overdue,
        Some(d) if d <= DUE_SOON_DAYS => DeadlineStatus::DueSoon,
        Some(_) => DeadlineStatus::OnTrack,
    }
}

/// In-progress offers are highlighted regardless of dates. Exact match.
pub fn needs_attention(fields: &OfferFields) -> bool {
    fields.status == STATUS_IN_PROGRESS
}

/// Text of the indicator: "-", "", "Vencida" or "{n}d".
pub fn indicator_label(status: DeadlineStatus, days: Option<i64>) -> String {
    match (status, days) {
        (DeadlineStatus::Suppressed, _) => "-".to_string(),
        (DeadlineStatus::NoDeadline, _) | (_, None) => String::new(),
        (DeadlineStatus::Overdue, _) => "Vencida".to_string(),
        (_, Some(d)) => format!("{d}d"),
    }
}

/// An offer together with the fields derived from it at read time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferView {
    #[serde(flatten)]
    pub offer: serde_json::Value,
    pub days_remaining: Option<i64>,
    pub deadline: DeadlineStatus,
    pub indicator: String,
    pub needs_attention: bool,
}

impl OfferView {
    pub fn new(offer: &Offer, now: DateTime<Utc>) -> Self {
        let status = deadline_status(&offer.fields, now);
        // Suppressed offers carry no number at all.
        let days = match status {
            DeadlineStatus::Suppressed => None,
            _ => days_remaining(&offer.fields, now),
        };
        Self {
            offer: offer.to_json(),
            days_remaining: days,
            deadline: status,
            indicator: indicator_label(status, days),
            needs_attention: needs_attention(&offer.fields),
        }
    }
}

fn div_ceil(a: i64, b: i64) -> i64 {
    let q = a.div_euclid(b);
    if a.rem_euclid(b) == 0 {
        q
    } else {
        q + 1
    }
}
