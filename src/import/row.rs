// src/import/row.rs

use crate::domain::fields::OfferField;
use crate::domain::numbering::generate_offer_number;
use crate::domain::offer::{coerce_revenue, NewOffer, RESULT_EMPTY, STATUS_IN_PROGRESS};
use crate::import::dates::coerce_date;
use crate::import::normalize::{CellValue, NormalizedRow, RawRow};
use chrono::NaiveDate;

/// Turns one imported row into a creation request.
///
/// Unknown headers are ignored and missing fields take their defaults, so
/// this never fails. When the row carries no offer number one is generated
/// from the reception date and `existing_count + row_index`.
pub fn map_row(row: RawRow, row_index: usize, existing_count: usize, today: NaiveDate) -> NewOffer {
    let row = NormalizedRow::from_raw(row);
    let text = |field: OfferField| {
        row.get(field.import_headers())
            .map(CellValue::as_text)
            .unwrap_or_default()
    };
    let date = |field: OfferField| {
        row.get(field.import_headers())
            .map(coerce_date)
            .unwrap_or_default()
    };

    let client = text(OfferField::Client);
    let final_client = match text(OfferField::FinalClient) {
        s if s.is_empty() => client.clone(),
        s => s,
    };
    let status = match text(OfferField::Status) {
        s if s.is_empty() => STATUS_IN_PROGRESS.to_string(),
        s => s.to_uppercase(),
    };
    let result = match text(OfferField::Result) {
        s if s.is_empty() => RESULT_EMPTY.to_string(),
        s => s.to_uppercase(),
    };
    let received_on = date(OfferField::ReceivedOn);

    let offer_number = match text(OfferField::OfferNumber) {
        s if s.trim().is_empty() => {
            generate_offer_number(&received_on, existing_count + row_index, today)
        }
        s => s,
    };

    NewOffer {
        offer_number,
        description: text(OfferField::Description),
        client,
        final_client,
        seller: text(OfferField::Seller),
        received_on,
        due_on: date(OfferField::DueOn),
        status,
        result,
        estimated_revenue: row
            .get(OfferField::EstimatedRevenue.import_headers())
            .map(revenue_from_cell)
            .unwrap_or(0),
    }
}

fn revenue_from_cell(cell: &CellValue) -> i64 {
    match cell {
        CellValue::Number(n) if n.is_finite() => (n.trunc() as i64).max(0),
        CellValue::Text(s) => coerce_revenue(s),
        _ => 0,
    }
}
