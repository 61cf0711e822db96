use crate::domain::fields::{FieldValue, OfferField};
use crate::domain::offer::{parse_calendar_date, Offer};
use crate::errors::ServerError;
use chrono::NaiveDate;
use rust_xlsxwriter::Workbook;

pub const EXPORT_FILE_NAME: &str = "ofertas.xlsx";
pub const EXPORT_SHEET_NAME: &str = "Ofertas";

/// Inclusive reception-date window. An open bound does not filter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// With no bounds everything matches. With any bound, offers whose
    /// reception date is missing or unreadable are left out.
    pub fn contains(&self, offer: &Offer) -> bool {
        if self.from.is_none() && self.to.is_none() {
            return true;
        }
        let Some(received) = parse_calendar_date(&offer.fields.received_on) else {
            return false;
        };
        self.from.map_or(true, |from| received >= from) && self.to.map_or(true, |to| received <= to)
    }
}

/// Writes the offers inside `range` to a single-sheet workbook.
pub fn export_offers_xlsx(offers: &[Offer], range: DateRange) -> Result<Vec<u8>, ServerError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(EXPORT_SHEET_NAME)?;

    // Headers
    for (col, field) in OfferField::ALL.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, field.export_header())
            .map_err(|e| {
                ServerError::XlsxError(format!(
                    "Failed to write header '{}': {}",
                    field.export_header(),
                    e
                ))
            })?;
    }

    // Rows
    let mut written = 0u32;
    for offer in offers.iter().filter(|o| range.contains(o)) {
        let r = written + 1;
        for (col, field) in OfferField::ALL.iter().enumerate() {
            let col = col as u16;
            let cell = match offer.fields.get(*field) {
                FieldValue::Text(s) => worksheet.write_string(r, col, &s).map(|_| ()),
                FieldValue::Int(n) => worksheet.write_number(r, col, n as f64).map(|_| ()),
            };
            cell.map_err(|e| {
                ServerError::XlsxError(format!("Failed to write {}: {}", field.column(), e))
            })?;
        }
        written += 1;
    }

    let buffer = workbook
        .save_to_buffer()
        .map_err(|e| ServerError::XlsxError(format!("Failed to save workbook: {}", e)))?;

    tracing::info!(rows = written, "offers exported");
    Ok(buffer)
}
