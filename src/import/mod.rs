pub mod dates;
pub mod normalize;
pub mod reader;
pub mod row;

use crate::domain::offer::Offer;
use crate::errors::ServerError;
use crate::store::RecordStore;
use chrono::NaiveDate;

pub use normalize::{CellValue, RawRow};
pub use reader::read_rows;
pub use row::map_row;

/// What a batch import managed to do.
#[derive(Debug)]
pub struct ImportReport {
    /// Offers created, in file order.
    pub created: Vec<Offer>,
    /// The row (1-based, header excluded) whose create call failed, if any.
    /// Rows after it were not attempted.
    pub failure: Option<(usize, ServerError)>,
}

impl ImportReport {
    pub fn into_result(self) -> Result<Vec<Offer>, ServerError> {
        match self.failure {
            None => Ok(self.created),
            Some((row, err)) => Err(err.during(&format!("Error al importar la fila {row}"))),
        }
    }
}

/// Maps every row and creates the offers one after another.
///
/// Stops at the first create that fails. Offers created before it stay in
/// the store; nothing is rolled back.
pub fn import_rows(
    store: &dyn RecordStore,
    rows: Vec<RawRow>,
    existing_count: usize,
    today: NaiveDate,
) -> ImportReport {
    let mut created = Vec::with_capacity(rows.len());

    for (index, raw) in rows.into_iter().enumerate() {
        let request = map_row(raw, index, existing_count, today);
        match store.create_offer(&request) {
            Ok(offer) => created.push(offer),
            Err(err) => {
                tracing::error!(
                    row = index + 1,
                    created = created.len(),
                    error = %err,
                    "import stopped"
                );
                return ImportReport {
                    created,
                    failure: Some((index + 1, err)),
                };
            }
        }
    }

    tracing::info!(created = created.len(), "import finished");
    ImportReport {
        created,
        failure: None,
    }
}

/// Reads `bytes` as the named file and imports its rows.
pub fn import_file(
    store: &dyn RecordStore,
    file_name: &str,
    bytes: &[u8],
    existing_count: usize,
    today: NaiveDate,
) -> Result<ImportReport, ServerError> {
    let rows = read_rows(file_name, bytes)?;
    tracing::info!(file = file_name, rows = rows.len(), "importing offers");
    Ok(import_rows(store, rows, existing_count, today))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn row(description: &str) -> RawRow {
        vec![
            ("Descripción".into(), CellValue::Text(description.into())),
            ("Cliente".into(), CellValue::Text("ACME".into())),
        ]
    }

    #[test]
    fn creates_rows_in_order_with_numbers() {
        let store = MemoryStore::default();
        let report = import_rows(&store, vec![row("a"), row("b")], 4, today());
        let created = report.into_result().unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].fields.offer_number, "005.10.26");
        assert_eq!(created[1].fields.offer_number, "006.10.26");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn failing_row_stops_the_batch_without_rollback() {
        let store = MemoryStore::default().fail_on_create(2);
        let report = import_rows(&store, vec![row("a"), row("b"), row("c")], 0, today());

        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].fields.description, "a");
        // row 1 stays, row 3 never reached the store
        assert_eq!(store.len(), 1);
        assert_eq!(store.create_calls(), 2);

        let err = report.into_result().unwrap_err();
        assert!(err.to_string().contains("fila 2"), "{err}");
    }

    #[test]
    fn import_file_reads_csv() {
        let store = MemoryStore::default();
        let csv = "Descripcion,Cliente,Estado\nSoporte,ACME,entregada\n";
        let report = import_file(&store, "lote.csv", csv.as_bytes(), 0, today()).unwrap();
        let created = report.into_result().unwrap();
        assert_eq!(created[0].fields.status, "ENTREGADA");
        assert_eq!(created[0].fields.final_client, "ACME");
    }
}
