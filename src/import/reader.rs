// src/import/reader.rs

use crate::errors::ServerError;
use crate::import::normalize::{CellValue, RawRow};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

const WORKBOOK_EXTENSIONS: [&str; 5] = [".xlsx", ".xls", ".xlsm", ".xlsb", ".ods"];

/// Reads an uploaded file into raw rows, picking the parser from the file
/// name. Rows with no content at all are dropped.
pub fn read_rows(file_name: &str, bytes: &[u8]) -> Result<Vec<RawRow>, ServerError> {
    let lower = file_name.to_lowercase();
    let rows = if lower.ends_with(".csv") {
        read_csv(bytes)?
    } else if WORKBOOK_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        read_workbook(bytes)?
    } else {
        return Err(ServerError::BadRequest(format!(
            "Unsupported file type: {file_name}"
        )));
    };

    Ok(rows
        .into_iter()
        .filter(|row| row.iter().any(|(_, cell)| !cell.is_blank()))
        .collect())
}

/// Header row first. Every cell is text; empty strings become `Empty`.
pub fn read_csv(bytes: &[u8]) -> Result<Vec<RawRow>, ServerError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(header, field)| {
                let text = String::from_utf8_lossy(field).into_owned();
                let cell = if text.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(text)
                };
                (header.clone(), cell)
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// First sheet only, raw values: date cells come back as serial numbers.
pub fn read_workbook(bytes: &[u8]) -> Result<Vec<RawRow>, ServerError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ServerError::BadRequest("Workbook has no sheets".into()))?;

    let range = workbook.worksheet_range(&sheet_name)?;
    let mut rows = range.rows();

    let Some(header_row) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row.iter().map(|c| data_to_cell(c).as_text()).collect();

    Ok(rows
        .map(|cells| {
            headers
                .iter()
                .zip(cells.iter())
                .map(|(header, data)| (header.clone(), data_to_cell(data)))
                .collect()
        })
        .collect())
}

fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
    }
}
