// src/import/dates.rs

use crate::import::normalize::CellValue;
use chrono::{Duration, NaiveDate};

/// Turns a date cell into `YYYY-MM-DD` text.
///
/// Numbers are spreadsheet serials (1900 date system). `D/M/Y` strings are
/// read day-first; a two-digit year gets a `20` prefix. Any other text is
/// returned unchanged and assumed to be ISO already. Cells that cannot be
/// decoded become "".
pub fn coerce_date(cell: &CellValue) -> String {
    match cell {
        CellValue::Empty | CellValue::Bool(_) => String::new(),
        CellValue::Number(serial) => serial_to_iso(*serial).unwrap_or_default(),
        CellValue::Text(s) => {
            let s = s.trim();
            slash_to_iso(s).unwrap_or_else(|| s.to_string())
        }
    }
}

/// Last serial of the 1900 date system: 9999-12-31.
const MAX_SERIAL: f64 = 2_958_465.0;

/// Decodes a spreadsheet date serial. The time-of-day fraction is dropped.
///
/// Serial 60 is the 1900-02-29 that never existed and decodes to nothing.
/// Serials below it are counted from 1899-12-31, later ones from 1899-12-30.
pub fn serial_to_iso(serial: f64) -> Option<String> {
    if !serial.is_finite() || !(1.0..MAX_SERIAL + 1.0).contains(&serial) {
        return None;
    }
    let days = serial.floor() as i64;
    let epoch = match days {
        60 => return None,
        ..=59 => NaiveDate::from_ymd_opt(1899, 12, 31)?,
        _ => NaiveDate::from_ymd_opt(1899, 12, 30)?,
    };
    let date = epoch.checked_add_signed(Duration::try_days(days)?)?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// `D/M/YY`, `DD/MM/YYYY` and anything in between. Returns `None` when the
/// text is not of that shape.
fn slash_to_iso(s: &str) -> Option<String> {
    let parts: Vec<&str> = s.split('/').collect();
    let [d, m, y] = parts[..] else {
        return None;
    };
    let digits = |p: &str, min: usize, max: usize| {
        (min..=max).contains(&p.len()) && p.chars().all(|c| c.is_ascii_digit())
    };
    if !(digits(d, 1, 2) && digits(m, 1, 2) && digits(y, 2, 4)) {
        return None;
    }
    let year = if y.len() == 2 {
        format!("20{y}")
    } else {
        y.to_string()
    };
    Some(format!("{year}-{m:0>2}-{d:0>2}"))
}
