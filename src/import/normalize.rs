// src/import/normalize.rs

use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

/// One raw cell as read from a CSV or a workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    /// Numbers stay numbers so date serials survive until coercion.
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Empty cells and whitespace-only text count as absent.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text form of the cell. Whole numbers print without a fraction.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => b.to_string(),
        }
    }
}

/// A row as it comes out of the file: header text paired with its cell.
pub type RawRow = Vec<(String, CellValue)>;

/// Canonical form of a header or lookup key.
///
/// Decomposes (NFD), drops combining diacritics, lowercases, trims and
/// collapses whitespace runs into one space. `"  Fecha   Recepción "` and
/// `"fecha recepcion"` end up equal.
pub fn normalize_key(raw: &str) -> String {
    let stripped: String = raw
        .nfd()
        .filter(|c| !is_combining_diacritic(*c))
        .collect::<String>()
        .to_lowercase();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_combining_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

/// A row keyed by normalized headers.
#[derive(Debug, Clone, Default)]
pub struct NormalizedRow {
    cells: HashMap<String, CellValue>,
}

impl NormalizedRow {
    /// Later columns win when two headers normalize to the same key.
    pub fn from_raw(row: RawRow) -> Self {
        let cells = row
            .into_iter()
            .map(|(header, value)| (normalize_key(&header), value))
            .collect();
        Self { cells }
    }

    /// First variant with a non-blank cell wins. No match is not an error.
    pub fn get(&self, variants: &[&str]) -> Option<&CellValue> {
        variants
            .iter()
            .filter_map(|v| self.cells.get(&normalize_key(v)))
            .find(|cell| !cell.is_blank())
    }

    pub fn is_empty(&self) -> bool {
        self.cells.values().all(CellValue::is_blank)
    }
}
