//! Raw cell extraction from workbooks and CSV exports.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use crate::error::ExtractionError;

/// Read the first worksheet (or the CSV file) as rows of cell text.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>, ExtractionError> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    let rows = if is_csv {
        read_csv(path)?
    } else {
        read_workbook(path)?
    };

    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn read_csv(path: &Path) -> Result<Vec<Vec<String>>, ExtractionError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| ExtractionError::Spreadsheet(e.to_string()))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ExtractionError::Spreadsheet(e.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn read_workbook(path: &Path) -> Result<Vec<Vec<String>>, ExtractionError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| ExtractionError::Spreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ExtractionError::Spreadsheet("workbook has no worksheets".to_string()))?
        .map_err(|e| ExtractionError::Spreadsheet(e.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

/// Render a cell the way a user would read it in the sheet.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) => format_float(*f),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
