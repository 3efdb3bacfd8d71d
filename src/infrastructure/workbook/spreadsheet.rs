// ============================================================
// SPREADSHEET CODEC
// ============================================================
// xlsx/xls/ods decoding through calamine, xlsx encoding through
// rust_xlsxwriter

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_xlsxwriter::Workbook;

use crate::domain::error::{AppError, Result};
use crate::domain::sheet::{CellValue, Row};

/// Last addressable row of an xlsx sheet, zero-based.
const XLSX_MAX_ROW: usize = 1_048_575;

/// Longest sheet name Excel accepts.
const SHEET_NAME_MAX_CHARS: usize = 31;

/// Longest string an xlsx cell can hold.
const XLSX_MAX_CELL_CHARS: usize = 32_767;

/// Sheet names plus the cell grid of the first sheet.
pub(super) fn read_first_sheet(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<CellValue>>)> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| AppError::Decode(format!("Failed to open workbook: {}", e)))?;

    let sheet_names = workbook.sheet_names().to_vec();

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::Decode("No worksheet found".to_string()))?
        .map_err(|e| AppError::Decode(format!("Failed to read worksheet: {}", e)))?;

    let grid = range
        .rows()
        .map(|row| row.iter().map(cell_value).collect())
        .collect();

    Ok((sheet_names, grid))
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::text(s.as_str()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        other => CellValue::text(other.to_string()),
    }
}

/// Check a sheet name against Excel's rules.
pub fn validate_sheet_label(label: &str) -> Result<()> {
    let invalid = |reason: &str| -> Result<()> {
        Err(AppError::InvalidInput(format!(
            "Invalid sheet label '{}': {}",
            label, reason
        )))
    };

    if label.trim().is_empty() {
        return invalid("must not be empty");
    }
    if label.chars().count() > SHEET_NAME_MAX_CHARS {
        return invalid("longer than 31 characters");
    }
    if let Some(c) = label.chars().find(|c| "[]:*?/\\".contains(*c)) {
        return invalid(&format!("contains '{}'", c));
    }
    if label.starts_with('\'') || label.ends_with('\'') {
        return invalid("must not start or end with an apostrophe");
    }
    Ok(())
}

pub(super) fn write_xlsx(headers: &[String], rows: &[Row], sheet_label: &str) -> Result<Vec<u8>> {
    if rows.len() > XLSX_MAX_ROW {
        return Err(AppError::InvalidInput(format!(
            "Result has {} rows, more than an xlsx sheet can hold",
            rows.len()
        )));
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(sheet_label)
        .map_err(|e| AppError::InvalidInput(format!("Invalid sheet label: {}", e)))?;

    let write_err = |e: rust_xlsxwriter::XlsxError| {
        AppError::Internal(format!("Failed to write xlsx cell: {}", e))
    };

    for (col, header) in headers.iter().enumerate() {
        let col = column_index(col)?;
        check_cell_len(header, 0)?;
        worksheet.write_string(0, col, header).map_err(write_err)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let row_num = (index + 1) as u32;
        for (col, header) in headers.iter().enumerate() {
            let col = column_index(col)?;
            match row.get(header) {
                Some(CellValue::Number(n)) => {
                    worksheet.write_number(row_num, col, *n).map_err(write_err)?;
                }
                Some(CellValue::Bool(b)) => {
                    worksheet.write_boolean(row_num, col, *b).map_err(write_err)?;
                }
                Some(CellValue::Text(s)) => {
                    check_cell_len(s, row_num)?;
                    worksheet.write_string(row_num, col, s).map_err(write_err)?;
                }
                Some(CellValue::Empty) | None => {}
            }
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| AppError::Internal(format!("Failed to encode xlsx: {}", e)))
}

fn check_cell_len(value: &str, row_num: u32) -> Result<()> {
    if value.chars().count() > XLSX_MAX_CELL_CHARS {
        return Err(AppError::InvalidInput(format!(
            "Row {} has a cell longer than the {} characters an xlsx cell can hold; \
             request csv output instead",
            row_num + 1,
            XLSX_MAX_CELL_CHARS
        )));
    }
    Ok(())
}

fn column_index(col: usize) -> Result<u16> {
    u16::try_from(col)
        .map_err(|_| AppError::InvalidInput(format!("Too many columns ({})", col + 1)))
}
