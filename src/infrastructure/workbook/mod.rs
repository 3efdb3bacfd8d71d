// ============================================================
// WORKBOOK INFRASTRUCTURE LAYER
// ============================================================
// Decode uploaded spreadsheets into rows, encode cleaned rows back

mod csv_codec;
mod spreadsheet;

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use csv_codec::CsvCodec;
pub use spreadsheet::validate_sheet_label;

use crate::domain::error::{AppError, Result};
use crate::domain::sheet::{CellValue, Row, Sheet};

/// Format of a downloadable result file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Xlsx,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Csv => "csv",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            OutputFormat::Csv => "text/csv",
        }
    }

    /// `leads.xlsx` -> `leads-cleaned.csv`
    pub fn output_file_name(&self, input_name: &str) -> String {
        let stem = Path::new(input_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("phone-numbers");
        format!("{}-cleaned.{}", stem, self.extension())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputFormat {
    Spreadsheet,
    Csv,
}

impl InputFormat {
    /// Extension first, then magic bytes (ZIP for xlsx/ods, OLE for xls).
    fn detect(file_name: &str, bytes: &[u8]) -> Self {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") | Some("txt") | Some("tsv") => InputFormat::Csv,
            Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("xls") | Some("ods") => {
                InputFormat::Spreadsheet
            }
            _ if bytes.starts_with(b"PK\x03\x04")
                || bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]) =>
            {
                InputFormat::Spreadsheet
            }
            _ => InputFormat::Csv,
        }
    }
}

/// Sheet names plus the parsed first sheet.
#[derive(Debug, Clone)]
pub struct DecodedWorkbook {
    pub sheet_names: Vec<String>,
    pub first_sheet: Sheet,
}

/// Reads and writes the spreadsheets exchanged with callers.
#[derive(Debug, Clone, Default)]
pub struct WorkbookCodec {
    csv: CsvCodec,
}

impl WorkbookCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an uploaded file. Only the first sheet is read.
    pub fn decode(&self, file_name: &str, bytes: &[u8]) -> Result<DecodedWorkbook> {
        if bytes.is_empty() {
            return Err(AppError::Decode("Uploaded file is empty".to_string()));
        }

        let format = InputFormat::detect(file_name, bytes);
        let (sheet_names, grid) = match format {
            InputFormat::Spreadsheet => spreadsheet::read_first_sheet(bytes)?,
            InputFormat::Csv => (vec![sheet_name_from_file(file_name)], self.csv.read_grid(bytes)?),
        };

        let first_name = sheet_names.first().cloned().unwrap_or_default();
        let first_sheet = sheet_from_grid(first_name, grid);

        debug!(
            file_name,
            format = ?format,
            sheets = sheet_names.len(),
            columns = first_sheet.headers.len(),
            rows = first_sheet.row_count(),
            "Workbook decoded"
        );

        Ok(DecodedWorkbook {
            sheet_names,
            first_sheet,
        })
    }

    /// Encode rows into a single sheet named `sheet_label` under an explicit
    /// header row, so an empty result still carries the source columns.
    pub fn encode(
        &self,
        headers: &[String],
        rows: &[Row],
        sheet_label: &str,
        format: OutputFormat,
    ) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Xlsx => spreadsheet::write_xlsx(headers, rows, sheet_label),
            OutputFormat::Csv => self.csv.write(headers, rows),
        }
    }
}

fn sheet_name_from_file(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1")
        .to_string()
}

/// Name header cells the way sheet-to-records conversions do: blank
/// headers become `__EMPTY`, `__EMPTY_1`, ... and repeated names get a
/// numeric suffix.
fn name_headers(raw: &[CellValue]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    raw.iter()
        .map(|cell| {
            let text = cell.to_string();
            let base = match text.trim() {
                "" => "__EMPTY".to_string(),
                trimmed => trimmed.to_string(),
            };
            let mut candidate = base.clone();
            let mut suffix = 0;
            while used.contains(&candidate) {
                suffix += 1;
                candidate = format!("{}_{}", base, suffix);
            }
            used.insert(candidate.clone());
            candidate
        })
        .collect()
}

/// First grid row is the header; fully blank data rows are skipped.
fn sheet_from_grid(name: String, grid: Vec<Vec<CellValue>>) -> Sheet {
    let mut grid = grid.into_iter();
    let headers = match grid.next() {
        Some(header_row) => name_headers(&header_row),
        None => return Sheet::new(name, Vec::new(), Vec::new()),
    };

    let rows = grid
        .map(|cells| {
            let mut cells = cells.into_iter();
            let mut row = Row::new();
            for header in &headers {
                row.push(header.clone(), cells.next().unwrap_or(CellValue::Empty));
            }
            row
        })
        .filter(|row| !row.is_blank())
        .collect();

    Sheet::new(name, headers, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_naming() {
        let raw = vec![
            CellValue::text("Phone"),
            CellValue::Empty,
            CellValue::text("Phone"),
            CellValue::Empty,
            CellValue::text("Phone_1"),
        ];
        assert_eq!(
            name_headers(&raw),
            vec!["Phone", "__EMPTY", "Phone_1", "__EMPTY_1", "Phone_1_1"]
        );
    }

    #[test]
    fn test_sheet_from_grid_skips_blank_rows_and_pads() {
        let grid = vec![
            vec![CellValue::text("Name"), CellValue::text("Phone")],
            vec![CellValue::text("Ann"), CellValue::Number(5551112222.0)],
            vec![CellValue::Empty, CellValue::Empty],
            vec![CellValue::text("Bob")],
        ];
        let sheet = sheet_from_grid("S".to_string(), grid);
        assert_eq!(sheet.headers, vec!["Name", "Phone"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[1].get("Phone"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_empty_grid_has_no_headers() {
        let sheet = sheet_from_grid("S".to_string(), Vec::new());
        assert!(sheet.headers.is_empty());
        assert!(sheet.rows.is_empty());
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(InputFormat::detect("a.CSV", b"PK\x03\x04"), InputFormat::Csv);
        assert_eq!(InputFormat::detect("a.xlsx", b"phone"), InputFormat::Spreadsheet);
        assert_eq!(InputFormat::detect("upload", b"PK\x03\x04rest"), InputFormat::Spreadsheet);
        assert_eq!(InputFormat::detect("upload", b"phone\n1"), InputFormat::Csv);
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(OutputFormat::Xlsx.output_file_name("leads.xls"), "leads-cleaned.xlsx");
        assert_eq!(OutputFormat::Csv.output_file_name(""), "phone-numbers-cleaned.csv");
    }

    #[test]
    fn test_empty_upload_is_a_decode_error() {
        let err = WorkbookCodec::new().decode("x.xlsx", &[]).unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
    }

    #[test]
    fn test_garbage_spreadsheet_is_a_decode_error() {
        let err = WorkbookCodec::new()
            .decode("x.xlsx", b"definitely not a zip")
            .unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
    }

    #[test]
    fn test_xlsx_encode_then_decode_keeps_sheet_shape() {
        let rows = vec![
            Row::new().with("Name", "Ann").with("Phone", 5551112222.0),
            Row::new().with("Name", "Bob").with("Phone", "555-333-4444"),
        ];
        let codec = WorkbookCodec::new();
        let headers = vec!["Name".to_string(), "Phone".to_string()];
        let bytes = codec
            .encode(&headers, &rows, "Cleaned Phone Numbers", OutputFormat::Xlsx)
            .unwrap();
        let decoded = codec.decode("out.xlsx", &bytes).unwrap();

        assert_eq!(decoded.sheet_names, vec!["Cleaned Phone Numbers"]);
        assert_eq!(decoded.first_sheet.headers, vec!["Name", "Phone"]);
        assert_eq!(decoded.first_sheet.rows.len(), 2);
        assert_eq!(
            decoded.first_sheet.rows[0].get("Phone").unwrap().to_string(),
            "5551112222"
        );
    }

    #[test]
    fn test_oversized_cell_is_rejected_for_xlsx_only() {
        let codec = WorkbookCodec::new();
        let headers = vec!["Phone".to_string(), "Notes".to_string()];
        let rows = vec![Row::new()
            .with("Phone", "5551112222")
            .with("Notes", "x".repeat(40_000))];

        let err = codec
            .encode(&headers, &rows, "Out", OutputFormat::Xlsx)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let csv = codec.encode(&headers, &rows, "Out", OutputFormat::Csv).unwrap();
        assert!(csv.len() > 40_000);
    }

    #[test]
    fn test_encode_keeps_header_for_empty_output() {
        let codec = WorkbookCodec::new();
        let headers = vec!["Name".to_string(), "Phone".to_string()];
        let bytes = codec
            .encode(&headers, &[], "Out", OutputFormat::Csv)
            .unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap().trim_end(), "Name,Phone");
    }
}
