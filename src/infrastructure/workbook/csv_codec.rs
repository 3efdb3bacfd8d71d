// ============================================================
// CSV CODEC
// ============================================================
// Parse CSV uploads with delimiter and encoding detection, write CSV results

use csv::{ReaderBuilder, Trim, WriterBuilder};
use encoding_rs::WINDOWS_1252;

use crate::domain::error::{AppError, Result};
use crate::domain::sheet::{CellValue, Row};

/// CSV reader/writer
#[derive(Debug, Clone)]
pub struct CsvCodec {
    /// Delimiter used when writing results
    output_delimiter: u8,
}

impl Default for CsvCodec {
    fn default() -> Self {
        Self {
            output_delimiter: b',',
        }
    }
}

impl CsvCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse raw bytes into a cell grid, header row included
    pub fn read_grid(&self, bytes: &[u8]) -> Result<Vec<Vec<CellValue>>> {
        let content = decode_text(bytes);
        let delimiter = Self::detect_delimiter(&content);

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .trim(Trim::All)
            .flexible(true) // Allow rows with different lengths
            .from_reader(content.as_bytes());

        let mut grid = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::Decode(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;
            grid.push(record.iter().map(CellValue::text).collect());
        }

        Ok(grid)
    }

    /// Detect delimiter from content (comma, semicolon, tab, pipe)
    pub fn detect_delimiter(content: &str) -> u8 {
        let candidates = [b',', b';', b'\t', b'|'];
        let sample_lines: Vec<_> = content.lines().take(10).collect();

        if sample_lines.is_empty() {
            return b',';
        }

        let mut best_delimiter = b',';
        let mut best_score = 0.0f32;

        for &delimiter in &candidates {
            let field_counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| line.bytes().filter(|&b| b == delimiter).count())
                .collect();

            // Score by consistency (low standard deviation) and frequency
            let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
            let variance = field_counts
                .iter()
                .map(|&x| (x as f32 - avg).powi(2))
                .sum::<f32>()
                / field_counts.len() as f32;

            let score = avg / (1.0 + variance.sqrt());

            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }

    /// Write rows under the given header
    pub fn write(&self, headers: &[String], rows: &[Row]) -> Result<Vec<u8>> {
        let mut writer = WriterBuilder::new()
            .delimiter(self.output_delimiter)
            .from_writer(Vec::new());

        let write_err = |e: csv::Error| AppError::Internal(format!("Failed to write CSV: {}", e));

        writer.write_record(headers).map_err(write_err)?;
        for row in rows {
            let record: Vec<String> = headers
                .iter()
                .map(|header| row.get(header).map(|v| v.to_string()).unwrap_or_default())
                .collect();
            writer.write_record(&record).map_err(write_err)?;
        }

        writer
            .into_inner()
            .map_err(|e| AppError::Internal(format!("Failed to flush CSV: {}", e)))
    }
}

/// UTF-8 (BOM stripped) when valid, otherwise Windows-1252, which is what
/// spreadsheet programs usually export.
fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(content) => content.to_string(),
        Err(_) => {
            let (content, _, _) = WINDOWS_1252.decode(bytes);
            content.into_owned()
        }
    }
}
