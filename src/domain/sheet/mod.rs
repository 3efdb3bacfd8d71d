// ============================================================
// SHEET DOMAIN LAYER
// ============================================================
// Tabular rows as decoded from an uploaded workbook
// No I/O, no async, no external dependencies

mod cell;
mod row;

pub use cell::CellValue;
pub use row::{Field, Row, Sheet};
