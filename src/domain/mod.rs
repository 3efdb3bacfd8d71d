pub mod account;
pub mod error;
pub mod phone;
pub mod scrub_options;
pub mod stats;
pub mod store;
pub mod suppression;

// Decoded spreadsheet rows
pub mod sheet;
