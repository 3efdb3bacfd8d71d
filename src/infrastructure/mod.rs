pub mod bootstrap;
pub mod config;
pub mod db;
pub mod memory;
pub mod workbook;
